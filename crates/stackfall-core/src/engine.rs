//! Collision checks and the lock / line-clear / respawn transition.

use crate::error::EngineError;
use crate::piece::Piece;
use crate::player::PlayerState;
use crate::playfield::{Cell, Playfield};

/// Points awarded per row cleared in a single lock.
pub const SCORE_PER_LINE: u64 = 100;

/// What a gravity step or hard drop did to the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockOutcome {
    /// Nothing locked; the piece is still falling (or the intent was not a drop).
    Advanced,
    Locked,
    LockedWithClear(u32),
    GameOver,
}

impl LockOutcome {
    pub fn cleared_rows(&self) -> u32 {
        match self {
            LockOutcome::LockedWithClear(n) => *n,
            _ => 0,
        }
    }
}

/// True if any occupied cell is left of column 0, right of the last column,
/// below the last row, or on top of a filled cell. Cells above row 0 never
/// collide on their own.
pub fn collides(piece: &Piece, field: &Playfield) -> bool {
    let width = field.width() as i32;
    let height = field.height() as i32;
    piece.cells().any(|(col, row)| {
        col < 0
            || col >= width
            || row >= height
            || field.get(col, row).is_some_and(|c| !c.is_empty())
    })
}

/// The moved piece, or the original if the move would collide.
pub fn try_move(piece: &Piece, dx: i32, dy: i32, field: &Playfield) -> Piece {
    let candidate = piece.translated(dx, dy);
    if collides(&candidate, field) {
        piece.clone()
    } else {
        candidate
    }
}

/// The rotated piece, or the original if the rotation would collide.
/// No wall kicks are attempted.
pub fn try_rotate(piece: &Piece, field: &Playfield) -> Piece {
    let candidate = piece.rotated();
    if collides(&candidate, field) {
        piece.clone()
    } else {
        candidate
    }
}

/// One gravity step: move the current piece down a row, or lock it if it
/// has landed.
pub fn lock_and_advance(state: &mut PlayerState) -> Result<LockOutcome, EngineError> {
    let moved = try_move(&state.current, 0, 1, &state.playfield);
    if moved.y != state.current.y {
        state.current = moved;
        return Ok(LockOutcome::Advanced);
    }
    settle(state)
}

/// Drop the current piece to its lowest valid row and lock it.
///
/// Steps down from the current position while the next row is free, so a
/// piece that already overlaps lands exactly where gravity would put it.
pub fn drop_to_bottom(state: &mut PlayerState) -> Result<LockOutcome, EngineError> {
    let limit = state.playfield.height() as i32;
    let mut landed = state.current.clone();
    while landed.y < limit && !collides(&landed.translated(0, 1), &state.playfield) {
        landed.y += 1;
    }
    state.current = landed;
    settle(state)
}

/// Lock, clear, respawn, then either declare game over or score the clear.
fn settle(state: &mut PlayerState) -> Result<LockOutcome, EngineError> {
    lock_piece(&state.current, &mut state.playfield)?;
    let cleared = state.playfield.clear_full_rows();

    state.current = state.next_piece();
    if collides(&state.current, &state.playfield) {
        state.mark_over();
        return Ok(LockOutcome::GameOver);
    }

    if cleared > 0 {
        state.score += cleared as u64 * SCORE_PER_LINE;
        return Ok(LockOutcome::LockedWithClear(cleared));
    }
    Ok(LockOutcome::Locked)
}

/// Write the piece into the playfield. Every target is checked before any
/// write, so a failed lock leaves the playfield untouched.
fn lock_piece(piece: &Piece, field: &mut Playfield) -> Result<(), EngineError> {
    if let Some((col, row)) = piece.cells().find(|&(col, row)| field.get(col, row).is_none()) {
        return Err(EngineError::CellOutOfBounds { col, row });
    }
    for (col, row) in piece.cells() {
        field.set(col, row, Cell::Filled(piece.color));
    }
    Ok(())
}
