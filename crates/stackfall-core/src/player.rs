use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

use crate::engine::{self, LockOutcome};
use crate::error::EngineError;
use crate::piece::Piece;
use crate::playfield::Playfield;
use crate::protocol::GameSnapshot;

/// Server-assigned connection identity.
pub type SessionId = u64;

/// A discrete player action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    MoveLeft,
    MoveRight,
    Rotate,
    /// One gravity step. Also what the gravity timer issues.
    SoftDrop,
    HardDrop,
    SaveOrSwap,
}

/// Result of applying one intent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Applied {
    pub outcome: LockOutcome,
    pub snapshot: GameSnapshot,
}

/// One player's full game: playfield, falling piece, held piece and score.
///
/// Not `Clone`: the piece generator is not. Two sessions built with the same
/// seed draw the same pieces.
#[derive(Debug)]
pub struct PlayerState {
    pub id: SessionId,
    pub playfield: Playfield,
    pub current: Piece,
    pub held: Option<Piece>,
    pub score: u64,
    over: bool,
    rng: StdRng,
}

impl PlayerState {
    /// Fresh session on an empty standard playfield.
    pub fn new(id: SessionId) -> Self {
        let seed = rand::rng().random_range(0..u64::MAX);
        Self::with_seed(id, seed)
    }

    /// Fresh session whose piece sequence is fixed by `seed`.
    pub fn with_seed(id: SessionId, seed: u64) -> Self {
        let playfield = Playfield::default();
        let mut rng = StdRng::seed_from_u64(seed);
        let current = Piece::spawn_with(&mut rng, playfield.width());
        Self {
            id,
            playfield,
            current,
            held: None,
            score: 0,
            over: false,
            rng,
        }
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    pub(crate) fn mark_over(&mut self) {
        self.over = true;
    }

    pub(crate) fn next_piece(&mut self) -> Piece {
        Piece::spawn_with(&mut self.rng, self.playfield.width())
    }

    /// Apply one intent and return the resulting snapshot. A finished game
    /// ignores further intents.
    pub fn apply_intent(&mut self, intent: Intent) -> Result<Applied, EngineError> {
        if self.over {
            return Ok(self.applied(LockOutcome::GameOver));
        }

        let outcome = match intent {
            Intent::MoveLeft => {
                self.current = engine::try_move(&self.current, -1, 0, &self.playfield);
                LockOutcome::Advanced
            }
            Intent::MoveRight => {
                self.current = engine::try_move(&self.current, 1, 0, &self.playfield);
                LockOutcome::Advanced
            }
            Intent::Rotate => {
                self.current = engine::try_rotate(&self.current, &self.playfield);
                LockOutcome::Advanced
            }
            Intent::SoftDrop => engine::lock_and_advance(self)?,
            Intent::HardDrop => engine::drop_to_bottom(self)?,
            Intent::SaveOrSwap => {
                self.save_or_swap();
                LockOutcome::Advanced
            }
        };

        Ok(self.applied(outcome))
    }

    /// Hold the current piece, or exchange it with the held one. The piece
    /// coming in is not checked for collision.
    fn save_or_swap(&mut self) {
        let width = self.playfield.width();
        let incoming = match self.held.take() {
            Some(held) => held,
            None => self.next_piece(),
        };
        let mut outgoing = std::mem::replace(&mut self.current, incoming);
        outgoing.reset_origin(width);
        self.held = Some(outgoing);
    }

    /// Replace the falling and held pieces wholesale. Only for trusted
    /// client reports.
    pub fn overwrite_pieces(&mut self, current: Piece, held: Option<Piece>) {
        self.current = current;
        self.held = held;
    }

    /// Replace the score wholesale. Only for trusted client reports.
    pub fn overwrite_score(&mut self, score: u64) {
        self.score = score;
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            grid: self.playfield.to_wire(),
            current_piece: self.current.clone(),
            saved_piece: self.held.clone(),
            score: self.score,
        }
    }

    fn applied(&self, outcome: LockOutcome) -> Applied {
        Applied {
            outcome,
            snapshot: self.snapshot(),
        }
    }
}
