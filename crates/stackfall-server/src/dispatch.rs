//! Turns client messages and gravity ticks into session mutations and the
//! events they produce.

use tracing::{debug, error, info, warn};

use stackfall_core::protocol::{ClientMessage, ServerMessage};
use stackfall_core::{Intent, LockOutcome, SessionId};

use crate::error::DispatchError;
use crate::state::AppState;

/// Events produced by one dispatched message.
#[derive(Debug, Default)]
pub struct Dispatched {
    /// Messages for the originating connection.
    pub replies: Vec<ServerMessage>,
    /// Some session cleared rows; everyone gets a fresh leaderboard.
    pub leaderboard_changed: bool,
    /// The session ended and has been removed from the registry.
    pub ended: bool,
}

impl Dispatched {
    fn reply(msg: ServerMessage) -> Self {
        Self {
            replies: vec![msg],
            ..Self::default()
        }
    }
}

/// Decode a text frame.
pub fn parse_message(text: &str) -> Result<ClientMessage, DispatchError> {
    serde_json::from_str(text).map_err(|e| DispatchError::MalformedPayload(e.to_string()))
}

/// Map a piece-control message to an intent. `None` for messages that are
/// not intents.
pub fn intent_for(msg: &ClientMessage) -> Result<Option<Intent>, DispatchError> {
    let intent = match msg {
        ClientMessage::MovePiece { direction: -1 } => Intent::MoveLeft,
        ClientMessage::MovePiece { direction: 1 } => Intent::MoveRight,
        ClientMessage::MovePiece { direction } => {
            return Err(DispatchError::MalformedPayload(format!(
                "direction must be -1 or 1, got {}",
                direction
            )));
        }
        ClientMessage::RotatePiece => Intent::Rotate,
        ClientMessage::DropPiece => Intent::SoftDrop,
        ClientMessage::DropToBottom => Intent::HardDrop,
        ClientMessage::SavePiece => Intent::SaveOrSwap,
        _ => return Ok(None),
    };
    Ok(Some(intent))
}

/// Dispatch a single client message for session `id`.
pub fn handle_message(
    state: &AppState,
    id: SessionId,
    msg: ClientMessage,
) -> Result<Dispatched, DispatchError> {
    if let Some(intent) = intent_for(&msg)? {
        return apply_intent(state, id, intent);
    }

    match msg {
        ClientMessage::Ping => Ok(Dispatched::reply(ServerMessage::Pong)),

        ClientMessage::RequestInitialState => {
            let entry = state
                .registry
                .get(id)
                .ok_or(DispatchError::UnknownSession(id))?;
            Ok(Dispatched::reply(ServerMessage::GameState(
                entry.player.snapshot(),
            )))
        }

        ClientMessage::UpdatePiece {
            current_piece,
            saved_piece,
        } => {
            let mut entry = state
                .registry
                .get_mut(id)
                .ok_or(DispatchError::UnknownSession(id))?;
            if !state.config.trust_client_reports {
                warn!("Session {} sent a piece overwrite; ignored", id);
                return Err(DispatchError::Rejected(
                    "piece updates are not accepted, use SavePiece",
                ));
            }
            let field = &entry.player.playfield;
            let (width, height) = (field.width(), field.height());
            let well_formed = std::iter::once(&current_piece)
                .chain(saved_piece.as_ref())
                .all(|p| p.is_well_formed(width, height));
            if !well_formed {
                return Err(DispatchError::MalformedPayload(
                    "piece matrix or origin out of range".into(),
                ));
            }
            entry.player.overwrite_pieces(current_piece, saved_piece);
            Ok(Dispatched::reply(ServerMessage::GameState(
                entry.player.snapshot(),
            )))
        }

        ClientMessage::UpdateScore { score } => {
            let mut entry = state
                .registry
                .get_mut(id)
                .ok_or(DispatchError::UnknownSession(id))?;
            if state.config.trust_client_reports {
                entry.player.overwrite_score(score);
            } else {
                debug!(
                    "Session {} reported score {} (server has {})",
                    id, score, entry.player.score
                );
                entry.reported_score = Some(score);
            }
            Ok(Dispatched::default())
        }

        // Intents were handled above.
        _ => Ok(Dispatched::default()),
    }
}

/// One gravity tick for session `id`.
pub fn handle_gravity(state: &AppState, id: SessionId) -> Result<Dispatched, DispatchError> {
    apply_intent(state, id, Intent::SoftDrop)
}

fn apply_intent(
    state: &AppState,
    id: SessionId,
    intent: Intent,
) -> Result<Dispatched, DispatchError> {
    // The entry guard must be released before the session can be removed.
    let result = {
        let mut entry = state
            .registry
            .get_mut(id)
            .ok_or(DispatchError::UnknownSession(id))?;
        let score = entry.player.score;
        let result = entry.player.apply_intent(intent);
        result.map_err(|source| (score, source))
    };

    let applied = match result {
        Ok(applied) => applied,
        Err((score, source)) => {
            state.registry.remove(id);
            error!("Session {} violated a playfield invariant: {}", id, source);
            return Err(DispatchError::Invariant { id, score, source });
        }
    };

    match applied.outcome {
        LockOutcome::GameOver => {
            let score = applied.snapshot.score;
            let reported = state.registry.remove(id).and_then(|e| e.reported_score);
            info!(
                "Session {} game over with score {} (client reported {:?})",
                id, score, reported
            );
            Ok(Dispatched {
                replies: vec![ServerMessage::GameOver { score }],
                leaderboard_changed: false,
                ended: true,
            })
        }
        LockOutcome::LockedWithClear(_) => {
            debug!(
                "Session {} cleared {} rows, score {}",
                id,
                applied.outcome.cleared_rows(),
                applied.snapshot.score
            );
            Ok(Dispatched {
                replies: vec![ServerMessage::GameState(applied.snapshot)],
                leaderboard_changed: true,
                ended: false,
            })
        }
        LockOutcome::Advanced | LockOutcome::Locked => Ok(Dispatched::reply(
            ServerMessage::GameState(applied.snapshot),
        )),
    }
}

/// Send the current top-N to every connected session.
pub fn broadcast_leaderboard(state: &AppState) {
    let entries = crate::leaderboard::top_n(&state.registry, state.config.leaderboard_depth);
    let reached = state
        .registry
        .broadcast(&ServerMessage::Leaderboard { entries });
    debug!("Leaderboard sent to {} sessions", reached);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use stackfall_core::{Cell, GRID_WIDTH, Piece, PlayerState, ShapeKind};

    fn app(trust: bool) -> AppState {
        AppState::new(ServerConfig {
            trust_client_reports: trust,
            ..ServerConfig::default()
        })
    }

    fn join_with_i(state: &AppState, id: SessionId) {
        let mut player = PlayerState::with_seed(id, 11);
        player.current = Piece::from_kind(ShapeKind::I, GRID_WIDTH);
        state.registry.put(player, None);
    }

    fn current_x(state: &AppState, id: SessionId) -> i32 {
        state.registry.get(id).unwrap().player.current.x
    }

    #[test]
    fn move_left_until_wall() {
        let state = app(false);
        join_with_i(&state, 1);
        assert_eq!(current_x(&state, 1), 3);

        for _ in 0..3 {
            let out = handle_message(&state, 1, ClientMessage::MovePiece { direction: -1 }).unwrap();
            assert!(matches!(out.replies[0], ServerMessage::GameState(_)));
        }
        assert_eq!(current_x(&state, 1), 0);

        let out = handle_message(&state, 1, ClientMessage::MovePiece { direction: -1 }).unwrap();
        match &out.replies[0] {
            ServerMessage::GameState(snap) => assert_eq!(snap.current_piece.x, 0),
            other => panic!("expected GameState, got {:?}", other),
        }
    }

    #[test]
    fn bad_direction_is_malformed_and_changes_nothing() {
        let state = app(false);
        join_with_i(&state, 1);
        let err = handle_message(&state, 1, ClientMessage::MovePiece { direction: 3 }).unwrap_err();
        assert!(matches!(err, DispatchError::MalformedPayload(_)));
        assert_eq!(current_x(&state, 1), 3);

        assert!(matches!(
            parse_message(r#"{"type":"MovePiece","direction":"x"}"#),
            Err(DispatchError::MalformedPayload(_))
        ));
    }

    #[test]
    fn unknown_session_is_reported() {
        let state = app(false);
        let err = handle_message(&state, 42, ClientMessage::RotatePiece).unwrap_err();
        assert!(matches!(err, DispatchError::UnknownSession(42)));
        assert!(handle_gravity(&state, 42).is_err());
    }

    #[test]
    fn line_clear_requests_leaderboard() {
        let state = app(false);
        join_with_i(&state, 1);
        {
            let mut entry = state.registry.get_mut(1).unwrap();
            for col in 0..GRID_WIDTH as i32 {
                if !(3..7).contains(&col) {
                    entry.player.playfield.set(col, 19, Cell::Filled(1));
                }
            }
        }

        let out = handle_message(&state, 1, ClientMessage::DropToBottom).unwrap();
        assert!(out.leaderboard_changed);
        assert!(!out.ended);
        assert_eq!(state.registry.get(1).unwrap().player.score, 100);
    }

    #[test]
    fn game_over_removes_session() {
        let state = app(false);
        join_with_i(&state, 1);
        {
            let mut entry = state.registry.get_mut(1).unwrap();
            for col in 1..GRID_WIDTH as i32 {
                entry.player.playfield.set(col, 0, Cell::Filled(1));
                entry.player.playfield.set(col, 1, Cell::Filled(1));
            }
            entry.player.current = Piece::from_kind(ShapeKind::I, GRID_WIDTH).rotated();
            entry.player.current.x = 0;
            entry.player.current.y = 4;
        }

        let out = handle_message(&state, 1, ClientMessage::DropToBottom).unwrap();
        assert!(out.ended);
        assert!(matches!(out.replies[0], ServerMessage::GameOver { score: 0 }));
        assert!(!state.registry.contains(1));

        // Later intents for the removed session are ignored.
        assert!(matches!(
            handle_message(&state, 1, ClientMessage::DropPiece),
            Err(DispatchError::UnknownSession(1))
        ));
    }

    #[test]
    fn invariant_violation_removes_session() {
        let state = app(true);
        join_with_i(&state, 1);
        let mut above = Piece::from_kind(ShapeKind::O, GRID_WIDTH);
        above.y = -1;
        handle_message(
            &state,
            1,
            ClientMessage::UpdatePiece {
                current_piece: above,
                saved_piece: None,
            },
        )
        .unwrap();
        state.registry.get_mut(1).unwrap().player.playfield.set(4, 1, Cell::Filled(1));

        let err = handle_gravity(&state, 1).unwrap_err();
        assert!(matches!(err, DispatchError::Invariant { id: 1, .. }));
        assert!(!state.registry.contains(1));
    }

    #[test]
    fn untrusted_reports_do_not_overwrite() {
        let state = app(false);
        join_with_i(&state, 1);

        handle_message(&state, 1, ClientMessage::UpdateScore { score: 5000 }).unwrap();
        let entry = state.registry.get(1).unwrap();
        assert_eq!(entry.player.score, 0);
        assert_eq!(entry.reported_score, Some(5000));
        drop(entry);

        let o = Piece::from_kind(ShapeKind::O, GRID_WIDTH);
        let err = handle_message(
            &state,
            1,
            ClientMessage::UpdatePiece {
                current_piece: o,
                saved_piece: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, DispatchError::Rejected(_)));
        assert_eq!(state.registry.get(1).unwrap().player.current.kind, ShapeKind::I);
    }

    #[test]
    fn trusted_piece_update_out_of_range_is_malformed() {
        let state = app(true);
        join_with_i(&state, 1);
        let mut far = Piece::from_kind(ShapeKind::O, GRID_WIDTH);
        far.x = i32::MAX;
        let err = handle_message(
            &state,
            1,
            ClientMessage::UpdatePiece {
                current_piece: far,
                saved_piece: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, DispatchError::MalformedPayload(_)));

        let mut huge = Piece::from_kind(ShapeKind::O, GRID_WIDTH);
        huge.shape = vec![vec![1; 6]; 6];
        let err = handle_message(
            &state,
            1,
            ClientMessage::UpdatePiece {
                current_piece: Piece::from_kind(ShapeKind::O, GRID_WIDTH),
                saved_piece: Some(huge),
            },
        )
        .unwrap_err();
        assert!(matches!(err, DispatchError::MalformedPayload(_)));

        // Session untouched and still playable.
        assert_eq!(current_x(&state, 1), 3);
        handle_message(&state, 1, ClientMessage::MovePiece { direction: 1 }).unwrap();
        assert_eq!(current_x(&state, 1), 4);
    }

    #[test]
    fn trusted_reports_overwrite() {
        let state = app(true);
        join_with_i(&state, 1);
        handle_message(&state, 1, ClientMessage::UpdateScore { score: 300 }).unwrap();
        assert_eq!(state.registry.get(1).unwrap().player.score, 300);
    }

    #[test]
    fn save_piece_holds_current() {
        let state = app(false);
        join_with_i(&state, 1);
        let out = handle_message(&state, 1, ClientMessage::SavePiece).unwrap();
        match &out.replies[0] {
            ServerMessage::GameState(snap) => {
                assert_eq!(snap.saved_piece.as_ref().map(|p| p.kind), Some(ShapeKind::I));
            }
            other => panic!("expected GameState, got {:?}", other),
        }
    }

    #[test]
    fn leaderboard_broadcast_reaches_everyone() {
        let state = app(false);
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        state.registry.put(PlayerState::new(1), Some(tx));
        broadcast_leaderboard(&state);
        match rx.try_recv() {
            Ok(ServerMessage::Leaderboard { entries }) => assert_eq!(entries.len(), 1),
            other => panic!("expected Leaderboard, got {:?}", other),
        }
    }
}
