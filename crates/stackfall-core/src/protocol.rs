use serde::{Deserialize, Serialize};

use crate::piece::Piece;
use crate::player::SessionId;

/// Full view of one player's game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Row-major, top row first. `None` is an empty cell.
    pub grid: Vec<Vec<Option<u32>>>,
    pub current_piece: Piece,
    pub saved_piece: Option<Piece>,
    pub score: u64,
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    RequestInitialState,
    MovePiece {
        direction: i32,
    },
    RotatePiece,
    DropPiece,
    DropToBottom,
    /// Hold the current piece, or swap it with the held one.
    SavePiece,
    /// Client-side piece overwrite. Only honored when the server trusts
    /// client reports.
    UpdatePiece {
        current_piece: Piece,
        saved_piece: Option<Piece>,
    },
    UpdateScore {
        score: u64,
    },
    Ping,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    Welcome {
        session_id: SessionId,
    },
    GameState(GameSnapshot),
    GameOver {
        score: u64,
    },
    Leaderboard {
        entries: Vec<LeaderboardEntry>,
    },
    Error {
        message: String,
    },
    Pong,
}

/// Leaderboard entry, broadcast over the socket and returned by REST API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub session_id: SessionId,
    pub score: u64,
}
