pub mod engine;
pub mod error;
pub mod piece;
pub mod player;
pub mod playfield;
pub mod protocol;
pub mod shape;

pub use engine::{LockOutcome, SCORE_PER_LINE};
pub use error::EngineError;
pub use piece::Piece;
pub use player::{Applied, Intent, PlayerState, SessionId};
pub use playfield::{Cell, GRID_HEIGHT, GRID_WIDTH, Playfield};
pub use protocol::{ClientMessage, GameSnapshot, LeaderboardEntry, ServerMessage};
pub use shape::{ShapeDefinition, ShapeKind};
