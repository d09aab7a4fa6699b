use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A lock tried to write outside the grid. The collision check upstream
    /// should have made this impossible.
    #[error("lock target ({col}, {row}) is outside the playfield")]
    CellOutOfBounds { col: i32, row: i32 },
}
