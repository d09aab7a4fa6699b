use thiserror::Error;

use stackfall_core::{EngineError, SessionId};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no session {0}")]
    UnknownSession(SessionId),

    #[error("invalid message: {0}")]
    MalformedPayload(String),

    #[error("{0}")]
    Rejected(&'static str),

    /// The session hit an engine invariant and has been removed.
    #[error("session {id} removed: {source}")]
    Invariant {
        id: SessionId,
        score: u64,
        #[source]
        source: EngineError,
    },
}
