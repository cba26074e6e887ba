use crate::Topic;

/// Failures crossing the engine boundary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine is shutting down")]
    ShuttingDown,
    #[error("topic {0} is not announced")]
    NotAnnounced(Topic),
    #[error("engine rejected request: {0}")]
    Rejected(String),
    #[error("engine transport error: {0}")]
    Transport(String),
}
