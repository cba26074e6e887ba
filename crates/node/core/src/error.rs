//! Startup errors.
//!
//! Everything here is fatal before an engine exists: it is reported directly
//! to stderr and the process exits 1 without constructing an engine. Once an
//! engine is running, failures surface as lifecycle events instead.

use std::path::PathBuf;

use swarmctl_engine_api::EngineError;

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// Malformed explicit identity (wrong length or not hex).
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    /// The identity cache could not be read or written. Without a stable
    /// identity the agent cannot start.
    #[error("cannot persist identity at {path}: {source}")]
    IdentityPersistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed topic key on the command line.
    #[error("invalid topic key: {0}")]
    InvalidTopic(String),

    /// Malformed listen address/port combination.
    #[error("invalid listen options: {0}")]
    InvalidListenOptions(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}
