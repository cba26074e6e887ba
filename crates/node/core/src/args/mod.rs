//! Reusable CLI argument groups, flattened into the per-mode commands.

mod identity;
mod network;
mod output;

pub use identity::IdentityArgs;
pub use network::NetworkArgs;
pub use output::OutputArgs;

use swarmctl_engine_api::{Engine, Topic};

use crate::error::AgentError;

/// Resolve a topic key argument: hex-decode it, or hash the raw bytes
/// through the engine when auto-hashing was requested.
pub fn resolve_topic(raw: &str, auto_hash: bool, engine: &dyn Engine) -> Result<Topic, AgentError> {
    if auto_hash {
        return Ok(engine.hash(raw.as_bytes()));
    }
    let bytes =
        hex::decode(raw.trim()).map_err(|e| AgentError::InvalidTopic(format!("not hex: {e}")))?;
    if bytes.len() != 32 {
        return Err(AgentError::InvalidTopic(format!(
            "expected 32 bytes, got {}",
            bytes.len()
        )));
    }
    Ok(Topic::from_slice(&bytes))
}
