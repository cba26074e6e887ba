//! Engine construction and announce options.

use serde::{Deserialize, Serialize};

/// Options handed to an engine provider at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Start ephemeral and switch to persistent once the network looks
    /// stable and holepunchable. Disabling runs persistent from the start.
    pub adaptive: bool,
    /// Never host other peers' entries.
    pub ephemeral: bool,
    /// Bootstrap peers as `host:port` strings. Empty means the provider's
    /// default bootstrap set.
    pub bootstrap: Vec<String>,
    /// Local listen port. Engines do not require listening; 0 lets the
    /// provider pick.
    pub port: u16,
    /// Local listen address, only meaningful together with `port`.
    pub address: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            adaptive: true,
            ephemeral: true,
            bootstrap: Vec::new(),
            port: 0,
            address: "0.0.0.0".to_string(),
        }
    }
}

/// Options for announcing a topic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnounceOptions {
    /// Port advertised to remote peers. 0 means the engine's own port.
    pub port: u16,
    /// Port the service actually listens on locally, when it differs from
    /// the advertised one.
    pub local_port: u16,
}
