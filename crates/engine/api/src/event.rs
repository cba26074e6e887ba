//! Lifecycle events emitted by an engine.

use serde::{Deserialize, Serialize};

use crate::Topic;

/// Address family of the engine's listening socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SocketFamily {
    V4,
    V6,
}

impl std::fmt::Display for SocketFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::V4 => f.write_str("IPv4"),
            Self::V6 => f.write_str("IPv6"),
        }
    }
}

/// A remote peer address as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerAddr {
    pub host: String,
    pub port: u16,
}

impl std::fmt::Display for PeerAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// What kind of topic activity a peer was observed doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObservationKind {
    Announce,
    Unannounce,
    Lookup,
}

impl std::fmt::Display for ObservationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Announce => f.write_str("announce"),
            Self::Unannounce => f.write_str("unannounce"),
            Self::Lookup => f.write_str("lookup"),
        }
    }
}

/// Something the engine observed, delivered in emission order.
///
/// The stream ends with [`LifecycleEvent::EngineClosed`]; an engine emits it
/// exactly once, after a destroy request has fully taken effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The engine bound a local socket.
    Listening {
        address: String,
        port: u16,
        family: SocketFamily,
    },
    /// The routing table is populated; the node is fully joined.
    Bootstrapped,
    /// The engine switched from ephemeral to persistent operation.
    NetworkPersistent,
    /// A recoverable condition. Never affects the exit code.
    Warning { message: String },
    /// An unrecoverable engine failure. The agent shuts down with exit code 1.
    FatalError { message: String },
    /// A remote peer announced, unannounced, or looked up a topic.
    PeerObserved {
        kind: ObservationKind,
        topic: Topic,
        peer: PeerAddr,
    },
    /// A swarm connection was established.
    ConnectionOpened { id: u64, initiator: bool },
    /// A swarm connection ended.
    ConnectionClosed { id: u64, error: Option<String> },
    /// Terminal event: the engine has released all resources.
    EngineClosed,
}

impl LifecycleEvent {
    /// Variant tag as used in structured output records.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Listening { .. } => "listening",
            Self::Bootstrapped => "bootstrapped",
            Self::NetworkPersistent => "persistent",
            Self::Warning { .. } => "warning",
            Self::FatalError { .. } => "error",
            Self::PeerObserved { .. } => "peer",
            Self::ConnectionOpened { .. } => "connection-open",
            Self::ConnectionClosed { .. } => "connection-close",
            Self::EngineClosed => "closed",
        }
    }

    /// Whether this event may be dropped by a verbosity filter.
    ///
    /// Fatal errors and engine closure are load-bearing for the shutdown
    /// sequence and must always reach the renderer.
    pub fn is_verbose_only(&self) -> bool {
        matches!(
            self,
            Self::PeerObserved { .. }
                | Self::ConnectionOpened { .. }
                | Self::ConnectionClosed { .. }
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::EngineClosed)
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::FatalError { .. })
    }

    /// Warning{message} for an announce or lookup that failed to establish.
    pub fn session_warning(kind: &str, topic: &Topic, err: impl std::fmt::Display) -> Self {
        Self::Warning {
            message: format!("{kind} {} failed: {err}", hex::encode(topic)),
        }
    }
}
