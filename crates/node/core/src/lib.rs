//! Agent core for the swarmctl command-line agents.
//!
//! The agents front an external peer-to-peer engine. This crate holds the
//! orchestration layer they share:
//!
//! - [`identity`] - resolve and persist the 32-byte node identity
//! - [`render`] - text/JSON rendering of the engine's lifecycle events
//! - [`session`] - tracking and teardown of announce/lookup sessions
//! - [`lifecycle`] - the controller binding engine, renderer and sessions
//! - [`shutdown`] - exit state, shutdown phases, termination signals
//! - [`relay`] - stdio bridging for swarm connections
//! - [`args`] - shared clap argument groups

pub mod args;
pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod logging;
pub mod relay;
pub mod render;
pub mod session;
pub mod shutdown;

pub use error::AgentError;
pub use identity::{NodeIdentity, Provenance};
pub use lifecycle::Agent;
pub use render::{EventRenderer, OutputMode, StartupSummary};
pub use session::{SessionId, SessionKind, SessionTracker};
pub use shutdown::{termination_signals, ExitState, Phase};

/// Crate version reported in the startup summary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
