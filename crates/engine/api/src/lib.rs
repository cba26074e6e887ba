//! Capability boundary for the external peer-to-peer engine.
//!
//! The engine (DHT routing, peer discovery, hole punching, swarm
//! connections, tunnelling) is supplied by an external provider. This crate
//! defines the seam the agents program against:
//!
//! - [`Engine`] - the capability trait
//! - [`LifecycleEvent`] - the single ordered event stream an engine emits
//! - [`EngineOptions`] / [`AnnounceOptions`] - construction and announce knobs
//! - [`EngineError`] - failures crossing the boundary

mod engine;
mod error;
mod event;
mod options;

pub use engine::{Engine, EngineConnection, QueryKind, QueryResult};
pub use error::EngineError;
pub use event::{LifecycleEvent, ObservationKind, PeerAddr, SocketFamily};
pub use options::{AnnounceOptions, EngineOptions};

/// Fixed-length key peers rendezvous on.
pub type Topic = alloy_primitives::B256;

/// Fixed-length key naming a node to the engine.
pub type NodeId = alloy_primitives::B256;
