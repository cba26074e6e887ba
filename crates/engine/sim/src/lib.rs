//! In-process engines.
//!
//! [`SimEngine`] is the stand-in provider wired into the binary so the
//! agents run end-to-end without an external network: it confirms every
//! request immediately and emits a plausible startup sequence. It is the
//! integration seam for a real engine provider, not a peer-to-peer
//! implementation.
//!
//! [`ScriptedEngine`] replays a caller-supplied event sequence and records
//! every call crossing the engine boundary, for tests that assert on
//! ordering, shutdown sequencing, and call counts.

mod scripted;
mod sim;

pub use scripted::{CallCounts, ScriptedEngine};
pub use sim::SimEngine;

use sha2::{Digest, Sha256};
use swarmctl_engine_api::Topic;

/// The engine-supplied topic hash both in-process engines use.
pub(crate) fn topic_hash(data: &[u8]) -> Topic {
    let digest = Sha256::digest(data);
    Topic::from_slice(&digest)
}
