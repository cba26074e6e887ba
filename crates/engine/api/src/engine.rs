//! The engine capability trait.

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;

use crate::{AnnounceOptions, EngineError, LifecycleEvent, NodeId, PeerAddr, Topic};

/// Kinds of DHT queries an agent can issue directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Walk the routing table towards a key (`_find_node`).
    FindNode,
}

/// One result from a long-lived query stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    /// Identity of the responding node, when it disclosed one.
    pub node_id: Option<NodeId>,
    pub node: PeerAddr,
}

/// Byte stream of one accepted swarm connection, plus the metadata the
/// engine reported alongside it.
pub struct EngineConnection {
    pub id: u64,
    pub initiator: bool,
    pub stream: Box<dyn DuplexStream>,
}

impl std::fmt::Debug for EngineConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConnection")
            .field("id", &self.id)
            .field("initiator", &self.initiator)
            .finish_non_exhaustive()
    }
}

/// Blanket alias for the stream type engines hand out.
pub trait DuplexStream: AsyncRead + AsyncWrite + Send + Unpin {}
impl<T: AsyncRead + AsyncWrite + Send + Unpin> DuplexStream for T {}

/// The external peer-to-peer engine.
///
/// One instance is constructed per agent run with a resolved identity and
/// [`crate::EngineOptions`]. All methods take `&self`; providers are expected
/// to use interior mutability, and the agents share the handle as
/// `Arc<dyn Engine>`.
///
/// Lifecycle contract:
///
/// - [`Engine::subscribe`] yields the single ordered event stream. It is
///   taken once, before any operation is issued.
/// - [`Engine::destroy`] only *requests* teardown; closure is confirmed by
///   the terminal [`LifecycleEvent::EngineClosed`] on the event stream.
/// - [`Engine::unannounce`] resolves only once the removal has been
///   confirmed network-side, so callers can sequence process exit after it.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Take the lifecycle event stream. Yields `None` after the channel
    /// closes; a well-behaved provider emits `EngineClosed` first.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<LifecycleEvent>;

    /// Begin advertising `topic`. Returns once the request is issued; the
    /// advertisement itself may still be in flight.
    async fn announce(&self, topic: Topic, opts: AnnounceOptions) -> Result<(), EngineError>;

    /// Withdraw an advertisement and wait for the engine's confirmation.
    async fn unannounce(&self, topic: Topic) -> Result<(), EngineError>;

    /// Begin resolving peers for `topic`. Resolved peers surface as
    /// [`LifecycleEvent::PeerObserved`] events, not as return values.
    async fn lookup(&self, topic: Topic) -> Result<(), EngineError>;

    /// Stop delivering peer events for a previous `lookup`.
    async fn cancel_lookup(&self, topic: Topic) -> Result<(), EngineError>;

    /// Issue a direct query; results arrive on the returned stream, which
    /// ends when the query completes.
    async fn query(
        &self,
        kind: QueryKind,
        key: NodeId,
    ) -> Result<mpsc::UnboundedReceiver<QueryResult>, EngineError>;

    /// Ping the bootstrap contacts; returns the responders.
    async fn ping(&self) -> Result<Vec<PeerAddr>, EngineError>;

    /// Take the stream of accepted swarm connections. Taken once.
    fn connections(&self) -> mpsc::UnboundedReceiver<EngineConnection>;

    /// Request engine teardown. Idempotent at the provider's discretion;
    /// the caller guards against double requests anyway.
    async fn destroy(&self) -> Result<(), EngineError>;

    /// Whether the network currently looks holepunchable.
    fn holepunchable(&self) -> bool;

    /// Our address as seen from the network, when known.
    fn remote_address(&self) -> Option<PeerAddr>;

    /// Engine-supplied topic hash for arbitrary key material.
    fn hash(&self, data: &[u8]) -> Topic;
}
