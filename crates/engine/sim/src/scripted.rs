//! Scripted engine for tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use swarmctl_engine_api::{
    AnnounceOptions, Engine, EngineConnection, EngineError, LifecycleEvent, NodeId, PeerAddr,
    QueryKind, QueryResult, Topic,
};
use tokio::sync::mpsc;

use crate::topic_hash;

/// Counts of calls that crossed the engine boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub announces: usize,
    pub unannounces: usize,
    pub lookups: usize,
    pub lookup_cancels: usize,
    pub queries: usize,
    pub pings: usize,
    pub destroys: usize,
}

struct Inner {
    events_rx: Option<mpsc::UnboundedReceiver<LifecycleEvent>>,
    connections_rx: Option<mpsc::UnboundedReceiver<EngineConnection>>,
    calls: CallCounts,
    announced: Vec<(Topic, AnnounceOptions)>,
    unannounced: Vec<Topic>,
    query_results: Vec<QueryResult>,
    ping_nodes: Vec<PeerAddr>,
}

/// An engine that emits exactly the events it is scripted with and records
/// every call made against it.
///
/// By default `destroy` emits the terminal closure event, which is what a
/// well-behaved provider does; tests exercising a hanging engine script the
/// sequence themselves and disable that.
pub struct ScriptedEngine {
    events_tx: mpsc::UnboundedSender<LifecycleEvent>,
    connections_tx: mpsc::UnboundedSender<EngineConnection>,
    inner: Mutex<Inner>,
    close_on_destroy: bool,
    holepunchable: bool,
    remote_address: Option<PeerAddr>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (connections_tx, connections_rx) = mpsc::unbounded_channel();
        Self {
            events_tx,
            connections_tx,
            inner: Mutex::new(Inner {
                events_rx: Some(events_rx),
                connections_rx: Some(connections_rx),
                calls: CallCounts::default(),
                announced: Vec::new(),
                unannounced: Vec::new(),
                query_results: Vec::new(),
                ping_nodes: Vec::new(),
            }),
            close_on_destroy: true,
            holepunchable: true,
            remote_address: None,
        }
    }

    /// Pre-load an event sequence.
    pub fn with_script(events: impl IntoIterator<Item = LifecycleEvent>) -> Self {
        let engine = Self::new();
        for event in events {
            engine.emit(event);
        }
        engine
    }

    /// Do not emit the closure event on destroy (simulates a hanging
    /// engine, or a test that scripts closure itself).
    pub fn without_close_on_destroy(mut self) -> Self {
        self.close_on_destroy = false;
        self
    }

    /// Report a non-holepunchable network.
    pub fn not_holepunchable(mut self) -> Self {
        self.holepunchable = false;
        self
    }

    /// Address the engine reports as seen from the network.
    pub fn with_remote_address(mut self, address: PeerAddr) -> Self {
        self.remote_address = Some(address);
        self
    }

    /// Results the next `query` stream will yield.
    pub fn with_query_results(self, results: Vec<QueryResult>) -> Self {
        self.inner.lock().query_results = results;
        self
    }

    /// Nodes `ping` will report.
    pub fn with_ping_nodes(self, nodes: Vec<PeerAddr>) -> Self {
        self.inner.lock().ping_nodes = nodes;
        self
    }

    /// Emit one lifecycle event, in order with everything emitted before.
    pub fn emit(&self, event: LifecycleEvent) {
        let _ = self.events_tx.send(event);
    }

    /// Hand a connection to the swarm connection stream.
    pub fn push_connection(&self, conn: EngineConnection) {
        let _ = self.connections_tx.send(conn);
    }

    pub fn calls(&self) -> CallCounts {
        self.inner.lock().calls.clone()
    }

    /// Topics unannounced so far, in call order.
    pub fn unannounced(&self) -> Vec<Topic> {
        self.inner.lock().unannounced.clone()
    }

    /// Announces issued so far, in call order.
    pub fn announced(&self) -> Vec<(Topic, AnnounceOptions)> {
        self.inner.lock().announced.clone()
    }
}

impl Default for ScriptedEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Engine for ScriptedEngine {
    fn subscribe(&self) -> mpsc::UnboundedReceiver<LifecycleEvent> {
        self.inner
            .lock()
            .events_rx
            .take()
            .unwrap_or_else(|| mpsc::unbounded_channel().1)
    }

    async fn announce(&self, topic: Topic, opts: AnnounceOptions) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        inner.calls.announces += 1;
        inner.announced.push((topic, opts));
        Ok(())
    }

    async fn unannounce(&self, topic: Topic) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        inner.calls.unannounces += 1;
        inner.unannounced.push(topic);
        Ok(())
    }

    async fn lookup(&self, _topic: Topic) -> Result<(), EngineError> {
        self.inner.lock().calls.lookups += 1;
        Ok(())
    }

    async fn cancel_lookup(&self, _topic: Topic) -> Result<(), EngineError> {
        self.inner.lock().calls.lookup_cancels += 1;
        Ok(())
    }

    async fn query(
        &self,
        _kind: QueryKind,
        _key: NodeId,
    ) -> Result<mpsc::UnboundedReceiver<QueryResult>, EngineError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock();
        inner.calls.queries += 1;
        for result in inner.query_results.drain(..) {
            let _ = tx.send(result);
        }
        // tx drops here; the stream ends after the scripted results.
        Ok(rx)
    }

    async fn ping(&self) -> Result<Vec<PeerAddr>, EngineError> {
        let mut inner = self.inner.lock();
        inner.calls.pings += 1;
        Ok(inner.ping_nodes.clone())
    }

    fn connections(&self) -> mpsc::UnboundedReceiver<EngineConnection> {
        self.inner
            .lock()
            .connections_rx
            .take()
            .unwrap_or_else(|| mpsc::unbounded_channel().1)
    }

    async fn destroy(&self) -> Result<(), EngineError> {
        self.inner.lock().calls.destroys += 1;
        if self.close_on_destroy {
            self.emit(LifecycleEvent::EngineClosed);
        }
        Ok(())
    }

    fn holepunchable(&self) -> bool {
        self.holepunchable
    }

    fn remote_address(&self) -> Option<PeerAddr> {
        self.remote_address.clone()
    }

    fn hash(&self, data: &[u8]) -> Topic {
        topic_hash(data)
    }
}
