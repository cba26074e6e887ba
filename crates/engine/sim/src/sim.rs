//! The stand-in engine provider.

use async_trait::async_trait;
use parking_lot::Mutex;
use swarmctl_engine_api::{
    AnnounceOptions, Engine, EngineConnection, EngineError, EngineOptions, LifecycleEvent, NodeId,
    PeerAddr, QueryKind, QueryResult, SocketFamily, Topic,
};
use tokio::sync::mpsc;
use tracing::debug;

use crate::topic_hash;

struct Inner {
    events_rx: Option<mpsc::UnboundedReceiver<LifecycleEvent>>,
    connections_rx: Option<mpsc::UnboundedReceiver<EngineConnection>>,
    announced: Vec<Topic>,
    destroyed: bool,
}

/// Loopback engine: binds nothing, talks to nobody, confirms everything.
///
/// Stands in for an external engine provider at the integration seam so the
/// agents can be exercised end-to-end. The startup sequence (listening,
/// bootstrapped, persistent when not adaptive) mirrors what a real provider
/// emits.
pub struct SimEngine {
    events_tx: mpsc::UnboundedSender<LifecycleEvent>,
    inner: Mutex<Inner>,
    options: EngineOptions,
}

impl SimEngine {
    /// Construct the engine for `identity`, emitting the startup sequence.
    pub fn create(identity: NodeId, options: EngineOptions) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (_, connections_rx) = mpsc::unbounded_channel();
        debug!(id = %identity, "sim engine created");

        let engine = Self {
            events_tx,
            inner: Mutex::new(Inner {
                events_rx: Some(events_rx),
                connections_rx: Some(connections_rx),
                announced: Vec::new(),
                destroyed: false,
            }),
            options,
        };
        engine.emit(LifecycleEvent::Listening {
            address: engine.options.address.clone(),
            port: engine.options.port,
            family: SocketFamily::V4,
        });
        engine.emit(LifecycleEvent::Bootstrapped);
        if !engine.options.adaptive {
            engine.emit(LifecycleEvent::NetworkPersistent);
        }
        engine
    }

    fn emit(&self, event: LifecycleEvent) {
        let _ = self.events_tx.send(event);
    }

    fn guard(&self) -> Result<(), EngineError> {
        if self.inner.lock().destroyed {
            return Err(EngineError::ShuttingDown);
        }
        Ok(())
    }
}

#[async_trait]
impl Engine for SimEngine {
    fn subscribe(&self) -> mpsc::UnboundedReceiver<LifecycleEvent> {
        self.inner
            .lock()
            .events_rx
            .take()
            .unwrap_or_else(|| mpsc::unbounded_channel().1)
    }

    async fn announce(&self, topic: Topic, _opts: AnnounceOptions) -> Result<(), EngineError> {
        self.guard()?;
        self.inner.lock().announced.push(topic);
        Ok(())
    }

    async fn unannounce(&self, topic: Topic) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        let Some(pos) = inner.announced.iter().position(|t| *t == topic) else {
            return Err(EngineError::NotAnnounced(topic));
        };
        inner.announced.remove(pos);
        Ok(())
    }

    async fn lookup(&self, _topic: Topic) -> Result<(), EngineError> {
        self.guard()
    }

    async fn cancel_lookup(&self, _topic: Topic) -> Result<(), EngineError> {
        Ok(())
    }

    async fn query(
        &self,
        _kind: QueryKind,
        _key: NodeId,
    ) -> Result<mpsc::UnboundedReceiver<QueryResult>, EngineError> {
        self.guard()?;
        // No peers to walk; the stream ends immediately.
        let (_, rx) = mpsc::unbounded_channel();
        Ok(rx)
    }

    async fn ping(&self) -> Result<Vec<PeerAddr>, EngineError> {
        self.guard()?;
        Ok(Vec::new())
    }

    fn connections(&self) -> mpsc::UnboundedReceiver<EngineConnection> {
        self.inner
            .lock()
            .connections_rx
            .take()
            .unwrap_or_else(|| mpsc::unbounded_channel().1)
    }

    async fn destroy(&self) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        if inner.destroyed {
            return Ok(());
        }
        inner.destroyed = true;
        drop(inner);
        self.emit(LifecycleEvent::EngineClosed);
        Ok(())
    }

    fn holepunchable(&self) -> bool {
        true
    }

    fn remote_address(&self) -> Option<PeerAddr> {
        Some(PeerAddr {
            host: "127.0.0.1".to_string(),
            port: self.options.port,
        })
    }

    fn hash(&self, data: &[u8]) -> Topic {
        topic_hash(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn startup_sequence_is_listening_then_bootstrapped() {
        let engine = SimEngine::create(NodeId::from([9u8; 32]), EngineOptions::default());
        let mut events = engine.subscribe();
        assert!(matches!(
            events.recv().await,
            Some(LifecycleEvent::Listening { .. })
        ));
        assert_eq!(events.recv().await, Some(LifecycleEvent::Bootstrapped));
    }

    #[tokio::test]
    async fn destroy_confirms_with_closure_event() {
        let engine = SimEngine::create(NodeId::from([9u8; 32]), EngineOptions::default());
        let mut events = engine.subscribe();
        engine.destroy().await.unwrap();
        // Startup events first, then the closure confirmation.
        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(events.recv().await.unwrap());
        }
        assert_eq!(seen.last(), Some(&LifecycleEvent::EngineClosed));
    }

    #[tokio::test]
    async fn unannounce_requires_a_prior_announce() {
        let engine = SimEngine::create(NodeId::from([9u8; 32]), EngineOptions::default());
        let topic = Topic::from([3u8; 32]);
        assert!(engine.unannounce(topic).await.is_err());
        engine
            .announce(topic, AnnounceOptions::default())
            .await
            .unwrap();
        engine.unannounce(topic).await.unwrap();
    }
}
