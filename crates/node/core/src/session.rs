//! Announce/lookup session tracking.
//!
//! Every outstanding announce or lookup holds an implicit resource on the
//! engine. The tracker is the only component that releases them: the set of
//! sessions it holds open is exactly the set that must be closed before the
//! engine itself is destroyed.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use swarmctl_engine_api::{AnnounceOptions, Engine, EngineError, Topic};
use tracing::{debug, warn};

/// Handle to one tracked session.
pub type SessionId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    Announce,
    Lookup,
}

#[derive(Debug)]
struct SessionState {
    kind: SessionKind,
    topic: Topic,
    open: bool,
}

/// Tracks open sessions against one engine.
pub struct SessionTracker {
    engine: Arc<dyn Engine>,
    sessions: HashMap<SessionId, SessionState>,
    next_id: SessionId,
    /// Set once shutdown has started; sessions opened afterwards (a request
    /// that was already in flight when the signal arrived) are released
    /// immediately instead of being left dangling.
    draining: bool,
}

impl SessionTracker {
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self {
            engine,
            sessions: HashMap::new(),
            next_id: 0,
            draining: false,
        }
    }

    /// Ask the engine to advertise `topic` and track the resulting session.
    /// Returns once the request is issued; the advertisement may still be in
    /// flight inside the engine.
    pub async fn open_announce(
        &mut self,
        topic: Topic,
        opts: AnnounceOptions,
    ) -> Result<SessionId, EngineError> {
        self.engine.announce(topic, opts).await?;
        let id = self.track(SessionKind::Announce, topic);
        if self.draining {
            self.close(id).await?;
        }
        Ok(id)
    }

    /// Ask the engine to resolve peers for `topic`. Results surface as
    /// peer-observed lifecycle events, not through this call.
    pub async fn open_lookup(&mut self, topic: Topic) -> Result<SessionId, EngineError> {
        self.engine.lookup(topic).await?;
        let id = self.track(SessionKind::Lookup, topic);
        if self.draining {
            self.close(id).await?;
        }
        Ok(id)
    }

    /// Close one session. Closing an already-closed or unknown session is a
    /// no-op. Announce closes wait for the engine to confirm the removal.
    pub async fn close(&mut self, id: SessionId) -> Result<(), EngineError> {
        let Some(session) = self.sessions.get_mut(&id) else {
            return Ok(());
        };
        if !session.open {
            return Ok(());
        }
        // Mark closed before awaiting so a re-entrant close is a no-op even
        // while the unannounce is still in flight.
        session.open = false;
        let (kind, topic) = (session.kind, session.topic);
        match kind {
            SessionKind::Announce => self.engine.unannounce(topic).await?,
            SessionKind::Lookup => self.engine.cancel_lookup(topic).await?,
        }
        debug!(id, topic = %topic, "session closed");
        Ok(())
    }

    /// Close every open session. Closes run concurrently (sessions are on
    /// unrelated topics) and all of them have resolved when this returns.
    /// Failures are returned for the caller to surface as warnings.
    pub async fn close_all(&mut self) -> Vec<(Topic, EngineError)> {
        self.draining = true;
        let open: Vec<(SessionKind, Topic)> = self
            .sessions
            .values_mut()
            .filter(|s| s.open)
            .map(|s| {
                s.open = false;
                (s.kind, s.topic)
            })
            .collect();

        let engine = &self.engine;
        let closes = open.into_iter().map(|(kind, topic)| async move {
            let result = match kind {
                SessionKind::Announce => engine.unannounce(topic).await,
                SessionKind::Lookup => engine.cancel_lookup(topic).await,
            };
            (topic, result)
        });

        let mut failures = Vec::new();
        for (topic, result) in join_all(closes).await {
            if let Err(err) = result {
                warn!(topic = %topic, error = %err, "session close failed");
                failures.push((topic, err));
            }
        }
        failures
    }

    pub fn open_count(&self) -> usize {
        self.sessions.values().filter(|s| s.open).count()
    }

    pub fn kind_of(&self, id: SessionId) -> Option<SessionKind> {
        self.sessions.get(&id).map(|s| s.kind)
    }

    pub fn is_open(&self, id: SessionId) -> bool {
        self.sessions.get(&id).is_some_and(|s| s.open)
    }

    fn track(&mut self, kind: SessionKind, topic: Topic) -> SessionId {
        let id = self.next_id;
        self.next_id += 1;
        self.sessions.insert(
            id,
            SessionState {
                kind,
                topic,
                open: true,
            },
        );
        id
    }
}

impl std::fmt::Debug for SessionTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTracker")
            .field("sessions", &self.sessions)
            .field("draining", &self.draining)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarmctl_engine_sim::ScriptedEngine;

    fn tracker() -> (Arc<ScriptedEngine>, SessionTracker) {
        let engine = Arc::new(ScriptedEngine::new());
        let tracker = SessionTracker::new(engine.clone());
        (engine, tracker)
    }

    #[tokio::test]
    async fn closing_an_announce_unannounces_exactly_once() {
        let (engine, mut tracker) = tracker();
        let topic = Topic::from([1u8; 32]);
        let id = tracker
            .open_announce(topic, AnnounceOptions::default())
            .await
            .unwrap();
        assert!(tracker.is_open(id));

        tracker.close(id).await.unwrap();
        assert!(!tracker.is_open(id));
        assert_eq!(engine.unannounced(), vec![topic]);

        // Double close and closing an unknown id are no-ops.
        tracker.close(id).await.unwrap();
        tracker.close(999).await.unwrap();
        assert_eq!(engine.calls().unannounces, 1);
    }

    #[tokio::test]
    async fn close_all_releases_every_open_session() {
        let (engine, mut tracker) = tracker();
        let announce = Topic::from([2u8; 32]);
        let lookup = Topic::from([3u8; 32]);
        tracker
            .open_announce(announce, AnnounceOptions::default())
            .await
            .unwrap();
        let lookup_id = tracker.open_lookup(lookup).await.unwrap();
        assert_eq!(tracker.open_count(), 2);
        assert_eq!(tracker.kind_of(lookup_id), Some(SessionKind::Lookup));

        let failures = tracker.close_all().await;
        assert!(failures.is_empty());
        assert_eq!(tracker.open_count(), 0);
        assert_eq!(engine.unannounced(), vec![announce]);
        assert_eq!(engine.calls().lookup_cancels, 1);

        // Repeating the pass has nothing left to release.
        tracker.close_all().await;
        assert_eq!(engine.calls().unannounces, 1);
    }
}
