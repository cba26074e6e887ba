//! The lifecycle controller.
//!
//! Binds one engine instance to one renderer and one session tracker for
//! the lifetime of a run. Events are forwarded to the renderer in arrival
//! order; a fatal error records exit code 1 and starts the shutdown
//! sequence exactly once; the run only returns after the engine has
//! confirmed closure, so no advertisement is left dangling by a fast exit.

use std::io::{self, Write};
use std::sync::Arc;

use swarmctl_engine_api::{Engine, LifecycleEvent};
use tokio::sync::mpsc;
use tracing::debug;

use crate::render::EventRenderer;
use crate::session::SessionTracker;
use crate::shutdown::{ExitState, Phase};

/// One running agent: engine handle, renderer, sessions, exit state.
pub struct Agent<W: Write> {
    engine: Arc<dyn Engine>,
    renderer: EventRenderer<W>,
    sessions: SessionTracker,
    exit: ExitState,
    /// Pending reachability report, rendered once the routing table has its
    /// first contacts.
    reachability_report: bool,
}

impl<W: Write> Agent<W> {
    pub fn new(engine: Arc<dyn Engine>, renderer: EventRenderer<W>) -> Self {
        let sessions = SessionTracker::new(engine.clone());
        Self {
            engine,
            renderer,
            sessions,
            exit: ExitState::new(),
            reachability_report: false,
        }
    }

    /// Report holepunchability and the remote address once the engine is
    /// bootstrapped.
    pub fn with_reachability_report(mut self) -> Self {
        self.reachability_report = true;
        self
    }

    pub fn engine(&self) -> &Arc<dyn Engine> {
        &self.engine
    }

    pub fn sessions(&mut self) -> &mut SessionTracker {
        &mut self.sessions
    }

    pub fn renderer(&mut self) -> &mut EventRenderer<W> {
        &mut self.renderer
    }

    pub fn has_open_sessions(&self) -> bool {
        self.sessions.open_count() > 0
    }

    /// Run until the engine closes. `shutdown` delivers termination
    /// triggers (signals); the first one starts the shutdown sequence,
    /// repeats are ignored. Returns the process exit code.
    pub async fn run(mut self, mut shutdown: mpsc::UnboundedReceiver<()>) -> io::Result<i32> {
        let mut events = self.engine.subscribe();
        let mut signals_open = true;
        loop {
            tokio::select! {
                biased;
                trigger = shutdown.recv(), if signals_open => {
                    match trigger {
                        Some(()) => {
                            debug!("termination trigger received");
                            self.begin_shutdown().await?;
                        }
                        None => signals_open = false,
                    }
                }
                event = events.recv() => {
                    let Some(event) = event else {
                        // The provider dropped the stream without a closure
                        // event. Nothing left to wait for.
                        debug!("event stream ended without closure event");
                        return Ok(self.exit.code());
                    };
                    if self.handle_event(&event).await? {
                        return Ok(self.exit.code());
                    }
                }
            }
        }
    }

    /// Begin shutdown (if not already begun) and wait for the engine to
    /// confirm closure, still rendering events that arrive meanwhile. Used
    /// by one-shot operations that finish without a termination signal.
    pub async fn finish(mut self) -> io::Result<i32> {
        let mut events = self.engine.subscribe();
        self.begin_shutdown().await?;
        while let Some(event) = events.recv().await {
            if self.handle_event(&event).await? {
                break;
            }
        }
        Ok(self.exit.code())
    }

    /// Handle one event. Returns true when the run is complete.
    async fn handle_event(&mut self, event: &LifecycleEvent) -> io::Result<bool> {
        self.renderer.render(event)?;
        if self.reachability_report && matches!(event, LifecycleEvent::Bootstrapped) {
            self.reachability_report = false;
            let remote = self.engine.remote_address();
            self.renderer
                .render_reachability(self.engine.holepunchable(), remote.as_ref())?;
        }
        if event.is_fatal() {
            self.exit.record_fatal();
            // During an active shutdown the error is rendered above but the
            // sequence is not restarted.
            self.begin_shutdown().await?;
        } else if event.is_terminal() {
            self.exit.mark_closed();
            return Ok(true);
        }
        Ok(false)
    }

    /// The idempotent shutdown sequence: close every open session, wait for
    /// their confirmations, then request engine destruction. The engine
    /// confirms with its closure event, which ends the run loop.
    async fn begin_shutdown(&mut self) -> io::Result<()> {
        if !self.exit.begin_shutdown() {
            return Ok(());
        }
        debug!("closing sessions");
        for (topic, err) in self.sessions.close_all().await {
            self.renderer
                .render(&LifecycleEvent::session_warning("unannounce", &topic, err))?;
        }
        debug!("requesting engine destruction");
        if let Err(err) = self.engine.destroy().await {
            self.renderer.render(&LifecycleEvent::Warning {
                message: format!("destroy request failed: {err}"),
            })?;
        }
        Ok(())
    }

    pub fn phase(&self) -> Phase {
        self.exit.phase()
    }

    pub fn exit_code(&self) -> i32 {
        self.exit.code()
    }
}

impl<W: Write> std::fmt::Debug for Agent<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("sessions", &self.sessions)
            .field("exit", &self.exit)
            .finish_non_exhaustive()
    }
}
