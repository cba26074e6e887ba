//! Shutdown phases, exit code tracking, and termination signals.

use tokio::sync::mpsc;
use tracing::debug;

/// Shutdown phase of the agent.
///
/// `Running -> ShuttingDown` on the first termination trigger or fatal
/// engine error; later triggers are ignored. `ShuttingDown -> Closed` only
/// when the engine confirms closure. There is no internal watchdog: an
/// engine that never confirms leaves termination to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running,
    ShuttingDown,
    Closed,
}

/// Process-wide exit state: the phase plus the code the process will exit
/// with. The code is monotonic; once a fatal condition set it to 1, nothing
/// resets it.
#[derive(Debug)]
pub struct ExitState {
    code: i32,
    phase: Phase,
}

impl Default for ExitState {
    fn default() -> Self {
        Self::new()
    }
}

impl ExitState {
    pub fn new() -> Self {
        Self {
            code: 0,
            phase: Phase::Running,
        }
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Record a fatal condition. Monotonic and phase-independent.
    pub fn record_fatal(&mut self) {
        self.code = 1;
    }

    /// Enter the shutting-down phase. Returns false when already past
    /// Running, which makes every later trigger a no-op.
    pub fn begin_shutdown(&mut self) -> bool {
        if self.phase != Phase::Running {
            debug!(phase = ?self.phase, "shutdown trigger ignored");
            return false;
        }
        self.phase = Phase::ShuttingDown;
        true
    }

    /// Terminal transition, driven only by the engine's own closure event.
    pub fn mark_closed(&mut self) {
        self.phase = Phase::Closed;
    }
}

/// Forward SIGINT and SIGTERM into a channel the lifecycle loop selects on.
/// Every delivered signal becomes one message; the loop's idempotence makes
/// repeats harmless.
pub fn termination_signals() -> mpsc::UnboundedReceiver<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let Ok(mut term) = signal(SignalKind::terminate()) else {
                return;
            };
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
                if tx.send(()).is_err() {
                    break;
                }
            }
        }
        #[cfg(not(unix))]
        {
            loop {
                if tokio::signal::ctrl_c().await.is_err() {
                    break;
                }
                if tx.send(()).is_err() {
                    break;
                }
            }
        }
    });
    rx
}
