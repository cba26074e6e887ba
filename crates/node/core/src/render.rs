//! Lifecycle event rendering.
//!
//! One line per event on the output stream, in one of two process-wide
//! modes. Structured mode emits a JSON record per line with a fixed field
//! set per variant and a `kind` discriminator; 32-byte keys are hex-encoded
//! at fixed length, ports are decimal. Text mode carries the same
//! information for humans and its wording is not a stable contract.
//!
//! Rendering is pure: `text_line` and `json_record` have no side effects,
//! so they are testable without an engine. [`EventRenderer`] adds the
//! verbosity filter and the actual write.

use std::io::{self, Write};

use serde_json::json;
use swarmctl_engine_api::{LifecycleEvent, NodeId, PeerAddr, QueryResult};

use crate::identity::NodeIdentity;

/// Process-wide output mode, chosen at start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Text,
    Json,
}

/// Render an event as a human-readable line (without trailing newline).
pub fn text_line(event: &LifecycleEvent) -> String {
    match event {
        LifecycleEvent::Listening {
            address,
            port,
            family,
        } => {
            format!("Listening on {address}:{port} (udp,{family})")
        }
        LifecycleEvent::Bootstrapped => "Node fully bootstrapped".to_string(),
        LifecycleEvent::NetworkPersistent => {
            "Network appears holepunchable and stable. Now persistent".to_string()
        }
        LifecycleEvent::Warning { message } => format!("Warning: {message}"),
        LifecycleEvent::FatalError { message } => format!("Error: {message}"),
        LifecycleEvent::PeerObserved { kind, topic, peer } => {
            format!("Received {kind}: {peer} @ {}", hex::encode(topic))
        }
        LifecycleEvent::ConnectionOpened { id, initiator } => {
            format!("[connection start id={id} initiator={initiator}]")
        }
        LifecycleEvent::ConnectionClosed { id, error } => {
            format!(
                "[connection end id={id} err={}]",
                error.as_deref().unwrap_or("null")
            )
        }
        LifecycleEvent::EngineClosed => "Engine closed".to_string(),
    }
}

/// Render an event as its structured record.
pub fn json_record(event: &LifecycleEvent) -> serde_json::Value {
    let kind = event.kind();
    match event {
        LifecycleEvent::Listening {
            address,
            port,
            family,
        } => json!({
            "kind": kind,
            "address": address,
            "port": port,
            "family": family.to_string(),
        }),
        LifecycleEvent::Bootstrapped
        | LifecycleEvent::NetworkPersistent
        | LifecycleEvent::EngineClosed => json!({ "kind": kind }),
        LifecycleEvent::Warning { message } | LifecycleEvent::FatalError { message } => json!({
            "kind": kind,
            "message": message,
        }),
        LifecycleEvent::PeerObserved {
            kind: observation,
            topic,
            peer,
        } => json!({
            "kind": kind,
            "observation": observation.to_string(),
            "topic": hex::encode(topic),
            "peer": { "host": peer.host, "port": peer.port },
        }),
        LifecycleEvent::ConnectionOpened { id, initiator } => json!({
            "kind": kind,
            "id": id,
            "initiator": initiator,
        }),
        LifecycleEvent::ConnectionClosed { id, error } => json!({
            "kind": kind,
            "id": id,
            "error": error,
        }),
    }
}

/// Startup summary printed once after identity resolution, before any
/// engine event.
#[derive(Debug, Clone)]
pub struct StartupSummary {
    pub version: &'static str,
    pub identity: NodeIdentity,
    pub port: u16,
    pub address: String,
    pub adaptive: bool,
    pub bootstrap: Vec<String>,
    pub verbose: bool,
}

/// Writes rendered events to an output stream, applying the verbosity
/// filter. Peer observations and connection open/close lines only appear
/// with verbosity on; every other variant always renders.
#[derive(Debug)]
pub struct EventRenderer<W: Write> {
    mode: OutputMode,
    verbose: bool,
    out: W,
}

impl EventRenderer<io::Stdout> {
    pub fn stdout(mode: OutputMode, verbose: bool) -> Self {
        Self::new(mode, verbose, io::stdout())
    }
}

impl<W: Write> EventRenderer<W> {
    pub fn new(mode: OutputMode, verbose: bool, out: W) -> Self {
        Self { mode, verbose, out }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Render one event, honoring the verbosity filter. Filtered events are
    /// dropped from the output only; callers still see them.
    pub fn render(&mut self, event: &LifecycleEvent) -> io::Result<()> {
        if event.is_verbose_only() && !self.verbose {
            return Ok(());
        }
        let line = match self.mode {
            OutputMode::Text => text_line(event),
            OutputMode::Json => json_record(event).to_string(),
        };
        writeln!(self.out, "{line}")?;
        self.out.flush()
    }

    /// Render the reachability report, issued once the engine's routing
    /// table has its first contacts.
    pub fn render_reachability(
        &mut self,
        holepunchable: bool,
        remote: Option<&PeerAddr>,
    ) -> io::Result<()> {
        match self.mode {
            OutputMode::Text => {
                if !holepunchable {
                    writeln!(self.out, "Warning: network does not appear holepunchable")?;
                } else if let Some(address) = remote {
                    writeln!(
                        self.out,
                        "Network appears holepunchable (remote address is {address})"
                    )?;
                } else {
                    writeln!(self.out, "Network appears holepunchable")?;
                }
            }
            OutputMode::Json => {
                let record = json!({
                    "kind": "reachability",
                    "holepunchable": holepunchable,
                    "remote": remote.map(|a| json!({ "host": a.host, "port": a.port })),
                });
                writeln!(self.out, "{record}")?;
            }
        }
        self.out.flush()
    }

    /// Render the find-node preamble naming the key being walked towards.
    pub fn render_query_target(&mut self, key: &NodeId) -> io::Result<()> {
        match self.mode {
            OutputMode::Text => writeln!(self.out, "Looking for {}", hex::encode(key))?,
            OutputMode::Json => {
                let record = json!({
                    "kind": "looking",
                    "id": hex::encode(key),
                });
                writeln!(self.out, "{record}")?;
            }
        }
        self.out.flush()
    }

    /// Render one direct-query result (find-node).
    pub fn render_query_result(&mut self, result: &QueryResult) -> io::Result<()> {
        let Some(node_id) = result.node_id else {
            return Ok(());
        };
        match self.mode {
            OutputMode::Text => {
                writeln!(self.out, "Found: {} {}", hex::encode(node_id), result.node)?
            }
            OutputMode::Json => {
                let record = json!({
                    "kind": "found",
                    "id": hex::encode(node_id),
                    "host": result.node.host,
                    "port": result.node.port,
                });
                writeln!(self.out, "{record}")?;
            }
        }
        self.out.flush()
    }

    /// Render a ping response.
    pub fn render_pong(&mut self, nodes: &[PeerAddr]) -> io::Result<()> {
        match self.mode {
            OutputMode::Text => {
                writeln!(self.out, "[pong]")?;
                for node in nodes {
                    writeln!(self.out, "  {node}")?;
                }
            }
            OutputMode::Json => {
                let record = json!({
                    "kind": "pong",
                    "nodes": nodes.iter().map(|n| json!({
                        "host": n.host,
                        "port": n.port,
                    })).collect::<Vec<_>>(),
                });
                writeln!(self.out, "{record}")?;
            }
        }
        self.out.flush()
    }

    /// Render the one-off startup summary.
    pub fn render_startup(&mut self, summary: &StartupSummary) -> io::Result<()> {
        match self.mode {
            OutputMode::Json => {
                let record = json!({
                    "kind": "start",
                    "version": summary.version,
                    "id": summary.identity.to_hex(),
                    "id_file": summary.identity.cache_path().map(|p| p.display().to_string()),
                    "port": summary.port,
                    "address": summary.address,
                    "adaptive": summary.adaptive,
                    "bootstrap": summary.bootstrap,
                    "verbose": summary.verbose,
                });
                writeln!(self.out, "{record}")?;
            }
            OutputMode::Text => {
                writeln!(self.out, "swarmctl {}\n", summary.version)?;
                writeln!(self.out, "  id={}", summary.identity.to_hex())?;
                if let Some(path) = summary.identity.cache_path() {
                    writeln!(self.out, "  id-file={}", path.display())?;
                }
                writeln!(self.out, "  port={}", summary.port)?;
                writeln!(self.out, "  address={}", summary.address)?;
                writeln!(self.out, "  adaptive={}", summary.adaptive)?;
                if summary.bootstrap.is_empty() {
                    writeln!(self.out, "  bootstrap=(default)")?;
                } else {
                    writeln!(self.out, "  bootstrap={}", summary.bootstrap.join(","))?;
                }
                writeln!(self.out, "  verbose={}\n", summary.verbose)?;
                if summary.adaptive {
                    writeln!(
                        self.out,
                        "Running in adaptive mode. Will go persistent once stable and holepunchable"
                    )?;
                }
            }
        }
        self.out.flush()
    }
}
