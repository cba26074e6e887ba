//! The per-mode agent commands.

pub mod dht;
pub mod discovery;
pub mod swarm;
pub mod tunnel;

use std::io;
use std::sync::Arc;

use swarmctl_engine_api::Engine;
use swarmctl_engine_sim::SimEngine;
use swarmctl_node_core::args::{IdentityArgs, NetworkArgs, OutputArgs};
use swarmctl_node_core::relay::RelayPump;
use swarmctl_node_core::{identity, Agent, EventRenderer, NodeIdentity};
use tokio::task::JoinHandle;
use tracing::info;

/// Resolve the node identity and stand up the engine plus the agent
/// fronting it. Identity and listen-option failures here are startup
/// errors; the engine is never constructed.
pub(crate) fn build_agent(
    identity_args: &IdentityArgs,
    network: &NetworkArgs,
    output: &OutputArgs,
) -> eyre::Result<(NodeIdentity, Agent<io::Stdout>)> {
    network.validate()?;
    let identity = identity::resolve(identity_args.id.as_deref(), &identity_args.cache_path())?;
    info!(id = %identity.to_hex(), provenance = ?identity.provenance(), "identity resolved");

    let engine: Arc<dyn Engine> =
        Arc::new(SimEngine::create(identity.id(), network.engine_options()));
    let renderer = EventRenderer::stdout(output.mode(), output.verbose);
    Ok((identity, Agent::new(engine, renderer)))
}

/// Consume the engine's connection stream, bridging each accepted
/// connection to stdio. Runs until the stream closes or the task is
/// aborted on shutdown.
pub(crate) fn spawn_relay(engine: &Arc<dyn Engine>) -> JoinHandle<()> {
    let mut connections = engine.connections();
    tokio::spawn(async move {
        let mut pump = RelayPump::new();
        while let Some(conn) = connections.recv().await {
            let _ = pump.attach(conn);
        }
    })
}
