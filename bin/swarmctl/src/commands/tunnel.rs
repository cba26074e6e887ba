//! The listening relay node.

use clap::Args;
use swarmctl_engine_api::AnnounceOptions;
use swarmctl_node_core::args::{resolve_topic, IdentityArgs, NetworkArgs, OutputArgs};
use swarmctl_node_core::termination_signals;
use tracing::info;

/// Arguments for the `tunnel-server` command.
#[derive(Debug, Args)]
pub struct TunnelArgs {
    /// Topic to announce at start (64 hex characters, or any key with
    /// --hash). Without it the node only listens.
    #[arg(long, value_name = "KEY")]
    pub announce: Option<String>,

    /// Hash the key into a topic instead of reading it as hex.
    #[arg(long)]
    pub hash: bool,

    #[command(flatten)]
    pub identity: IdentityArgs,

    #[command(flatten)]
    pub network: NetworkArgs,
}

impl TunnelArgs {
    pub async fn run(self, output: &OutputArgs) -> eyre::Result<i32> {
        let (_, mut agent) = super::build_agent(&self.identity, &self.network, output)?;
        let engine = agent.engine().clone();

        if let Some(raw) = &self.announce {
            let topic = resolve_topic(raw, self.hash, engine.as_ref())?;
            let opts = AnnounceOptions {
                port: self.network.port,
                local_port: 0,
            };
            agent.sessions().open_announce(topic, opts).await?;
            info!(%topic, "announced relay topic");
        }

        let relay = super::spawn_relay(&engine);
        let code = agent.run(termination_signals()).await?;
        relay.abort();
        Ok(code)
    }
}
