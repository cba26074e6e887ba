//! Topic discovery: announce, lookup, find-node, ping.

use clap::Args;
use eyre::bail;
use swarmctl_engine_api::{AnnounceOptions, Engine, NodeId, QueryKind};
use swarmctl_node_core::args::{resolve_topic, IdentityArgs, NetworkArgs, OutputArgs};
use swarmctl_node_core::termination_signals;
use tracing::info;

/// Arguments for the `discovery` command.
#[derive(Debug, Args)]
pub struct DiscoveryArgs {
    /// Topic to announce (64 hex characters, or any key with --hash).
    #[arg(long, value_name = "KEY")]
    pub announce: Option<String>,

    /// Topic to look up. Resolved peers print as observations (--verbose).
    #[arg(long, value_name = "KEY")]
    pub lookup: Option<String>,

    /// Walk the routing table towards a node id and print every node found.
    /// Without a value the walk targets the zero key.
    #[arg(
        long = "find-node",
        value_name = "KEY",
        num_args = 0..=1,
        default_missing_value = ""
    )]
    pub find_node: Option<String>,

    /// Ping the bootstrap contacts and print the responders.
    #[arg(long)]
    pub ping: bool,

    /// Hash key arguments into topics instead of reading them as hex.
    #[arg(long)]
    pub hash: bool,

    /// Port announced to remote peers when it differs from --port.
    #[arg(long = "local-port", value_name = "PORT")]
    pub local_port: Option<u16>,

    #[command(flatten)]
    pub identity: IdentityArgs,

    #[command(flatten)]
    pub network: NetworkArgs,
}

impl DiscoveryArgs {
    fn announce_options(&self) -> AnnounceOptions {
        AnnounceOptions {
            port: self.network.port,
            local_port: self.local_port.unwrap_or(self.network.port),
        }
    }

    pub async fn run(self, output: &OutputArgs) -> eyre::Result<i32> {
        if self.announce.is_none()
            && self.lookup.is_none()
            && self.find_node.is_none()
            && !self.ping
        {
            bail!("nothing to do: pass --announce, --lookup, --find-node or --ping");
        }

        let (_, mut agent) = super::build_agent(&self.identity, &self.network, output)?;
        let engine = agent.engine().clone();

        if let Some(raw) = &self.announce {
            let topic = resolve_topic(raw, self.hash, engine.as_ref())?;
            let opts = self.announce_options();
            agent.sessions().open_announce(topic, opts).await?;
            info!(%topic, "announcing");
        }

        if let Some(raw) = &self.lookup {
            let topic = resolve_topic(raw, self.hash, engine.as_ref())?;
            agent.sessions().open_lookup(topic).await?;
            info!(%topic, "looking up");
        }

        if self.ping {
            let nodes = engine.ping().await?;
            agent.renderer().render_pong(&nodes)?;
        }

        if let Some(raw) = &self.find_node {
            let key = if raw.is_empty() {
                NodeId::ZERO
            } else {
                resolve_topic(raw, self.hash, engine.as_ref())?
            };
            agent.renderer().render_query_target(&key)?;
            let mut results = engine.query(QueryKind::FindNode, key).await?;
            while let Some(result) = results.recv().await {
                agent.renderer().render_query_result(&result)?;
            }
        }

        if agent.has_open_sessions() {
            Ok(agent.run(termination_signals()).await?)
        } else {
            // One-shot run (find-node or ping only): tear down and wait for
            // the engine to confirm closure.
            Ok(agent.finish().await?)
        }
    }
}
