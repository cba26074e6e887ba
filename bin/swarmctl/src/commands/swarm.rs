//! Join a topic and relay accepted connections over stdio.

use clap::Args;
use eyre::bail;
use swarmctl_engine_api::AnnounceOptions;
use swarmctl_node_core::args::{resolve_topic, IdentityArgs, NetworkArgs, OutputArgs};
use swarmctl_node_core::termination_signals;
use tracing::info;

/// Arguments for the `swarm` command.
#[derive(Debug, Args)]
pub struct SwarmArgs {
    /// Topic to join (64 hex characters, or any key with --hash).
    #[arg(value_name = "KEY")]
    pub topic: String,

    /// Advertise ourselves on the topic.
    #[arg(long)]
    pub announce: bool,

    /// Resolve peers on the topic.
    #[arg(long)]
    pub lookup: bool,

    /// Hash the key into a topic instead of reading it as hex.
    #[arg(long)]
    pub hash: bool,

    #[command(flatten)]
    pub identity: IdentityArgs,

    #[command(flatten)]
    pub network: NetworkArgs,
}

impl SwarmArgs {
    pub async fn run(self, output: &OutputArgs) -> eyre::Result<i32> {
        if !self.announce && !self.lookup {
            bail!("nothing to do: pass --announce, --lookup or both");
        }

        let (_, mut agent) = super::build_agent(&self.identity, &self.network, output)?;
        let engine = agent.engine().clone();
        let topic = resolve_topic(&self.topic, self.hash, engine.as_ref())?;

        if self.announce {
            let opts = AnnounceOptions {
                port: self.network.port,
                local_port: 0,
            };
            agent.sessions().open_announce(topic, opts).await?;
        }
        if self.lookup {
            agent.sessions().open_lookup(topic).await?;
        }
        info!(%topic, announce = self.announce, lookup = self.lookup, "joined topic");

        let relay = super::spawn_relay(&engine);
        let code = agent.run(termination_signals()).await?;
        relay.abort();
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn refuses_a_join_without_a_direction() {
        let args = SwarmArgs {
            topic: "ab".repeat(32),
            announce: false,
            lookup: false,
            hash: false,
            identity: IdentityArgs::default(),
            network: NetworkArgs::default(),
        };

        let err = args.run(&OutputArgs::default()).await.unwrap_err();
        assert!(err.to_string().contains("--announce"));
    }
}
