//! The standalone routing node.

use clap::Args;
use swarmctl_node_core::args::{IdentityArgs, NetworkArgs, OutputArgs};
use swarmctl_node_core::render::StartupSummary;
use swarmctl_node_core::{termination_signals, VERSION};

/// Arguments for the `dht` command.
#[derive(Debug, Args)]
pub struct DhtArgs {
    #[command(flatten)]
    pub identity: IdentityArgs,

    #[command(flatten)]
    pub network: NetworkArgs,
}

impl DhtArgs {
    pub async fn run(self, output: &OutputArgs) -> eyre::Result<i32> {
        let (identity, agent) = super::build_agent(&self.identity, &self.network, output)?;
        let mut agent = agent.with_reachability_report();

        agent.renderer().render_startup(&StartupSummary {
            version: VERSION,
            identity,
            port: self.network.port,
            address: self.network.address.clone(),
            adaptive: self.network.adaptive(),
            bootstrap: self.network.bootstrap.clone(),
            verbose: output.verbose,
        })?;

        Ok(agent.run(termination_signals()).await?)
    }
}
