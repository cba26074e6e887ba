//! swarmctl CLI entry point.

use clap::{Parser, Subcommand};
use swarmctl_node_core::args::OutputArgs;

use crate::commands::{dht, discovery, swarm, tunnel};

/// swarmctl - lifecycle agents for a peer-to-peer engine
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output configuration (applies to all subcommands).
    #[command(flatten)]
    pub output: OutputArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available agent modes.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a standalone routing node.
    Dht(dht::DhtArgs),
    /// Announce, look up, and query topics against the network.
    Discovery(discovery::DiscoveryArgs),
    /// Join a topic and bridge accepted connections to stdio.
    Swarm(swarm::SwarmArgs),
    /// Run a listening relay node, optionally announcing a topic.
    #[command(name = "tunnel-server")]
    TunnelServer(tunnel::TunnelArgs),
}

impl Cli {
    /// Dispatch to the selected agent mode. Returns the process exit code.
    pub async fn run(self) -> eyre::Result<i32> {
        match self.command {
            Commands::Dht(args) => args.run(&self.output).await,
            Commands::Discovery(args) => args.run(&self.output).await,
            Commands::Swarm(args) => args.run(&self.output).await,
            Commands::TunnelServer(args) => args.run(&self.output).await,
        }
    }
}
