//! swarmctl agent binary.

mod cli;
mod commands;

use clap::Parser;
use swarmctl_node_core::logging::init_logging;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    // Usage output and parse failures both exit nonzero; the agents reserve
    // exit code 0 for a run that reached clean engine closure.
    let cli = match cli::Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            err.print()?;
            std::process::exit(1);
        }
    };

    init_logging(cli.output.quiet);

    let code = cli.run().await?;
    std::process::exit(code);
}
