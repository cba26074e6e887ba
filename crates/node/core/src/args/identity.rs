//! Identity CLI arguments.

use std::path::PathBuf;

use clap::Args;

/// Where the node identity comes from.
#[derive(Debug, Args, Clone, Default)]
#[command(next_help_heading = "Identity")]
pub struct IdentityArgs {
    /// Explicit identity for this node (64 hex characters). Skips the
    /// identity cache entirely.
    #[arg(long, short = 'i', value_name = "KEY")]
    pub id: Option<String>,

    /// Path to the identity cache file (ignored if --id is given).
    #[arg(long = "id-file", short = 'f', value_name = "PATH")]
    pub id_file: Option<PathBuf>,
}

impl IdentityArgs {
    /// The cache path, defaulting into the system temp directory.
    pub fn cache_path(&self) -> PathBuf {
        self.id_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("swarmctl-id"))
    }
}
