//! Output CLI arguments.

use clap::Args;

use crate::render::OutputMode;

/// Output configuration.
#[derive(Debug, Args, Clone, Default)]
#[command(next_help_heading = "Output")]
pub struct OutputArgs {
    /// Output all messages as JSON records, one per line.
    #[arg(long, short = 'j')]
    pub json: bool,

    /// Also print peer observations and connection open/close events.
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Silence diagnostic logging (rendered events still print).
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

impl OutputArgs {
    pub fn mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        }
    }
}
