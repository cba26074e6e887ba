//! Diagnostic logging setup.
//!
//! Tracing output goes to stderr so it never interleaves with rendered
//! lifecycle events on stdout.

use tracing_subscriber::EnvFilter;

/// Initialize logging.
///
/// The filter starts from `RUST_LOG` when set, defaults to `info`, and
/// collapses to errors only under `--quiet`.
pub fn init_logging(quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}
