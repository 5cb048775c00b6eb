//! Log output for the CLI
//!
//! Logs go to stderr so `deploy config --json` can be piped straight into
//! the deploy tool. `RUST_LOG` overrides the level picked from `-v` flags.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Map the number of `-v` flags to a default level
pub fn level_for_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Install the global subscriber
///
/// Safe to call more than once; later calls are ignored.
pub fn init(verbose: u8) {
    let filter = EnvFilter::builder()
        .with_default_directive(level_for_verbosity(verbose).into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
