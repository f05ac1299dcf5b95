// src/logging.rs
// =============================================================================
// Logging setup for the CLI.
//
// Everything goes to stderr so stdout stays clean for --json output.
// The level comes from RUST_LOG when it is set, otherwise from -v flags:
//   (none) -> warn, -v -> info, -vv -> debug, -vvv -> trace
// =============================================================================

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

// Installs the global tracing subscriber. Call once, at startup.
pub fn init_logging(verbosity: u8) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_thread_names(true)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to initialize logging: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(default_directive(0), "warn");
        assert_eq!(default_directive(1), "info");
        assert_eq!(default_directive(2), "debug");
        assert_eq!(default_directive(9), "trace");
    }
}
