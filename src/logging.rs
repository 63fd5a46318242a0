//! Diagnostics on stderr using tracing

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable overriding the log filter, e.g. `BRO_CUT_LOG=debug`.
pub const LOG_ENV: &str = "BRO_CUT_LOG";

/// Initialize the logging subsystem
///
/// Warnings (dropped lines, failed conversions) are always shown. `debug`
/// raises the default level so header-state changes and statistics appear.
pub fn init(debug: bool) -> anyhow::Result<()> {
    let default_level = if debug { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(false)
                .without_time(),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))
}
