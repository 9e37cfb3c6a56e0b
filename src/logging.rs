//! Diagnostic logging via `tracing`.
//!
//! Events go to stderr so command output on stdout stays clean. The filter
//! comes from the `LF_LOG` environment variable when set, otherwise from
//! `[logging].level`.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Environment variable overriding the configured log filter.
pub const LOG_ENV: &str = "LF_LOG";

pub fn init(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
