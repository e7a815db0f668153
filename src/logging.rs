//! Diagnostic logging to stderr.
//!
//! The console owns stdout for prompts and reports, so log lines go to stderr and
//! stay out of the transcript. Level precedence: `--debug`, then `RUST_LOG`, then
//! the configured `logging.level`.

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter};

/// Build the filter for the given configured level.
pub fn env_filter(level: &str, debug: bool) -> Result<EnvFilter> {
    if debug {
        return EnvFilter::try_new("debug").wrap_err("Failed to create debug filter");
    }
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| eyre!("Invalid log level '{}': {}", level, e))
}

/// Install the global subscriber. Call once at startup.
pub fn init(level: &str, debug: bool) -> Result<()> {
    let filter = env_filter(level, debug)?;
    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_line_number(debug)
        .with_file(debug)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init()
        .wrap_err("Failed to initialize logging")?;

    let forced_debug = debug;
    tracing::debug!(configured_level = level, forced_debug, "logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_flag_forces_debug() {
        let filter = env_filter("error", true).unwrap();
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn test_invalid_level_is_rejected_without_env() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert!(env_filter("warn", false).is_ok());
        assert!(env_filter("datadash=loud", false).is_err());
    }
}
