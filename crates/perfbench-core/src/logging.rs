//! Tracing subscriber setup for the `perfbench` binary

use crate::error::ConfigError;
use tracing_subscriber::EnvFilter;

/// Accepted log levels
pub const LOG_LEVELS: [&str; 4] = ["debug", "info", "warn", "error"];

/// Validate a configured log level, case-insensitively
///
/// # Errors
/// Returns [`ConfigError::LogLevel`] for anything outside [`LOG_LEVELS`].
pub fn parse_level(level: &str) -> Result<&'static str, ConfigError> {
    let lower = level.trim().to_ascii_lowercase();
    LOG_LEVELS
        .into_iter()
        .find(|known| *known == lower)
        .ok_or_else(|| ConfigError::LogLevel(level.to_string()))
}

/// Install the global fmt subscriber on stderr
///
/// `RUST_LOG` takes precedence over `level`. Calling this twice is harmless.
///
/// # Errors
/// Returns [`ConfigError::LogLevel`] when `level` is not recognized.
pub fn init(level: &str) -> Result<(), ConfigError> {
    let level = parse_level(level)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    if let Err(e) = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(filter)
        .try_init()
    {
        // A global subscriber is already installed and keeps receiving events.
        tracing::debug!(error = %e, "tracing subscriber already set");
    }
    Ok(())
}
