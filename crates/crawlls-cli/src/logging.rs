// Logging setup for the language server
//
// stdout carries the protocol, so every log line goes to stderr.

use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::error::{CliError, CliResult};

/// Log levels accepted by `--log-level`
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Parse a log level name, case-insensitively
pub fn parse_level(name: &str) -> Option<Level> {
    match name.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Filter for `level`, overridden by `RUST_LOG` when it is set
pub fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()))
}

/// Install the global subscriber writing to stderr
pub fn init_logging(level: Level, debug: bool) -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_target(debug)
        .with_thread_ids(debug)
        .with_file(debug)
        .with_line_number(debug)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))
}
