//! Logging infrastructure for wikiqa.
//!
//! This module initializes the tracing subscriber for structured logging.
//! All logs are emitted to stderr to keep stdout clean for answers.

use std::io::IsTerminal;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{AppError, AppResult};

/// Logging options resolved from configuration and CLI flags.
#[derive(Debug, Clone, Default)]
pub struct LogOptions<'a> {
    /// Filter directive override (e.g., "debug", "wikiqa_knowledge=trace")
    pub level: Option<&'a str>,

    /// Disable colored output
    pub no_color: bool,

    /// Emit one JSON object per event instead of human-readable lines
    pub json: bool,
}

/// Initialize the tracing subscriber with stderr output.
///
/// This sets up structured logging with:
/// - Output to stderr (stdout is reserved for answers)
/// - Environment-based filtering (RUST_LOG or provided level)
/// - Human-readable or JSON format
/// - Optional ANSI color control
///
/// # Example
/// ```no_run
/// use wikiqa_core::logging::{init_logging, LogOptions};
///
/// init_logging(&LogOptions::default()).expect("Failed to initialize logging");
/// ```
pub fn init_logging(options: &LogOptions<'_>) -> AppResult<()> {
    let default_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter_str = options.level.unwrap_or(&default_level);

    let env_filter = EnvFilter::try_new(filter_str)
        .map_err(|e| AppError::Config(format!("Invalid log filter: {}", e)))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if options.json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_current_span(true),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(!options.no_color && supports_color()),
            )
            .try_init()
    };

    result.map_err(|e| AppError::Config(format!("Failed to init logging: {}", e)))
}

/// Check if stderr can render color output.
fn supports_color() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    std::io::stderr().is_terminal()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_is_config_error() {
        let options = LogOptions {
            level: Some("wikiqa=notalevel"),
            ..Default::default()
        };
        match init_logging(&options) {
            Err(AppError::Config(msg)) => assert!(msg.contains("log")),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_init_logging_once() {
        // The global subscriber can only be set once per process
        let _ = init_logging(&LogOptions::default());
        assert!(init_logging(&LogOptions::default()).is_err());
    }
}
