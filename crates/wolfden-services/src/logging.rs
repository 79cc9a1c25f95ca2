//! Structured logging with tracing
//!
//! Centralized logging initialization for hosts embedding the service
//! layer. Severity-mapped error logging itself happens inside
//! [`crate::errors::ErrorReporter`]; this module only wires the
//! subscriber.

use crate::config::LoggingConfig;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};
use wolfden_domain::error::{AppError, ErrorCategory, ErrorSeverity, Result};

/// Initialize logging with the provided configuration
///
/// The `WOLFDEN_LOG` environment variable overrides the configured
/// level filter. Calling this twice returns an error from the
/// subscriber; hosts call it once at startup.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let level = parse_log_level(&config.level)?;
    let filter =
        EnvFilter::try_from_env("WOLFDEN_LOG").unwrap_or_else(|_| EnvFilter::new(&config.level));

    let result = if config.json_format {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
    } else {
        fmt().with_env_filter(filter).with_target(true).try_init()
    };

    result.map_err(|err| {
        AppError::new(
            ErrorCategory::Unknown,
            ErrorSeverity::Medium,
            false,
            format!("failed to initialize logging: {err}"),
            "Logging could not be initialized.",
        )
    })?;

    info!("logging initialized with level: {level}");
    Ok(())
}

/// Parse a log level string to a tracing [`Level`]
pub fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(AppError::new(
            ErrorCategory::Validation,
            ErrorSeverity::Low,
            false,
            format!("invalid log level: {other}. Use trace, debug, info, warn, or error"),
            "Invalid log level.",
        )),
    }
}
