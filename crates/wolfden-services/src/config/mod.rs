//! Service configuration
//!
//! Typed settings with defaults from [`crate::constants`], loadable
//! from TOML and environment via [`ConfigLoader`].

mod loader;

pub use loader::ConfigLoader;

use crate::constants::{
    CACHE_DEFAULT_TTL_SECS, CACHE_SWEEP_THRESHOLD, QUERY_DEFAULT_RETRIES, QUERY_TIMEOUT_MS,
    SESSION_REFRESH_INTERVAL_SECS,
};
use serde::{Deserialize, Serialize};
use wolfden_domain::error::{AppError, ErrorCategory, ErrorSeverity, Result};

/// Cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Whether caching is enabled; disabled swaps in the null store
    pub enabled: bool,
    /// Entry count past which writes sweep expired entries
    pub max_entries: usize,
    /// Default TTL in seconds for entries without an explicit one
    pub default_ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: CACHE_SWEEP_THRESHOLD,
            default_ttl_secs: CACHE_DEFAULT_TTL_SECS,
        }
    }
}

/// Query execution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuerySettings {
    /// Per-attempt timeout in milliseconds
    pub timeout_ms: u64,
    /// Retry budget for retry-eligible failures
    pub retries: u32,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            timeout_ms: QUERY_TIMEOUT_MS,
            retries: QUERY_DEFAULT_RETRIES,
        }
    }
}

/// Session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Interval between background token refreshes, in seconds
    pub refresh_interval_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            refresh_interval_secs: SESSION_REFRESH_INTERVAL_SECS,
        }
    }
}

/// Monitoring settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitoringSettings {
    /// Forward every reported error to the monitoring sink
    ///
    /// Config-driven replacement for the original's production-build
    /// sniffing; enable in production deployments.
    pub forward_errors: bool,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Emit JSON instead of human-readable lines
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Top-level service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Cache settings
    pub cache: CacheSettings,
    /// Query execution settings
    pub query: QuerySettings,
    /// Session settings
    pub session: SessionSettings,
    /// Monitoring settings
    pub monitoring: MonitoringSettings,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Validate settings, rejecting values that would wedge the layer
    pub fn validate(&self) -> Result<()> {
        if self.query.timeout_ms == 0 {
            return Err(config_error("query.timeout_ms must be positive"));
        }
        if self.query.retries > 10 {
            return Err(config_error("query.retries must be at most 10"));
        }
        if self.cache.max_entries == 0 {
            return Err(config_error("cache.max_entries must be positive"));
        }
        if self.session.refresh_interval_secs < 30 {
            return Err(config_error(
                "session.refresh_interval_secs must be at least 30",
            ));
        }
        crate::logging::parse_log_level(&self.logging.level)?;
        Ok(())
    }
}

fn config_error(message: &str) -> AppError {
    AppError::new(
        ErrorCategory::Validation,
        ErrorSeverity::High,
        false,
        message,
        "Service configuration is invalid.",
    )
}
