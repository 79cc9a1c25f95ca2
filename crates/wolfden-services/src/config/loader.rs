//! Configuration loader
//!
//! Merges configuration from defaults, an optional TOML file, and
//! prefixed environment variables using Figment. Later sources
//! override earlier ones.

use crate::config::ServiceConfig;
use crate::constants::{CONFIG_ENV_PREFIX, DEFAULT_CONFIG_FILENAME};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use wolfden_domain::error::{AppError, ErrorCategory, ErrorSeverity, Result};

/// Configuration loader service
#[derive(Clone)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    env_prefix: String,
}

impl ConfigLoader {
    /// Create a loader with default settings
    pub fn new() -> Self {
        Self {
            config_path: None,
            env_prefix: CONFIG_ENV_PREFIX.to_string(),
        }
    }

    /// Set the configuration file path
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the environment variable prefix
    pub fn with_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Load configuration from all sources
    ///
    /// Merge order (later overrides earlier):
    /// 1. `ServiceConfig::default()`
    /// 2. TOML file (explicit path, or `wolfden.toml` in the working
    ///    directory when none was given)
    /// 3. Environment variables, e.g. `WOLFDEN_QUERY__TIMEOUT_MS`
    ///    (double underscore separates nesting levels so field names
    ///    may themselves contain underscores)
    pub fn load(&self) -> Result<ServiceConfig> {
        let mut figment = Figment::new().merge(Serialized::defaults(ServiceConfig::default()));

        let candidate = self
            .config_path
            .clone()
            .or_else(|| Some(PathBuf::from(DEFAULT_CONFIG_FILENAME)));
        if let Some(path) = candidate {
            if path.exists() {
                figment = figment.merge(Toml::file(&path));
                info!("configuration loaded from {}", path.display());
            } else if self.config_path.is_some() {
                warn!("configuration file not found: {}", path.display());
            }
        }

        figment = figment.merge(Env::prefixed(&format!("{}_", self.env_prefix)).split("__"));

        let config: ServiceConfig = figment.extract().map_err(|err| {
            AppError::new(
                ErrorCategory::Validation,
                ErrorSeverity::High,
                false,
                format!("failed to extract configuration: {err}"),
                "Service configuration is invalid.",
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, config: &ServiceConfig, path: P) -> Result<()> {
        let toml_string = toml::to_string_pretty(config).map_err(|err| {
            AppError::new(
                ErrorCategory::Unknown,
                ErrorSeverity::Medium,
                false,
                format!("failed to serialize config to TOML: {err}"),
                "Could not save configuration.",
            )
        })?;
        std::fs::write(path.as_ref(), toml_string).map_err(|err| {
            AppError::new(
                ErrorCategory::Unknown,
                ErrorSeverity::Medium,
                false,
                format!("failed to write config file: {err}"),
                "Could not save configuration.",
            )
        })
    }

    /// The configured file path, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigLoader")
            .field("config_path", &self.config_path)
            .field("env_prefix", &self.env_prefix)
            .finish()
    }
}
