//! Configuration loading utilities

use crate::schema::{Config, StorageBackend};
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_VAR: &str = "MODGATE_CONFIG_PATH";

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error when reading configuration file
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML configuration: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation error
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    /// Environment variable parsing error
    #[error("Failed to parse environment variable '{var}': {message}")]
    EnvParseError {
        /// Variable name.
        var: String,
        /// Why the value was rejected.
        message: String,
    },
}

impl From<ConfigError> for modgate_common::ModgateError {
    fn from(err: ConfigError) -> Self {
        modgate_common::ModgateError::config_with_source("Configuration loading failed", err)
    }
}

/// Configuration loader for the application
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file with environment variable overrides
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        debug!(path = %path.as_ref().display(), "Reading configuration file");
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config = Self::parse(&content)?;

        Self::apply_overrides(&mut config, |var| env::var(var).ok())?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from `MODGATE_CONFIG_PATH`, `config.yaml`, or defaults plus environment.
    pub fn load() -> Result<Config, ConfigError> {
        if let Ok(config_path) = env::var(CONFIG_PATH_VAR) {
            info!(path = %config_path, "Loading configuration from {}", CONFIG_PATH_VAR);
            return Self::load_config(&config_path);
        }

        for candidate in ["config.yaml", "config.yml"] {
            if Path::new(candidate).exists() {
                info!(path = candidate, "Loading configuration file");
                return Self::load_config(candidate);
            }
        }

        info!("No configuration file found, using defaults with environment overrides");
        let mut config = Config::default();
        Self::apply_overrides(&mut config, |var| env::var(var).ok())?;
        config.validate_all()?;
        Ok(config)
    }

    /// Parse YAML text without applying overrides or validation.
    pub fn parse(content: &str) -> Result<Config, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply overrides taken from `lookup`, normally the process environment.
    pub fn apply_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("DISCORD_TOKEN") {
            config.discord.token = token;
        }

        if let Some(prefix) = lookup("MODGATE_PREFIX") {
            config.discord.prefix = prefix;
        }

        if let Some(locale) = lookup("MODGATE_LOCALE") {
            config.i18n.default_locale = locale;
        }

        if let Some(path) = lookup("MODGATE_STORAGE_PATH") {
            config.storage.path = path.into();
        }

        if let Some(backend) = lookup("MODGATE_STORAGE_BACKEND") {
            config.storage.backend = match backend.to_ascii_lowercase().as_str() {
                "sled" => StorageBackend::Sled,
                "memory" => StorageBackend::Memory,
                other => {
                    return Err(ConfigError::EnvParseError {
                        var: "MODGATE_STORAGE_BACKEND".to_string(),
                        message: format!("unknown storage backend '{other}'"),
                    })
                }
            };
        }

        if let Some(level) = lookup("MODGATE_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Some(ttl) = lookup("MODGATE_SILENT_TTL_SECS") {
            config.moderation.silent_marker_ttl_secs =
                ttl.parse().map_err(|e: std::num::ParseIntError| ConfigError::EnvParseError {
                    var: "MODGATE_SILENT_TTL_SECS".to_string(),
                    message: e.to_string(),
                })?;
        }

        Ok(())
    }
}
