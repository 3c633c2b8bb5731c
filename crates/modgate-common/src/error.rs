//! Error types and utilities for modgate

use thiserror::Error;

/// Result type alias for modgate operations
pub type Result<T> = std::result::Result<T, ModgateError>;

/// Main error type for modgate infrastructure operations
#[derive(Error, Debug)]
pub enum ModgateError {
    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong.
        message: String,
        /// Underlying cause.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persistent storage errors
    #[error("Database error: {message}")]
    Database {
        /// What went wrong.
        message: String,
        /// Underlying cause.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internationalization and localization errors
    #[error("Localization error: {message}")]
    Localization {
        /// What went wrong.
        message: String,
        /// Locale being loaded, when known.
        locale: Option<String>,
    },
}

impl ModgateError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new configuration error with source
    pub fn config_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new database error with source
    pub fn database_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Database {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new localization error with locale
    pub fn localization_with_locale(msg: impl Into<String>, locale: impl Into<String>) -> Self {
        Self::Localization {
            message: msg.into(),
            locale: Some(locale.into()),
        }
    }
}
