//! Error types for internationalization operations

use thiserror::Error;

/// Errors that can occur during internationalization operations
#[derive(Error, Debug)]
pub enum I18nError {
    /// Failed to parse a language identifier
    #[error("Invalid language identifier: {0}")]
    InvalidLanguageId(String),

    /// The locale code is not one we ship resources for
    #[error("Unsupported locale: {0}")]
    UnsupportedLocale(String),

    /// Failed to parse a Fluent resource
    #[error("Failed to parse Fluent resource '{resource}': {errors:?}")]
    FluentParseError {
        /// Resource name.
        resource: String,
        /// Parser messages.
        errors: Vec<String>,
    },

    /// Two resources define the same message
    #[error("Failed to add resource '{resource}' to bundle: {errors:?}")]
    BundleError {
        /// Resource name.
        resource: String,
        /// Conflicting message ids.
        errors: Vec<String>,
    },

    /// Message not found in any bundle
    #[error("Message not found: {key}")]
    MessageNotFound {
        /// Message id.
        key: String,
    },

    /// Failed to format a message
    #[error("Failed to format message '{key}': {errors:?}")]
    MessageFormatError {
        /// Message id.
        key: String,
        /// Formatter messages.
        errors: Vec<String>,
    },
}

/// Result type for i18n operations
pub type I18nResult<T> = Result<T, I18nError>;
