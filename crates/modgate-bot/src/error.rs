//! Application-wide error types using thiserror.

use modgate_commands::CommandError;
use modgate_common::ModgateError;
use modgate_config::ConfigError;
use poise::serenity_prelude as serenity;

/// Main application error type.
#[derive(thiserror::Error, Debug)]
pub enum BotError {
    /// Configuration could not be loaded or validated.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Shared infrastructure failure (storage, localization, logging).
    #[error(transparent)]
    Common(#[from] ModgateError),

    /// A moderation command failed.
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    /// Discord/Serenity error.
    #[error("Discord error: {0}")]
    Discord(#[from] serenity::Error),
}

/// Result type for the bot application.
pub type BotResult<T> = Result<T, BotError>;
