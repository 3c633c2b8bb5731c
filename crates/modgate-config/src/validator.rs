//! Runtime validation of a loaded configuration.

use crate::loader::ConfigError;
use crate::schema::Config;

impl Config {
    /// Validates every section, reporting the first problem found.
    pub fn validate_all(&self) -> Result<(), ConfigError> {
        if self.discord.token.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "discord.token cannot be empty".to_string(),
            ));
        }

        if self.discord.prefix.is_empty() || self.discord.prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::ValidationError(
                "discord.prefix must be non-empty and contain no whitespace".to_string(),
            ));
        }

        self.validate_moderation()
    }

    /// Validates the moderation section alone; usable without a token.
    pub fn validate_moderation(&self) -> Result<(), ConfigError> {
        let moderation = &self.moderation;

        if moderation.silent_marker_ttl_secs == 0 {
            return Err(ConfigError::ValidationError(
                "moderation.silent_marker_ttl_secs must be positive".to_string(),
            ));
        }

        // the marker has to outlive the cleanup or the leave notice is never matched
        if moderation.cleanup_delay_secs >= moderation.silent_marker_ttl_secs {
            return Err(ConfigError::ValidationError(format!(
                "moderation.cleanup_delay_secs ({}) must be shorter than silent_marker_ttl_secs ({})",
                moderation.cleanup_delay_secs, moderation.silent_marker_ttl_secs
            )));
        }

        for command in &moderation.disablable {
            if command.name.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "moderation.disablable entries need a name".to_string(),
                ));
            }
        }

        Ok(())
    }
}
