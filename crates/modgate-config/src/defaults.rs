//! Default values for every configuration section.

use crate::schema::*;
use modgate_common::LoggingConfig;
use std::path::PathBuf;

/// Seconds a silent marker stays readable.
pub const DEFAULT_SILENT_MARKER_TTL_SECS: u64 = 30;
/// Seconds before silent-action messages are deleted.
pub const DEFAULT_CLEANUP_DELAY_SECS: u64 = 5;

impl Default for Config {
    fn default() -> Self {
        Self {
            discord: DiscordConfig::default(),
            moderation: ModerationConfig::default(),
            storage: StorageConfig::default(),
            i18n: I18nConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            prefix: "!".to_string(),
            admin_role_ids: Vec::new(),
            muted_role_id: None,
        }
    }
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            silent_marker_ttl_secs: DEFAULT_SILENT_MARKER_TTL_SECS,
            cleanup_delay_secs: DEFAULT_CLEANUP_DELAY_SECS,
            max_reason_length: 200,
            disablable: Vec::new(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sled,
            path: PathBuf::from("data/modgate.db"),
        }
    }
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            default_locale: "en".to_string(),
        }
    }
}
