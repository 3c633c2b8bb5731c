//! Configuration schema definitions using serde.

use modgate_common::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for modgate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Discord connection configuration.
    pub discord: DiscordConfig,
    /// Moderation behaviour.
    pub moderation: ModerationConfig,
    /// Persistence of per-chat command toggles.
    pub storage: StorageConfig,
    /// Localization.
    pub i18n: I18nConfig,
    /// Logging output.
    pub logging: LoggingConfig,
}

/// Discord bot configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Discord bot token.
    pub token: String,
    /// Prefix for text commands.
    pub prefix: String,
    /// Roles whose members count as chat admins in addition to permission-based admins.
    pub admin_role_ids: Vec<u64>,
    /// Role granted for permanent mutes; timeouts are used when unset.
    pub muted_role_id: Option<u64>,
}

/// Moderation behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModerationConfig {
    /// Lifetime of the marker left by a silent action.
    pub silent_marker_ttl_secs: u64,
    /// Delay before messages about a silent action are deleted.
    pub cleanup_delay_secs: u64,
    /// Reasons longer than this are truncated in confirmations.
    pub max_reason_length: usize,
    /// Extra commands chats may disable, on top of the built-in ones.
    pub disablable: Vec<DisablableCommand>,
}

impl ModerationConfig {
    /// Silent marker lifetime as a [`Duration`].
    pub const fn silent_marker_ttl(&self) -> Duration {
        Duration::from_secs(self.silent_marker_ttl_secs)
    }

    /// Cleanup delay as a [`Duration`].
    pub const fn cleanup_delay(&self) -> Duration {
        Duration::from_secs(self.cleanup_delay_secs)
    }
}

/// A command that chats may disable, with its alternative names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisablableCommand {
    /// Canonical name.
    pub name: String,
    /// Alternative names resolving to `name`.
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Which store keeps disabled-command sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Embedded sled database on disk.
    Sled,
    /// Process memory; lost on restart.
    Memory,
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Store implementation.
    pub backend: StorageBackend,
    /// Database directory for the sled backend.
    pub path: PathBuf,
}

/// Localization configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct I18nConfig {
    /// Locale used for all replies, e.g. `en` or `es`.
    pub default_locale: String,
}
