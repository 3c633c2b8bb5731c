//! Per-chat command toggling and the gate run before every command

use crate::error::{CommandError, CommandResult};
use crate::registry::CommandRegistry;
use crate::store::DisabledCommandStore;
use modgate_common::ChatId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Callback payload of the "yes" button on the enable-all prompt.
pub const ENABLE_ALL_CONFIRM: &str = "enableall:yes";
/// Callback payload of the "no" button on the enable-all prompt.
pub const ENABLE_ALL_CANCEL: &str = "enableall:no";

/// Snapshot of a chat's disabled commands for backup or other modules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisabledExport {
    /// Canonical names, in the order they were disabled.
    pub disabled: Vec<String>,
}

/// What an `enableall` prompt asks the admin to confirm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnableAllPrompt {
    /// Commands currently disabled.
    pub count: usize,
}

/// Disable/enable operations over a [`DisabledCommandStore`].
#[derive(Clone)]
pub struct CommandToggle {
    registry: Arc<CommandRegistry>,
    store: Arc<dyn DisabledCommandStore>,
}

impl std::fmt::Debug for CommandToggle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandToggle")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl CommandToggle {
    /// Creates the toggle over a registry and a store.
    pub fn new(registry: Arc<CommandRegistry>, store: Arc<dyn DisabledCommandStore>) -> Self {
        Self { registry, store }
    }

    /// The registry names are resolved against.
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Canonical names of every command a chat may disable.
    pub fn list_disablable(&self) -> Vec<String> {
        self.registry.disablable().map(str::to_string).collect()
    }

    /// Whether `command` (any alias or spelling) is disabled in the chat.
    pub async fn is_disabled(&self, chat_id: ChatId, command: &str) -> CommandResult<bool> {
        let canonical = self.registry.canonicalize(command);
        Ok(self.store.contains(chat_id, &canonical).await?)
    }

    /// Disables a command and returns its canonical name.
    pub async fn disable(&self, chat_id: ChatId, command: &str) -> CommandResult<String> {
        let canonical = self.registry.canonicalize(command);
        if !self.registry.is_disablable(&canonical) {
            return Err(CommandError::NotDisablable { command: canonical });
        }

        if !self.store.insert(chat_id, &canonical).await? {
            return Err(CommandError::AlreadyDisabled { command: canonical });
        }

        info!(%chat_id, command = %canonical, "Command disabled");
        Ok(canonical)
    }

    /// Enables a command and returns its canonical name.
    pub async fn enable(&self, chat_id: ChatId, command: &str) -> CommandResult<String> {
        let canonical = self.registry.canonicalize(command);
        if !self.registry.is_disablable(&canonical) {
            return Err(CommandError::NotEnablable { command: canonical });
        }

        if !self.store.remove(chat_id, &canonical).await? {
            return Err(CommandError::AlreadyEnabled { command: canonical });
        }

        info!(%chat_id, command = %canonical, "Command enabled");
        Ok(canonical)
    }

    /// First step of enabling everything: reports what would be cleared.
    ///
    /// Nothing changes until [`CommandToggle::enable_all_confirm`] runs.
    pub async fn enable_all(&self, chat_id: ChatId) -> CommandResult<EnableAllPrompt> {
        let count = self.store.list(chat_id).await?.len();
        if count == 0 {
            return Err(CommandError::NothingDisabled);
        }
        debug!(%chat_id, count, "Prompting to enable all commands");
        Ok(EnableAllPrompt { count })
    }

    /// Clears the chat's disabled set and returns how many entries it held.
    pub async fn enable_all_confirm(&self, chat_id: ChatId) -> CommandResult<usize> {
        let removed = self.store.take_all(chat_id).await?;
        if removed.is_empty() {
            return Err(CommandError::NothingDisabled);
        }
        info!(%chat_id, count = removed.len(), "All commands enabled");
        Ok(removed.len())
    }

    /// The chat's disabled commands in the order they were disabled.
    pub async fn disabled(&self, chat_id: ChatId) -> CommandResult<Vec<String>> {
        Ok(self.store.list(chat_id).await?)
    }

    /// Read-only snapshot of the chat's disabled commands.
    pub async fn export(&self, chat_id: ChatId) -> CommandResult<DisabledExport> {
        Ok(DisabledExport {
            disabled: self.store.list(chat_id).await?,
        })
    }
}
