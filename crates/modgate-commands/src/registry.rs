//! Command registry: names, aliases and which commands can be disabled per chat

use modgate_config::ModerationConfig;
use std::collections::HashMap;
use tracing::{debug, warn};

/// A registered command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Canonical name.
    pub name: String,
    /// Alternative names resolving to `name`.
    pub aliases: Vec<String>,
    /// Whether chats may disable it.
    pub disablable: bool,
}

/// Registry for every command the bot answers to
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: Vec<CommandSpec>,
    /// alias or canonical name -> index into `commands`
    lookup: HashMap<String, usize>,
}

impl CommandRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the moderation commands and the built-in disablable ones.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();

        registry.register("disableable", &["disablable"], true);
        registry.register("disabled", &[], true);

        registry.register("disable", &[], false);
        registry.register("enable", &[], false);
        registry.register("enableall", &[], false);

        registry.register("kick", &["skick"], false);
        registry.register("mute", &["smute", "tmute", "stmute"], false);
        registry.register("unmute", &[], false);
        registry.register("ban", &["sban", "tban", "stban"], false);
        registry.register("unban", &[], false);

        registry
    }

    /// Built-in commands plus the operator's extra disablable commands.
    pub fn from_config(config: &ModerationConfig) -> Self {
        let mut registry = Self::with_builtin();
        for extra in &config.disablable {
            let aliases: Vec<&str> = extra.aliases.iter().map(String::as_str).collect();
            registry.register(&extra.name, &aliases, true);
        }
        registry
    }

    /// Registers a command. Re-registering a name updates it in place.
    pub fn register(&mut self, name: &str, aliases: &[&str], disablable: bool) -> &mut Self {
        let name = clean_name(name);
        let aliases: Vec<String> = aliases.iter().map(|alias| clean_name(alias)).collect();

        let index = match self.lookup.get(&name) {
            Some(&index) if self.commands[index].name == name => {
                let spec = &mut self.commands[index];
                spec.disablable = disablable;
                for alias in &aliases {
                    if !spec.aliases.contains(alias) {
                        spec.aliases.push(alias.clone());
                    }
                }
                index
            }
            _ => {
                self.commands.push(CommandSpec {
                    name: name.clone(),
                    aliases: aliases.clone(),
                    disablable,
                });
                self.commands.len() - 1
            }
        };

        for key in std::iter::once(name.clone()).chain(aliases) {
            if let Some(previous) = self.lookup.insert(key.clone(), index) {
                if previous != index {
                    warn!(
                        name = %key,
                        previous = %self.commands[previous].name,
                        now = %name,
                        "Command name re-pointed to another command"
                    );
                }
            }
        }

        debug!(command = %name, disablable, "Registered command");
        self
    }

    /// Canonical form of a user-supplied command name.
    ///
    /// Lowercases, strips one leading `/` or `!`, then resolves aliases.
    /// Unknown names come back cleaned but otherwise unchanged.
    pub fn canonicalize(&self, raw: &str) -> String {
        let cleaned = clean_name(raw);
        match self.lookup.get(&cleaned) {
            Some(&index) => self.commands[index].name.clone(),
            None => cleaned,
        }
    }

    /// The registered command `raw` refers to, by name or alias.
    pub fn get(&self, raw: &str) -> Option<&CommandSpec> {
        self.lookup
            .get(&clean_name(raw))
            .map(|&index| &self.commands[index])
    }

    /// Whether the canonical name belongs to a disablable command.
    pub fn is_disablable(&self, canonical: &str) -> bool {
        self.get(canonical)
            .is_some_and(|spec| spec.name == canonical && spec.disablable)
    }

    /// Canonical names of disablable commands in registration order.
    pub fn disablable(&self) -> impl Iterator<Item = &str> {
        self.commands
            .iter()
            .filter(|spec| spec.disablable)
            .map(|spec| spec.name.as_str())
    }

    /// All registered commands in registration order.
    pub fn commands(&self) -> &[CommandSpec] {
        &self.commands
    }
}

fn clean_name(raw: &str) -> String {
    let trimmed = raw.trim();
    let stripped = trimmed
        .strip_prefix('/')
        .or_else(|| trimmed.strip_prefix('!'))
        .unwrap_or(trimmed);
    stripped.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use modgate_config::DisablableCommand;

    #[test]
    fn test_canonicalize_strips_prefix_and_case() {
        let registry = CommandRegistry::with_builtin();
        assert_eq!(registry.canonicalize("/Disabled"), "disabled");
        assert_eq!(registry.canonicalize("!DISABLABLE"), "disableable");
        assert_eq!(registry.canonicalize("stban"), "ban");
        assert_eq!(registry.canonicalize("/unknown"), "unknown");
    }

    #[test]
    fn test_only_marked_commands_are_disablable() {
        let registry = CommandRegistry::with_builtin();
        assert!(registry.is_disablable("disabled"));
        assert!(registry.is_disablable("disableable"));
        assert!(!registry.is_disablable("disablable"));
        assert!(!registry.is_disablable("ban"));
        assert_eq!(
            registry.disablable().collect::<Vec<_>>(),
            vec!["disableable", "disabled"]
        );
    }

    #[test]
    fn test_config_extras() {
        let config = ModerationConfig {
            disablable: vec![DisablableCommand {
                name: "Rules".into(),
                aliases: vec!["/regeln".into()],
            }],
            ..ModerationConfig::default()
        };
        let registry = CommandRegistry::from_config(&config);

        assert!(registry.is_disablable("rules"));
        assert_eq!(registry.canonicalize("regeln"), "rules");
        assert_eq!(registry.disablable().count(), 3);
    }

    #[test]
    fn test_reregistering_merges_aliases() {
        let mut registry = CommandRegistry::new();
        registry.register("notes", &["saved"], false);
        registry.register("notes", &["notes2"], true);

        let spec = registry.get("notes2").unwrap();
        assert_eq!(spec.aliases, vec!["saved", "notes2"]);
        assert!(spec.disablable);
        assert_eq!(registry.commands().len(), 1);
    }
}
