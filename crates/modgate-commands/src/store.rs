//! Persistent storage of disabled command sets
//!
//! Every operation on [`DisabledCommandStore`] is a single atomic step on one
//! chat's set, so concurrent `disable`/`enable` calls on the same chat never
//! lose updates.

use async_trait::async_trait;
use dashmap::DashMap;
use modgate_common::{ChatId, ModgateError, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Name of the sled tree holding disabled command sets.
pub const DISABLED_COMMANDS_TREE: &str = "disabled_commands";

/// Per-chat ordered sets of disabled command names.
///
/// A chat with nothing disabled has no entry at all.
#[async_trait]
pub trait DisabledCommandStore: Send + Sync {
    /// Adds `command`; `false` when it was already present.
    async fn insert(&self, chat_id: ChatId, command: &str) -> Result<bool>;

    /// Removes `command`; `false` when it was absent.
    async fn remove(&self, chat_id: ChatId, command: &str) -> Result<bool>;

    /// Drops the chat's whole set and returns what it held.
    async fn take_all(&self, chat_id: ChatId) -> Result<Vec<String>>;

    /// Whether `command` is in the chat's set.
    async fn contains(&self, chat_id: ChatId, command: &str) -> Result<bool>;

    /// The chat's set in insertion order.
    async fn list(&self, chat_id: ChatId) -> Result<Vec<String>>;
}

/// sled-backed store; one key per chat holding a JSON array.
#[derive(Debug, Clone)]
pub struct SledDisabledStore {
    /// Keeps the database open for as long as the tree is in use
    _db: Arc<sled::Db>,
    tree: sled::Tree,
}

impl SledDisabledStore {
    /// Opens (or creates) the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        info!("Opening disabled command store at: {:?}", path.as_ref());

        let db = sled::Config::default()
            .path(path.as_ref())
            .cache_capacity(16 * 1024 * 1024)
            .flush_every_ms(Some(1000))
            .open()
            .map_err(|e| {
                ModgateError::database_with_source(
                    format!("Failed to open database at {:?}", path.as_ref()),
                    e,
                )
            })?;

        Self::from_db(db)
    }

    /// Uses an already opened database.
    pub fn from_db(db: sled::Db) -> Result<Self> {
        let tree = db.open_tree(DISABLED_COMMANDS_TREE).map_err(|e| {
            ModgateError::database_with_source("Failed to open disabled commands tree", e)
        })?;

        Ok(Self {
            _db: Arc::new(db),
            tree,
        })
    }

    fn read(&self, chat_id: ChatId) -> Result<Vec<String>> {
        match self
            .tree
            .get(chat_id.get().to_be_bytes())
            .map_err(|e| ModgateError::database_with_source("Failed to read disabled commands", e))?
        {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    /// Applies `change` to the chat's set with compare-and-swap, retrying on
    /// concurrent writes. An emptied set removes the key.
    fn update<T>(&self, chat_id: ChatId, mut change: impl FnMut(&mut Vec<String>) -> T) -> Result<T> {
        let key = chat_id.get().to_be_bytes();

        loop {
            let current = self
                .tree
                .get(key)
                .map_err(|e| ModgateError::database_with_source("Failed to read disabled commands", e))?;

            let mut commands: Vec<String> = match &current {
                Some(bytes) => serde_json::from_slice(bytes)?,
                None => Vec::new(),
            };
            let outcome = change(&mut commands);

            let replacement = if commands.is_empty() {
                None
            } else {
                Some(serde_json::to_vec(&commands)?)
            };

            let swapped = self
                .tree
                .compare_and_swap(key, current, replacement)
                .map_err(|e| ModgateError::database_with_source("Failed to write disabled commands", e))?;

            match swapped {
                Ok(()) => return Ok(outcome),
                Err(_) => debug!(%chat_id, "Concurrent update of disabled commands, retrying"),
            }
        }
    }

    async fn flush(&self) -> Result<()> {
        self.tree
            .flush_async()
            .await
            .map_err(|e| ModgateError::database_with_source("Failed to flush disabled commands", e))?;
        Ok(())
    }
}

#[async_trait]
impl DisabledCommandStore for SledDisabledStore {
    async fn insert(&self, chat_id: ChatId, command: &str) -> Result<bool> {
        let inserted = self.update(chat_id, |commands| {
            if commands.iter().any(|c| c == command) {
                false
            } else {
                commands.push(command.to_string());
                true
            }
        })?;
        if inserted {
            self.flush().await?;
        }
        Ok(inserted)
    }

    async fn remove(&self, chat_id: ChatId, command: &str) -> Result<bool> {
        let removed = self.update(chat_id, |commands| {
            let before = commands.len();
            commands.retain(|c| c != command);
            commands.len() != before
        })?;
        if removed {
            self.flush().await?;
        }
        Ok(removed)
    }

    async fn take_all(&self, chat_id: ChatId) -> Result<Vec<String>> {
        let taken = self.update(chat_id, std::mem::take)?;
        if !taken.is_empty() {
            self.flush().await?;
        }
        Ok(taken)
    }

    async fn contains(&self, chat_id: ChatId, command: &str) -> Result<bool> {
        Ok(self.read(chat_id)?.iter().any(|c| c == command))
    }

    async fn list(&self, chat_id: ChatId) -> Result<Vec<String>> {
        self.read(chat_id)
    }
}

/// In-memory store for tests and deployments without persistence.
#[derive(Debug, Default)]
pub struct MemoryDisabledStore {
    chats: DashMap<ChatId, Vec<String>>,
}

impl MemoryDisabledStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of chats with at least one disabled command.
    pub fn chat_count(&self) -> usize {
        self.chats.len()
    }
}

#[async_trait]
impl DisabledCommandStore for MemoryDisabledStore {
    async fn insert(&self, chat_id: ChatId, command: &str) -> Result<bool> {
        let mut commands = self.chats.entry(chat_id).or_default();
        if commands.iter().any(|c| c == command) {
            return Ok(false);
        }
        commands.push(command.to_string());
        Ok(true)
    }

    async fn remove(&self, chat_id: ChatId, command: &str) -> Result<bool> {
        let mut removed = false;
        self.chats.remove_if_mut(&chat_id, |_, commands| {
            let before = commands.len();
            commands.retain(|c| c != command);
            removed = commands.len() != before;
            commands.is_empty()
        });
        Ok(removed)
    }

    async fn take_all(&self, chat_id: ChatId) -> Result<Vec<String>> {
        Ok(self
            .chats
            .remove(&chat_id)
            .map(|(_, commands)| commands)
            .unwrap_or_default())
    }

    async fn contains(&self, chat_id: ChatId, command: &str) -> Result<bool> {
        Ok(self
            .chats
            .get(&chat_id)
            .is_some_and(|commands| commands.iter().any(|c| c == command)))
    }

    async fn list(&self, chat_id: ChatId) -> Result<Vec<String>> {
        Ok(self
            .chats
            .get(&chat_id)
            .map(|commands| commands.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modgate_common::test_utils::create_temp_dir;

    async fn exercise(store: &dyn DisabledCommandStore) {
        let chat = ChatId(7);

        assert!(store.insert(chat, "rules").await.unwrap());
        assert!(store.insert(chat, "notes").await.unwrap());
        assert!(!store.insert(chat, "rules").await.unwrap());
        assert_eq!(store.list(chat).await.unwrap(), vec!["rules", "notes"]);
        assert!(store.contains(chat, "notes").await.unwrap());

        assert!(store.remove(chat, "rules").await.unwrap());
        assert!(!store.remove(chat, "rules").await.unwrap());
        assert!(!store.contains(chat, "rules").await.unwrap());

        assert_eq!(store.take_all(chat).await.unwrap(), vec!["notes"]);
        assert!(store.take_all(chat).await.unwrap().is_empty());
        assert!(store.list(chat).await.unwrap().is_empty());
        assert!(store.list(ChatId(8)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryDisabledStore::new();
        exercise(&store).await;
        assert_eq!(store.chat_count(), 0);
    }

    #[tokio::test]
    async fn test_sled_store() {
        let dir = create_temp_dir();
        let store = SledDisabledStore::open(dir.path().join("db")).unwrap();
        exercise(&store).await;
    }

    #[tokio::test]
    async fn test_sled_store_removes_empty_sets() {
        let dir = create_temp_dir();
        let store = SledDisabledStore::open(dir.path().join("db")).unwrap();
        let chat = ChatId(9);

        store.insert(chat, "rules").await.unwrap();
        store.remove(chat, "rules").await.unwrap();

        assert!(store.tree.is_empty());
    }

    #[tokio::test]
    async fn test_sled_store_survives_reopen() {
        let dir = create_temp_dir();
        let path = dir.path().join("db");
        {
            let store = SledDisabledStore::open(&path).unwrap();
            store.insert(ChatId(3), "rules").await.unwrap();
        }
        let store = SledDisabledStore::open(&path).unwrap();
        assert_eq!(store.list(ChatId(3)).await.unwrap(), vec!["rules"]);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_are_not_lost() {
        let dir = create_temp_dir();
        let store = Arc::new(SledDisabledStore::open(dir.path().join("db")).unwrap());
        let chat = ChatId(11);

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.insert(chat, &format!("cmd{i}")).await })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap().unwrap());
        }

        assert_eq!(store.list(chat).await.unwrap().len(), 16);
    }
}
