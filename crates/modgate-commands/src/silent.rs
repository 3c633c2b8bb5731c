//! Silent actions: leave-notice suppression and deferred message cleanup.
//!
//! A silent restriction writes a marker `chat -> user` that lives for a short
//! TTL. When the platform reports that the bot removed that user from that
//! chat while the marker is alive, the departure notice is deleted. The
//! marker is never removed explicitly; it expires on its own, so a repeated
//! leave event inside the window is simply suppressed again.
//!
//! There is one marker slot per chat. Two silent actions on the same chat
//! inside the TTL race, and the later one wins.

use async_trait::async_trait;
use modgate_common::{ChatBackend, ChatId, MembershipEvent, MessageId, UserId};
use moka::future::Cache;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Upper bound on chats with a live marker at the same time.
const MARKER_CAPACITY: u64 = 10_000;

/// Short-lived `chat -> user` slots.
#[async_trait]
pub trait SilentMarkerStore: Send + Sync {
    /// Writes the chat's marker, replacing any live one.
    async fn set(&self, chat_id: ChatId, user_id: UserId);

    /// Live marker for the chat, if any.
    async fn get(&self, chat_id: ChatId) -> Option<UserId>;
}

/// Marker store on a moka cache with time-to-live.
#[derive(Clone)]
pub struct MokaMarkerStore {
    cache: Cache<ChatId, UserId>,
    ttl: Duration,
}

impl fmt::Debug for MokaMarkerStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MokaMarkerStore")
            .field("ttl", &self.ttl)
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl MokaMarkerStore {
    /// Creates a store whose markers expire `ttl` after being written.
    pub fn new(ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(MARKER_CAPACITY)
            .time_to_live(ttl)
            .build();
        Self { cache, ttl }
    }

    /// Marker lifetime.
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[async_trait]
impl SilentMarkerStore for MokaMarkerStore {
    async fn set(&self, chat_id: ChatId, user_id: UserId) {
        self.cache.insert(chat_id, user_id).await;
    }

    async fn get(&self, chat_id: ChatId) -> Option<UserId> {
        self.cache.get(&chat_id).await
    }
}

/// What [`SilentCoordinator::on_member_left_event`] did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The bot did not cause the departure.
    NotBotAction,
    /// No live marker for the chat.
    NoMarker,
    /// The live marker names someone else.
    OtherUserMarked(UserId),
    /// The marker matched but the platform posted no notice to delete.
    NoNotice,
    /// The departure notice was deleted.
    Suppressed,
    /// The notice should have been deleted but the backend refused.
    SuppressionFailed,
}

/// Owns the marker store and the deferred cleanup of silent actions.
#[derive(Clone)]
pub struct SilentCoordinator {
    backend: Arc<dyn ChatBackend>,
    markers: Arc<dyn SilentMarkerStore>,
    cleanup_delay: Duration,
}

impl fmt::Debug for SilentCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SilentCoordinator")
            .field("cleanup_delay", &self.cleanup_delay)
            .finish_non_exhaustive()
    }
}

impl SilentCoordinator {
    /// Creates a coordinator deleting messages `cleanup_delay` after a silent action.
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        markers: Arc<dyn SilentMarkerStore>,
        cleanup_delay: Duration,
    ) -> Self {
        Self {
            backend,
            markers,
            cleanup_delay,
        }
    }

    /// Delay before scheduled deletions run.
    pub const fn cleanup_delay(&self) -> Duration {
        self.cleanup_delay
    }

    /// Expects `user_id` to be removed from `chat_id` by the bot shortly.
    pub async fn mark_silent(&self, chat_id: ChatId, user_id: UserId) {
        if let Some(previous) = self.markers.get(chat_id).await {
            if previous != user_id {
                debug!(%chat_id, %previous, %user_id, "Replacing live silent marker");
            }
        }
        self.markers.set(chat_id, user_id).await;
        debug!(%chat_id, %user_id, "Silent marker set");
    }

    /// Deletes `message_ids` once after the cleanup delay.
    ///
    /// The returned handle may be dropped; the deletion still happens.
    /// Failures are logged and otherwise ignored.
    pub fn schedule_cleanup(&self, chat_id: ChatId, message_ids: Vec<MessageId>) -> JoinHandle<()> {
        let backend = Arc::clone(&self.backend);
        let delay = self.cleanup_delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match backend.delete_messages(chat_id, &message_ids).await {
                Ok(()) => debug!(%chat_id, count = message_ids.len(), "Silent action messages deleted"),
                Err(e) => warn!(%chat_id, error = %e, "Failed to delete silent action messages"),
            }
        })
    }

    /// Deletes the departure notice if the bot removed a user it was told to expect.
    pub async fn on_member_left_event(&self, event: &MembershipEvent) -> LeaveOutcome {
        if event.actor_id != self.backend.bot_id() {
            return LeaveOutcome::NotBotAction;
        }

        match self.markers.get(event.chat_id).await {
            None => LeaveOutcome::NoMarker,
            Some(marked) if marked != event.user_id => LeaveOutcome::OtherUserMarked(marked),
            Some(_) => {
                let Some(notice) = event.notice_message_id else {
                    debug!(chat_id = %event.chat_id, user_id = %event.user_id, "Departure posted no notice");
                    return LeaveOutcome::NoNotice;
                };
                match self.backend.delete_messages(event.chat_id, &[notice]).await {
                    Ok(()) => {
                        info!(chat_id = %event.chat_id, user_id = %event.user_id, "Leave notice suppressed");
                        LeaveOutcome::Suppressed
                    }
                    Err(e) => {
                        warn!(chat_id = %event.chat_id, error = %e, "Failed to delete leave notice");
                        LeaveOutcome::SuppressionFailed
                    }
                }
            }
        }
    }

    /// Feeds membership events into [`SilentCoordinator::on_member_left_event`]
    /// until the sender side closes.
    pub fn spawn_listener(self: Arc<Self>, mut events: mpsc::Receiver<MembershipEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Membership event listener started");
            while let Some(event) = events.recv().await {
                let outcome = self.on_member_left_event(&event).await;
                debug!(?event, ?outcome, "Membership event handled");
            }
            info!("Membership event listener stopped");
        })
    }
}
