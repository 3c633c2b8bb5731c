//! Test utilities and shared test helpers for modgate.
//!
//! The centrepiece is [`MemoryBackend`], a [`ChatBackend`] that records
//! every call instead of talking to a platform, with switches to make
//! mutations or deletions fail.

use crate::backend::{BackendError, BackendResult, ChatBackend, MembershipEvent, OutgoingMessage};
use crate::types::{ChatId, MessageId, Timestamp, UserId};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, Once};
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize test logging once per test run.
static INIT: Once = Once::new();

/// Initialize logging for tests with a sensible default configuration.
/// This function is safe to call multiple times and will only initialize once.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        let _ = fmt().with_test_writer().with_env_filter(filter).try_init();
    });
}

/// Test fixture for creating a fixed timestamp.
pub fn mock_timestamp(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Timestamp {
    Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
        .unwrap()
}

/// Create a temporary directory for tests that automatically cleans up.
#[cfg(feature = "tempfile")]
pub fn create_temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Well-known identities used across the test suites.
pub mod fixtures {
    use crate::{ChatId, MessageId, UserId};

    /// The bot account.
    pub const BOT: UserId = UserId(1);
    /// Admin issuing commands.
    pub const ADMIN: UserId = UserId(10);
    /// Another admin of the chat.
    pub const CO_ADMIN: UserId = UserId(11);
    /// Regular member, usual restriction target.
    pub const MEMBER: UserId = UserId(20);
    /// Chat commands are issued in.
    pub const CHAT: ChatId = ChatId(1);
    /// Id of the message carrying the command.
    pub const COMMAND_MESSAGE: MessageId = MessageId(500);
}

/// A call observed by [`MemoryBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    /// `kick`
    Kick(ChatId, UserId),
    /// `mute`
    Mute(ChatId, UserId, Option<Timestamp>),
    /// `unmute`
    Unmute(ChatId, UserId),
    /// `ban`
    Ban(ChatId, UserId, Option<Timestamp>),
    /// `unban`
    Unban(ChatId, UserId),
    /// `delete_messages`
    Delete(ChatId, Vec<MessageId>),
}

#[derive(Debug, Default)]
struct MemoryState {
    admins: HashSet<(ChatId, UserId)>,
    calls: Vec<BackendCall>,
    sent: Vec<(ChatId, MessageId, OutgoingMessage)>,
    edited: Vec<(ChatId, MessageId, String)>,
    deleted: Vec<(ChatId, MessageId)>,
}

/// In-memory [`ChatBackend`] recording every call.
#[derive(Debug)]
pub struct MemoryBackend {
    bot_id: UserId,
    state: Mutex<MemoryState>,
    next_message_id: AtomicU64,
    fail_mutations: AtomicBool,
    fail_deletes: AtomicBool,
}

impl MemoryBackend {
    /// Creates a backend whose bot account is `bot_id`.
    pub fn new(bot_id: UserId) -> Self {
        Self {
            bot_id,
            state: Mutex::new(MemoryState::default()),
            next_message_id: AtomicU64::new(1000),
            fail_mutations: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
        }
    }

    /// Marks `user_id` as an admin of `chat_id`.
    pub fn with_admin(self, chat_id: ChatId, user_id: UserId) -> Self {
        self.state().admins.insert((chat_id, user_id));
        self
    }

    /// Makes every membership mutation fail.
    pub fn fail_mutations(&self, fail: bool) {
        self.fail_mutations.store(fail, Ordering::SeqCst);
    }

    /// Makes every deletion fail.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Membership and deletion calls in order.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.state().calls.clone()
    }

    /// Messages sent so far.
    pub fn sent(&self) -> Vec<(ChatId, MessageId, OutgoingMessage)> {
        self.state().sent.clone()
    }

    /// Text of the most recent message sent.
    pub fn last_text(&self) -> Option<String> {
        self.state().sent.last().map(|(_, _, message)| message.text.clone())
    }

    /// Edits applied so far.
    pub fn edited(&self) -> Vec<(ChatId, MessageId, String)> {
        self.state().edited.clone()
    }

    /// Messages successfully deleted so far.
    pub fn deleted(&self) -> Vec<(ChatId, MessageId)> {
        self.state().deleted.clone()
    }

    /// Simulates the platform noticing that `user_id` left `chat_id` because of `actor_id`.
    pub fn leave_event(&self, chat_id: ChatId, user_id: UserId, actor_id: UserId) -> MembershipEvent {
        MembershipEvent {
            chat_id,
            user_id,
            actor_id,
            notice_message_id: Some(self.allocate_message_id()),
        }
    }

    fn allocate_message_id(&self) -> MessageId {
        MessageId(self.next_message_id.fetch_add(1, Ordering::SeqCst))
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().expect("memory backend state poisoned")
    }

    fn mutate(&self, call: BackendCall) -> BackendResult<()> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(BackendError::platform(format!("simulated failure for {call:?}")));
        }
        self.state().calls.push(call);
        Ok(())
    }
}

#[async_trait]
impl ChatBackend for MemoryBackend {
    fn bot_id(&self) -> UserId {
        self.bot_id
    }

    async fn kick(&self, chat_id: ChatId, user_id: UserId) -> BackendResult<()> {
        self.mutate(BackendCall::Kick(chat_id, user_id))
    }

    async fn mute(&self, chat_id: ChatId, user_id: UserId, until: Option<Timestamp>) -> BackendResult<()> {
        self.mutate(BackendCall::Mute(chat_id, user_id, until))
    }

    async fn unmute(&self, chat_id: ChatId, user_id: UserId) -> BackendResult<()> {
        self.mutate(BackendCall::Unmute(chat_id, user_id))
    }

    async fn ban(&self, chat_id: ChatId, user_id: UserId, until: Option<Timestamp>) -> BackendResult<()> {
        self.mutate(BackendCall::Ban(chat_id, user_id, until))
    }

    async fn unban(&self, chat_id: ChatId, user_id: UserId) -> BackendResult<()> {
        self.mutate(BackendCall::Unban(chat_id, user_id))
    }

    async fn delete_messages(&self, chat_id: ChatId, message_ids: &[MessageId]) -> BackendResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(BackendError::platform("simulated delete failure"));
        }
        let mut state = self.state();
        state.calls.push(BackendCall::Delete(chat_id, message_ids.to_vec()));
        state
            .deleted
            .extend(message_ids.iter().map(|message_id| (chat_id, *message_id)));
        Ok(())
    }

    async fn is_admin(&self, chat_id: ChatId, user_id: UserId) -> BackendResult<bool> {
        Ok(self.state().admins.contains(&(chat_id, user_id)))
    }

    async fn send_message(&self, chat_id: ChatId, message: OutgoingMessage) -> BackendResult<MessageId> {
        let message_id = self.allocate_message_id();
        self.state().sent.push((chat_id, message_id, message));
        Ok(message_id)
    }

    async fn edit_message(&self, chat_id: ChatId, message_id: MessageId, text: String) -> BackendResult<()> {
        self.state().edited.push((chat_id, message_id, text));
        Ok(())
    }

    async fn chat_title(&self, chat_id: ChatId) -> BackendResult<String> {
        Ok(format!("Test Chat {chat_id}"))
    }

    fn user_link(&self, user_id: UserId) -> String {
        format!("@user{user_id}")
    }
}

/// Property-based testing utilities using proptest.
#[cfg(feature = "proptest")]
pub mod property_testing {
    use crate::{ChatId, UserId};
    use proptest::prelude::*;

    /// Strategy for chat ids.
    pub fn chat_id_strategy() -> impl Strategy<Value = ChatId> {
        (1u64..=u64::from(u32::MAX)).prop_map(ChatId)
    }

    /// Strategy for user ids that never collide with the fixture identities.
    pub fn user_id_strategy() -> impl Strategy<Value = UserId> {
        (1000u64..=999_999_999u64).prop_map(UserId)
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_init_logging_multiple_calls() {
        init_test_logging();
        init_test_logging();
    }

    #[test]
    fn test_mock_timestamp() {
        let timestamp = mock_timestamp(2024, 1, 1, 12, 0, 0);
        assert_eq!(timestamp.year(), 2024);
        assert_eq!(timestamp.hour(), 12);
    }

    #[tokio::test]
    async fn test_memory_backend_records_calls() {
        let backend = MemoryBackend::new(BOT).with_admin(CHAT, ADMIN);

        assert!(backend.is_admin(CHAT, ADMIN).await.unwrap());
        assert!(!backend.is_admin(CHAT, MEMBER).await.unwrap());

        backend.kick(CHAT, MEMBER).await.unwrap();
        backend.delete_messages(CHAT, &[MessageId(1), MessageId(2)]).await.unwrap();

        assert_eq!(
            backend.calls(),
            vec![
                BackendCall::Kick(CHAT, MEMBER),
                BackendCall::Delete(CHAT, vec![MessageId(1), MessageId(2)]),
            ]
        );
        assert_eq!(backend.deleted().len(), 2);
    }

    #[tokio::test]
    async fn test_memory_backend_failure_switches() {
        let backend = MemoryBackend::new(BOT);
        backend.fail_mutations(true);
        assert!(backend.ban(CHAT, MEMBER, None).await.is_err());
        assert!(backend.calls().is_empty());

        backend.fail_deletes(true);
        assert!(backend.delete_messages(CHAT, &[MessageId(1)]).await.is_err());
        assert!(backend.deleted().is_empty());
    }

    #[tokio::test]
    async fn test_sent_messages_get_fresh_ids() {
        let backend = MemoryBackend::new(BOT);
        let first = backend.send_message(CHAT, OutgoingMessage::text("a")).await.unwrap();
        let second = backend.send_message(CHAT, OutgoingMessage::text("b")).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(backend.last_text().as_deref(), Some("b"));
    }
}
