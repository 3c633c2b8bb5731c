//! Contract between the moderation core and the chat platform.
//!
//! The core never talks to a platform SDK directly. Everything it needs from
//! the platform (membership mutations, message deletion, admin lookups,
//! replies) goes through [`ChatBackend`]. Membership changes observed by the
//! platform flow back as [`MembershipEvent`]s over a channel.

use crate::types::{ChatId, MessageId, Timestamp, UserId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for chat platform calls.
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Failure reported by the chat platform.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The chat is unknown to the platform or the bot is not a member.
    #[error("chat {0} is not available to the bot")]
    ChatUnavailable(ChatId),

    /// The bot lacks the rights needed for the call.
    #[error("missing platform permission: {0}")]
    MissingPermission(String),

    /// The platform cannot express the requested restriction.
    #[error("unsupported restriction: {0}")]
    Unsupported(String),

    /// Any other platform failure.
    #[error("platform error: {message}")]
    Platform {
        /// What the bot was doing.
        message: String,
        /// SDK error, when there is one.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl BackendError {
    /// Create a platform error without an underlying cause.
    pub fn platform(msg: impl Into<String>) -> Self {
        Self::Platform {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a platform error wrapping the SDK error.
    pub fn platform_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Platform {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Inline button attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    /// Visible label.
    pub label: String,
    /// Opaque payload delivered back when the button is pressed.
    pub callback: String,
}

impl Button {
    /// Creates a button.
    pub fn new(label: impl Into<String>, callback: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            callback: callback.into(),
        }
    }
}

/// A message the core asks the platform to post.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OutgoingMessage {
    /// Rendered text.
    pub text: String,
    /// Message this one replies to, if any.
    pub reply_to: Option<MessageId>,
    /// Buttons rendered under the message.
    pub buttons: Vec<Button>,
}

impl OutgoingMessage {
    /// A plain message.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Sets the message being replied to.
    #[must_use]
    pub const fn reply_to(mut self, message_id: MessageId) -> Self {
        self.reply_to = Some(message_id);
        self
    }

    /// Appends a button.
    #[must_use]
    pub fn button(mut self, button: Button) -> Self {
        self.buttons.push(button);
        self
    }
}

/// A user left or was removed from a chat.
///
/// `notice_message_id` is the system message the platform posted about the
/// departure, if it posts one; deleting it hides the departure from the chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipEvent {
    /// Chat the user left.
    pub chat_id: ChatId,
    /// User who left.
    pub user_id: UserId,
    /// User who caused the departure (the user themselves for voluntary leaves).
    pub actor_id: UserId,
    /// Platform notice about the departure, absent when none was posted.
    pub notice_message_id: Option<MessageId>,
}

/// Chat platform operations consumed by the moderation core.
///
/// Mutations are not retried; a failure is returned to the caller as-is.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Identity of the bot account.
    fn bot_id(&self) -> UserId;

    /// Removes a user while leaving them free to rejoin.
    async fn kick(&self, chat_id: ChatId, user_id: UserId) -> BackendResult<()>;

    /// Revokes the user's ability to send messages, permanently when `until` is `None`.
    async fn mute(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        until: Option<Timestamp>,
    ) -> BackendResult<()>;

    /// Restores default send-message rights.
    async fn unmute(&self, chat_id: ChatId, user_id: UserId) -> BackendResult<()>;

    /// Removes the user and blocks rejoining, lifted automatically at `until` if given.
    async fn ban(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        until: Option<Timestamp>,
    ) -> BackendResult<()>;

    /// Lifts a ban.
    async fn unban(&self, chat_id: ChatId, user_id: UserId) -> BackendResult<()>;

    /// Deletes messages. Messages that are already gone are not an error.
    async fn delete_messages(&self, chat_id: ChatId, message_ids: &[MessageId])
        -> BackendResult<()>;

    /// Whether the user administers the chat.
    async fn is_admin(&self, chat_id: ChatId, user_id: UserId) -> BackendResult<bool>;

    /// Posts a message and returns its id.
    async fn send_message(
        &self,
        chat_id: ChatId,
        message: OutgoingMessage,
    ) -> BackendResult<MessageId>;

    /// Replaces a sent message's text and removes its buttons.
    async fn edit_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: String,
    ) -> BackendResult<()>;

    /// Human-readable chat name.
    async fn chat_title(&self, chat_id: ChatId) -> BackendResult<String>;

    /// Markup that renders as a link or mention of the user.
    fn user_link(&self, user_id: UserId) -> String;
}
