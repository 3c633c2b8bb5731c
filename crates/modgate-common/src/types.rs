//! Common type definitions and newtype wrappers for domain modeling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Point in time used for restriction expiry.
pub type Timestamp = DateTime<Utc>;

macro_rules! snowflake_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Returns the raw numeric value.
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for u64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

snowflake_id!(
    /// A chat (group, channel) in which commands are issued.
    ChatId
);

snowflake_id!(
    /// A user known to the chat platform. The bot itself is a user too.
    UserId
);

snowflake_id!(
    /// A message inside a chat.
    MessageId
);

/// A user inside a specific chat, the subject of a restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RestrictionTarget {
    /// Chat the restriction applies to.
    pub chat_id: ChatId,
    /// User being restricted.
    pub user_id: UserId,
}

impl RestrictionTarget {
    /// Creates a new target.
    pub const fn new(chat_id: ChatId, user_id: UserId) -> Self {
        Self { chat_id, user_id }
    }
}

impl fmt::Display for RestrictionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user {} in chat {}", self.user_id, self.chat_id)
    }
}
