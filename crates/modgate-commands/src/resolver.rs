//! Target resolution from command arguments or the replied-to message

use crate::error::{CommandError, CommandResult};
use async_trait::async_trait;
use modgate_common::{split_first_token, ChatId, MessageId, UserId};

/// The message a command was sent in reply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyContext {
    /// Id of the replied-to message.
    pub message_id: MessageId,
    /// Author of the replied-to message.
    pub author_id: UserId,
}

/// Who a restriction command is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// The target user.
    pub user_id: UserId,
    /// Whether the first argument token named the target and is used up.
    pub consumed_token: bool,
}

impl ResolvedTarget {
    /// Target named by the first argument token.
    pub const fn from_argument(user_id: UserId) -> Self {
        Self {
            user_id,
            consumed_token: true,
        }
    }

    /// Target taken from the replied-to message.
    pub const fn from_reply(user_id: UserId) -> Self {
        Self {
            user_id,
            consumed_token: false,
        }
    }
}

/// Turns raw arguments and reply context into a target user.
///
/// A reply always wins over arguments; otherwise the first argument token
/// must identify the user.
#[async_trait]
pub trait TargetResolver: Send + Sync {
    /// Resolves the target or fails with `MissingTarget`, `UserNotFound` or `AmbiguousTarget`.
    async fn resolve(
        &self,
        chat_id: ChatId,
        args: &str,
        reply: Option<&ReplyContext>,
    ) -> CommandResult<ResolvedTarget>;
}

/// Parses a user reference: `<@123>`, `<@!123>`, `@123` or a bare id.
pub fn parse_user_reference(token: &str) -> Option<UserId> {
    let inner = token
        .strip_prefix("<@")
        .and_then(|rest| rest.strip_suffix('>'))
        .map(|rest| rest.strip_prefix('!').unwrap_or(rest))
        .or_else(|| token.strip_prefix('@'))
        .unwrap_or(token);

    if inner.is_empty() || !inner.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    inner.parse::<u64>().ok().filter(|&id| id != 0).map(UserId)
}

/// Resolver that only understands mentions and numeric ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct MentionResolver;

#[async_trait]
impl TargetResolver for MentionResolver {
    async fn resolve(
        &self,
        _chat_id: ChatId,
        args: &str,
        reply: Option<&ReplyContext>,
    ) -> CommandResult<ResolvedTarget> {
        if let Some(reply) = reply {
            return Ok(ResolvedTarget::from_reply(reply.author_id));
        }

        let (token, _) = split_first_token(args).ok_or(CommandError::MissingTarget)?;
        parse_user_reference(token)
            .map(ResolvedTarget::from_argument)
            .ok_or_else(|| CommandError::UserNotFound {
                query: token.to_string(),
            })
    }
}
