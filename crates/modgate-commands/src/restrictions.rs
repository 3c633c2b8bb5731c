//! Kick, mute and ban against the chat backend.
//!
//! Every mutation takes an [`AuthorizedTarget`], which only
//! [`RestrictionExecutor::authorize`] can produce, so the target checks cannot
//! be skipped.

use crate::error::{CommandError, CommandResult};
use modgate_common::{ChatBackend, RestrictionTarget, Timestamp, UserId};
use std::fmt;
use std::sync::Arc;
use tracing::{info, instrument};

/// A membership restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RestrictionAction {
    /// Remove, free to rejoin.
    Kick,
    /// Revoke send rights.
    Mute,
    /// Restore send rights.
    Unmute,
    /// Remove and block rejoining.
    Ban,
    /// Lift a ban.
    Unban,
}

impl RestrictionAction {
    /// Command name of the plain variant.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Kick => "kick",
            Self::Mute => "mute",
            Self::Unmute => "unmute",
            Self::Ban => "ban",
            Self::Unban => "unban",
        }
    }

    /// Whether an `s` variant exists.
    pub const fn has_silent_variant(self) -> bool {
        matches!(self, Self::Kick | Self::Mute | Self::Ban)
    }

    /// Whether `t` and `st` variants exist.
    pub const fn has_temporal_variant(self) -> bool {
        matches!(self, Self::Mute | Self::Ban)
    }

    /// Key of the confirmation message in the `restrictions` domain.
    pub const fn confirmation_key(self) -> &'static str {
        match self {
            Self::Kick => "user-kicked",
            Self::Mute => "user-muted",
            Self::Unmute => "user-unmuted",
            Self::Ban => "user-banned",
            Self::Unban => "user-unbanned",
        }
    }
}

impl fmt::Display for RestrictionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Proof that a target passed the bot, invoker and admin checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedTarget {
    target: RestrictionTarget,
    action: RestrictionAction,
    invoker: UserId,
}

impl AuthorizedTarget {
    /// Chat and user being restricted.
    pub const fn target(&self) -> RestrictionTarget {
        self.target
    }

    /// Action the checks were run for.
    pub const fn action(&self) -> RestrictionAction {
        self.action
    }

    /// Admin who asked for the action.
    pub const fn invoker(&self) -> UserId {
        self.invoker
    }
}

/// Runs restrictions against a [`ChatBackend`]. Calls are never retried.
#[derive(Clone)]
pub struct RestrictionExecutor {
    backend: Arc<dyn ChatBackend>,
}

impl fmt::Debug for RestrictionExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestrictionExecutor").finish_non_exhaustive()
    }
}

impl RestrictionExecutor {
    /// Creates an executor over `backend`.
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self { backend }
    }

    /// Checks, in order, that the target is not the bot, not the invoker and
    /// not a chat admin. The first failing check decides the error.
    pub async fn authorize(
        &self,
        action: RestrictionAction,
        target: RestrictionTarget,
        invoker: UserId,
    ) -> CommandResult<AuthorizedTarget> {
        if target.user_id == self.backend.bot_id() {
            return Err(CommandError::TargetIsSelf { action });
        }
        if target.user_id == invoker {
            return Err(CommandError::TargetIsInvoker { action });
        }
        if self.backend.is_admin(target.chat_id, target.user_id).await? {
            return Err(CommandError::TargetIsAdmin { action });
        }

        Ok(AuthorizedTarget {
            target,
            action,
            invoker,
        })
    }

    /// Removes the user; they may rejoin.
    #[instrument(skip(self), fields(restriction = %authorized.target))]
    pub async fn kick(&self, authorized: &AuthorizedTarget) -> CommandResult<()> {
        let RestrictionTarget { chat_id, user_id } = authorized.target;
        self.backend.kick(chat_id, user_id).await?;
        info!(invoker = %authorized.invoker, "User kicked");
        Ok(())
    }

    /// Mutes the user until `until`, or permanently.
    #[instrument(skip(self), fields(restriction = %authorized.target))]
    pub async fn mute(
        &self,
        authorized: &AuthorizedTarget,
        until: Option<Timestamp>,
    ) -> CommandResult<()> {
        let RestrictionTarget { chat_id, user_id } = authorized.target;
        self.backend.mute(chat_id, user_id, until).await?;
        info!(invoker = %authorized.invoker, ?until, "User muted");
        Ok(())
    }

    /// Restores the user's send rights.
    #[instrument(skip(self), fields(restriction = %authorized.target))]
    pub async fn unmute(&self, authorized: &AuthorizedTarget) -> CommandResult<()> {
        let RestrictionTarget { chat_id, user_id } = authorized.target;
        self.backend.unmute(chat_id, user_id).await?;
        info!(invoker = %authorized.invoker, "User unmuted");
        Ok(())
    }

    /// Bans the user until `until`, or permanently.
    #[instrument(skip(self), fields(restriction = %authorized.target))]
    pub async fn ban(
        &self,
        authorized: &AuthorizedTarget,
        until: Option<Timestamp>,
    ) -> CommandResult<()> {
        let RestrictionTarget { chat_id, user_id } = authorized.target;
        self.backend.ban(chat_id, user_id, until).await?;
        info!(invoker = %authorized.invoker, ?until, "User banned");
        Ok(())
    }

    /// Lifts the user's ban.
    #[instrument(skip(self), fields(restriction = %authorized.target))]
    pub async fn unban(&self, authorized: &AuthorizedTarget) -> CommandResult<()> {
        let RestrictionTarget { chat_id, user_id } = authorized.target;
        self.backend.unban(chat_id, user_id).await?;
        info!(invoker = %authorized.invoker, "User unbanned");
        Ok(())
    }

    /// Runs the action the target was authorized for.
    ///
    /// `until` is ignored by actions without an expiry.
    pub async fn apply(
        &self,
        authorized: &AuthorizedTarget,
        until: Option<Timestamp>,
    ) -> CommandResult<()> {
        match authorized.action {
            RestrictionAction::Kick => self.kick(authorized).await,
            RestrictionAction::Mute => self.mute(authorized, until).await,
            RestrictionAction::Unmute => self.unmute(authorized).await,
            RestrictionAction::Ban => self.ban(authorized, until).await,
            RestrictionAction::Unban => self.unban(authorized).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modgate_common::test_utils::{fixtures::*, BackendCall, MemoryBackend};

    fn target(user_id: UserId) -> RestrictionTarget {
        RestrictionTarget::new(CHAT, user_id)
    }

    #[tokio::test]
    async fn test_bot_check_wins_even_when_bot_is_admin() {
        let backend = Arc::new(MemoryBackend::new(BOT).with_admin(CHAT, BOT));
        let executor = RestrictionExecutor::new(backend);

        for action in [RestrictionAction::Kick, RestrictionAction::Ban] {
            assert!(matches!(
                executor.authorize(action, target(BOT), ADMIN).await,
                Err(CommandError::TargetIsSelf { action: a }) if a == action
            ));
        }
    }

    #[tokio::test]
    async fn test_invoker_check_precedes_admin_check() {
        let backend = Arc::new(MemoryBackend::new(BOT).with_admin(CHAT, ADMIN));
        let executor = RestrictionExecutor::new(backend);

        assert!(matches!(
            executor.authorize(RestrictionAction::Mute, target(ADMIN), ADMIN).await,
            Err(CommandError::TargetIsInvoker { .. })
        ));
    }

    #[tokio::test]
    async fn test_admin_target_rejected() {
        let backend = Arc::new(
            MemoryBackend::new(BOT)
                .with_admin(CHAT, ADMIN)
                .with_admin(CHAT, CO_ADMIN),
        );
        let executor = RestrictionExecutor::new(backend.clone());

        assert!(matches!(
            executor.authorize(RestrictionAction::Ban, target(CO_ADMIN), ADMIN).await,
            Err(CommandError::TargetIsAdmin { .. })
        ));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_apply_dispatches_to_backend() {
        let backend = Arc::new(MemoryBackend::new(BOT));
        let executor = RestrictionExecutor::new(backend.clone());
        let until = Some(modgate_common::test_utils::mock_timestamp(2030, 1, 1, 0, 0, 0));

        let authorized = executor
            .authorize(RestrictionAction::Ban, target(MEMBER), ADMIN)
            .await
            .unwrap();
        executor.apply(&authorized, until).await.unwrap();

        let authorized = executor
            .authorize(RestrictionAction::Kick, target(MEMBER), ADMIN)
            .await
            .unwrap();
        executor.apply(&authorized, until).await.unwrap();

        assert_eq!(
            backend.calls(),
            vec![
                BackendCall::Ban(CHAT, MEMBER, until),
                BackendCall::Kick(CHAT, MEMBER)
            ]
        );
    }

    #[tokio::test]
    async fn test_backend_failure_propagates() {
        let backend = Arc::new(MemoryBackend::new(BOT));
        backend.fail_mutations(true);
        let executor = RestrictionExecutor::new(backend);

        let authorized = executor
            .authorize(RestrictionAction::Unban, target(MEMBER), ADMIN)
            .await
            .unwrap();
        let error = executor.unban(&authorized).await.unwrap_err();
        assert_eq!(error.kind(), crate::ErrorKind::Backend);
    }
}
