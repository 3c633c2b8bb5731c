//! Discord implementation of the chat backend.
//!
//! A chat is a guild text channel: commands, replies and toggles live in the
//! channel, while kicks, mutes and bans act on the guild that owns it. The
//! owning guild is looked up once per channel and cached.
//!
//! Discord has no "user left" notices to hide, so no membership events are
//! produced here and silent actions only clean up their own messages.
//!
//! Timeouts cannot run past [`MAX_TIMEOUT_DAYS`]. Longer and permanent mutes
//! need the configured muted role; without one they are refused as
//! unsupported before anything changes.

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use dashmap::DashMap;
use modgate_commands::{
    parse_user_reference, CommandError, CommandResult, ReplyContext, ResolvedTarget,
    TargetResolver,
};
use modgate_common::{
    split_first_token, BackendError, BackendResult, ChatBackend, ChatId, MessageId,
    OutgoingMessage, Timestamp, UserId,
};
use modgate_config::DiscordConfig;
use poise::serenity_prelude::{
    self as serenity, ButtonStyle, ChannelId, CreateActionRow, CreateButton, CreateMessage,
    EditMember, EditMessage, GuildId, Permissions, RoleId,
};
use ::serenity::http::{Http, HttpError};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Longest communication timeout Discord accepts.
pub const MAX_TIMEOUT_DAYS: i64 = 28;

/// Channel facts needed to act on its guild.
#[derive(Debug, Clone)]
struct ChannelInfo {
    guild_id: GuildId,
    name: String,
}

/// [`ChatBackend`] over the Discord REST API.
pub struct DiscordBackend {
    http: Arc<Http>,
    bot_id: UserId,
    admin_roles: Vec<RoleId>,
    muted_role: Option<RoleId>,
    channels: DashMap<ChatId, ChannelInfo>,
}

impl fmt::Debug for DiscordBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscordBackend")
            .field("bot_id", &self.bot_id)
            .field("admin_roles", &self.admin_roles)
            .field("muted_role", &self.muted_role)
            .field("cached_channels", &self.channels.len())
            .finish_non_exhaustive()
    }
}

fn channel_id(chat_id: ChatId) -> ChannelId {
    ChannelId::new(chat_id.get())
}

fn user_id(user_id: UserId) -> serenity::UserId {
    serenity::UserId::new(user_id.get())
}

/// HTTP status of a failed REST call.
fn status_of(error: &serenity::Error) -> Option<u16> {
    match error {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => {
            Some(response.status_code.as_u16())
        }
        _ => None,
    }
}

fn backend_error(action: &str, error: serenity::Error) -> BackendError {
    match status_of(&error) {
        Some(403) => BackendError::MissingPermission(action.to_string()),
        _ => BackendError::platform_with_source(format!("{action} failed"), error),
    }
}

/// How a mute is carried out on Discord.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutePlan {
    /// Communication timeout ending at the given instant.
    Timeout(Timestamp),
    /// Muted role, lifted at `until` when set.
    Role {
        role: RoleId,
        until: Option<Timestamp>,
    },
}

/// Picks the mechanism for a mute ending at `until` (`None` is permanent).
pub fn plan_mute(
    now: Timestamp,
    until: Option<Timestamp>,
    muted_role: Option<RoleId>,
) -> BackendResult<MutePlan> {
    match (until, muted_role) {
        (Some(until), _) if until <= now + TimeDelta::days(MAX_TIMEOUT_DAYS) => {
            Ok(MutePlan::Timeout(until))
        }
        (until, Some(role)) => Ok(MutePlan::Role { role, until }),
        (Some(_), None) => Err(BackendError::Unsupported(format!(
            "mutes longer than {MAX_TIMEOUT_DAYS} days need a muted role"
        ))),
        (None, None) => Err(BackendError::Unsupported(
            "permanent mutes need a muted role".to_string(),
        )),
    }
}

/// Runs `delete` for every id and collects the failures.
async fn delete_each<F, Fut>(message_ids: &[MessageId], mut delete: F) -> Vec<(MessageId, BackendError)>
where
    F: FnMut(MessageId) -> Fut,
    Fut: Future<Output = BackendResult<()>>,
{
    let mut failures = Vec::new();
    for &message_id in message_ids {
        if let Err(e) = delete(message_id).await {
            failures.push((message_id, e));
        }
    }
    failures
}

/// Whether a permission set makes its holder a chat admin.
pub fn grants_admin(permissions: Permissions) -> bool {
    permissions.administrator() || permissions.manage_guild()
}

/// Union of the permissions granted by a member's roles and `@everyone`.
pub fn combined_permissions(granted: impl IntoIterator<Item = Permissions>) -> Permissions {
    granted
        .into_iter()
        .fold(Permissions::empty(), |acc, permissions| acc | permissions)
}

impl DiscordBackend {
    /// Creates a backend acting as `bot_id`.
    pub fn new(http: Arc<Http>, bot_id: serenity::UserId, config: &DiscordConfig) -> Self {
        Self {
            http,
            bot_id: UserId(bot_id.get()),
            admin_roles: config.admin_role_ids.iter().map(|&id| RoleId::new(id)).collect(),
            muted_role: config.muted_role_id.map(RoleId::new),
            channels: DashMap::new(),
        }
    }

    fn http(&self) -> &Http {
        &self.http
    }

    async fn channel(&self, chat_id: ChatId) -> BackendResult<ChannelInfo> {
        if let Some(info) = self.channels.get(&chat_id) {
            return Ok(info.clone());
        }

        let channel = self
            .http
            .get_channel(channel_id(chat_id))
            .await
            .map_err(|e| backend_error("channel lookup", e))?;
        let guild_channel = channel
            .guild()
            .ok_or(BackendError::ChatUnavailable(chat_id))?;

        let info = ChannelInfo {
            guild_id: guild_channel.guild_id,
            name: guild_channel.name,
        };
        debug!(%chat_id, guild_id = %info.guild_id, "Cached channel guild");
        self.channels.insert(chat_id, info.clone());
        Ok(info)
    }

    async fn guild_of(&self, chat_id: ChatId) -> BackendResult<GuildId> {
        Ok(self.channel(chat_id).await?.guild_id)
    }

    async fn timeout(&self, guild_id: GuildId, user: UserId, until: Timestamp) -> BackendResult<()> {
        guild_id
            .edit_member(
                self.http(),
                user_id(user),
                EditMember::new().disable_communication_until(until.to_rfc3339()),
            )
            .await
            .map_err(|e| backend_error("timeout", e))?;
        Ok(())
    }

    fn schedule_unban(&self, guild_id: GuildId, user: UserId, until: Timestamp) {
        let delay = (until - Utc::now()).to_std().unwrap_or_default();
        let http = Arc::clone(&self.http);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match guild_id.unban(&*http, user_id(user)).await {
                Ok(()) => info!(%guild_id, %user, "Temporary ban expired"),
                Err(e) => warn!(%guild_id, %user, error = %e, "Failed to lift temporary ban"),
            }
        });
    }

    fn schedule_unmute(&self, guild_id: GuildId, user: UserId, role: RoleId, until: Timestamp) {
        let delay = (until - Utc::now()).to_std().unwrap_or_default();
        let http = Arc::clone(&self.http);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match http
                .remove_member_role(guild_id, user_id(user), role, Some("modgate mute expired"))
                .await
            {
                Ok(()) => info!(%guild_id, %user, "Temporary mute expired"),
                Err(e) => warn!(%guild_id, %user, error = %e, "Failed to lift temporary mute"),
            }
        });
    }

    /// Guild members whose name matches `query`, at most two.
    pub async fn search_members(&self, chat_id: ChatId, query: &str) -> BackendResult<Vec<UserId>> {
        let guild_id = self.guild_of(chat_id).await?;
        let members = guild_id
            .search_members(self.http(), query, Some(2))
            .await
            .map_err(|e| backend_error("member search", e))?;
        Ok(members
            .into_iter()
            .map(|member| UserId(member.user.id.get()))
            .collect())
    }
}

#[async_trait]
impl ChatBackend for DiscordBackend {
    fn bot_id(&self) -> UserId {
        self.bot_id
    }

    async fn kick(&self, chat_id: ChatId, user: UserId) -> BackendResult<()> {
        let guild_id = self.guild_of(chat_id).await?;
        guild_id
            .kick(self.http(), user_id(user))
            .await
            .map_err(|e| backend_error("kick", e))
    }

    async fn mute(&self, chat_id: ChatId, user: UserId, until: Option<Timestamp>) -> BackendResult<()> {
        let plan = plan_mute(Utc::now(), until, self.muted_role)?;
        let guild_id = self.guild_of(chat_id).await?;
        match plan {
            MutePlan::Timeout(until) => self.timeout(guild_id, user, until).await,
            MutePlan::Role { role, until } => {
                self.http
                    .add_member_role(guild_id, user_id(user), role, Some("modgate mute"))
                    .await
                    .map_err(|e| backend_error("mute", e))?;
                if let Some(until) = until {
                    self.schedule_unmute(guild_id, user, role, until);
                }
                Ok(())
            }
        }
    }

    async fn unmute(&self, chat_id: ChatId, user: UserId) -> BackendResult<()> {
        let guild_id = self.guild_of(chat_id).await?;
        if let Some(role) = self.muted_role {
            self.http
                .remove_member_role(guild_id, user_id(user), role, Some("modgate unmute"))
                .await
                .map_err(|e| backend_error("unmute", e))?;
        }
        guild_id
            .edit_member(self.http(), user_id(user), EditMember::new().enable_communication())
            .await
            .map_err(|e| backend_error("unmute", e))?;
        Ok(())
    }

    async fn ban(&self, chat_id: ChatId, user: UserId, until: Option<Timestamp>) -> BackendResult<()> {
        let guild_id = self.guild_of(chat_id).await?;
        guild_id
            .ban(self.http(), user_id(user), 0)
            .await
            .map_err(|e| backend_error("ban", e))?;
        if let Some(until) = until {
            self.schedule_unban(guild_id, user, until);
        }
        Ok(())
    }

    async fn unban(&self, chat_id: ChatId, user: UserId) -> BackendResult<()> {
        let guild_id = self.guild_of(chat_id).await?;
        guild_id
            .unban(self.http(), user_id(user))
            .await
            .map_err(|e| backend_error("unban", e))
    }

    async fn delete_messages(&self, chat_id: ChatId, message_ids: &[MessageId]) -> BackendResult<()> {
        let channel = channel_id(chat_id);
        let http = self.http();
        let mut failures = delete_each(message_ids, |message_id| async move {
            match channel
                .delete_message(http, serenity::MessageId::new(message_id.get()))
                .await
            {
                Ok(()) => Ok(()),
                Err(e) if status_of(&e) == Some(404) => {
                    debug!(%chat_id, %message_id, "Message already deleted");
                    Ok(())
                }
                Err(e) => Err(backend_error("delete message", e)),
            }
        })
        .await;

        for (message_id, error) in &failures {
            warn!(%chat_id, %message_id, error = %error, "Failed to delete message");
        }
        match failures.len() {
            0 => Ok(()),
            1 => Err(failures.remove(0).1),
            failed => Err(BackendError::platform(format!(
                "failed to delete {failed} of {} messages",
                message_ids.len()
            ))),
        }
    }

    async fn is_admin(&self, chat_id: ChatId, user: UserId) -> BackendResult<bool> {
        let guild_id = self.guild_of(chat_id).await?;
        let guild = guild_id
            .to_partial_guild(self.http())
            .await
            .map_err(|e| backend_error("guild lookup", e))?;
        if guild.owner_id == user_id(user) {
            return Ok(true);
        }

        let member = match guild_id.member(self.http(), user_id(user)).await {
            Ok(member) => member,
            Err(e) if status_of(&e) == Some(404) => return Ok(false),
            Err(e) => return Err(backend_error("member lookup", e)),
        };
        if member.roles.iter().any(|role| self.admin_roles.contains(role)) {
            return Ok(true);
        }

        let everyone = RoleId::new(guild_id.get());
        let permissions = combined_permissions(
            member
                .roles
                .iter()
                .chain(std::iter::once(&everyone))
                .filter_map(|role| guild.roles.get(role))
                .map(|role| role.permissions),
        );
        Ok(grants_admin(permissions))
    }

    async fn send_message(&self, chat_id: ChatId, message: OutgoingMessage) -> BackendResult<MessageId> {
        let channel = channel_id(chat_id);
        let mut builder = CreateMessage::new().content(message.text);
        if let Some(reply_to) = message.reply_to {
            builder = builder.reference_message((channel, serenity::MessageId::new(reply_to.get())));
        }
        if !message.buttons.is_empty() {
            let buttons = message
                .buttons
                .into_iter()
                .map(|button| {
                    CreateButton::new(button.callback)
                        .label(button.label)
                        .style(ButtonStyle::Primary)
                })
                .collect();
            builder = builder.components(vec![CreateActionRow::Buttons(buttons)]);
        }

        let sent = channel
            .send_message(self.http(), builder)
            .await
            .map_err(|e| backend_error("send message", e))?;
        Ok(MessageId(sent.id.get()))
    }

    async fn edit_message(&self, chat_id: ChatId, message_id: MessageId, text: String) -> BackendResult<()> {
        channel_id(chat_id)
            .edit_message(
                self.http(),
                serenity::MessageId::new(message_id.get()),
                EditMessage::new().content(text).components(Vec::new()),
            )
            .await
            .map_err(|e| backend_error("edit message", e))?;
        Ok(())
    }

    async fn chat_title(&self, chat_id: ChatId) -> BackendResult<String> {
        Ok(format!("#{}", self.channel(chat_id).await?.name))
    }

    fn user_link(&self, user: UserId) -> String {
        format!("<@{user}>")
    }
}

/// Outcome of a member search for a free-text target.
pub fn pick_search_match(query: &str, matches: &[UserId]) -> CommandResult<ResolvedTarget> {
    match matches {
        [] => Err(CommandError::UserNotFound {
            query: query.to_string(),
        }),
        [single] => Ok(ResolvedTarget::from_argument(*single)),
        _ => Err(CommandError::AmbiguousTarget {
            query: query.to_string(),
        }),
    }
}

/// Resolves mentions and ids directly and falls back to a guild member search.
#[derive(Debug, Clone)]
pub struct DiscordResolver {
    backend: Arc<DiscordBackend>,
}

impl DiscordResolver {
    /// Creates a resolver searching through `backend`.
    pub fn new(backend: Arc<DiscordBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl TargetResolver for DiscordResolver {
    async fn resolve(
        &self,
        chat_id: ChatId,
        args: &str,
        reply: Option<&ReplyContext>,
    ) -> CommandResult<ResolvedTarget> {
        if let Some(reply) = reply {
            return Ok(ResolvedTarget::from_reply(reply.author_id));
        }

        let (token, _) = split_first_token(args).ok_or(CommandError::MissingTarget)?;
        if let Some(user) = parse_user_reference(token) {
            return Ok(ResolvedTarget::from_argument(user));
        }

        let query = token.trim_start_matches('@');
        let matches = self.backend.search_members(chat_id, query).await?;
        pick_search_match(token, &matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modgate_common::test_utils::mock_timestamp;

    #[test]
    fn test_mute_within_timeout_limit_uses_timeout() {
        let now = mock_timestamp(2024, 1, 1, 0, 0, 0);
        let role = Some(RoleId::new(7));

        let short = now + TimeDelta::days(3);
        assert_eq!(plan_mute(now, Some(short), None).unwrap(), MutePlan::Timeout(short));
        assert_eq!(plan_mute(now, Some(short), role).unwrap(), MutePlan::Timeout(short));

        let limit = now + TimeDelta::days(MAX_TIMEOUT_DAYS);
        assert_eq!(plan_mute(now, Some(limit), None).unwrap(), MutePlan::Timeout(limit));
    }

    #[test]
    fn test_long_and_permanent_mutes_use_role() {
        let now = mock_timestamp(2024, 1, 1, 0, 0, 0);
        let role = RoleId::new(7);
        let long = now + TimeDelta::weeks(6);

        assert_eq!(
            plan_mute(now, Some(long), Some(role)).unwrap(),
            MutePlan::Role {
                role,
                until: Some(long)
            }
        );
        assert_eq!(
            plan_mute(now, None, Some(role)).unwrap(),
            MutePlan::Role { role, until: None }
        );
    }

    #[test]
    fn test_long_mute_without_role_is_unsupported() {
        let now = mock_timestamp(2024, 1, 1, 0, 0, 0);

        let long = now + TimeDelta::weeks(6);
        assert!(matches!(
            plan_mute(now, Some(long), None),
            Err(BackendError::Unsupported(_))
        ));
        assert!(matches!(
            plan_mute(now, None, None),
            Err(BackendError::Unsupported(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_tries_every_message() {
        let attempted = std::sync::Mutex::new(Vec::new());

        let failures = delete_each(&[MessageId(1), MessageId(2), MessageId(3)], |id| {
            attempted.lock().unwrap().push(id);
            async move {
                if id == MessageId(2) {
                    Err(BackendError::MissingPermission("delete message".into()))
                } else {
                    Ok(())
                }
            }
        })
        .await;

        assert_eq!(
            *attempted.lock().unwrap(),
            vec![MessageId(1), MessageId(2), MessageId(3)]
        );
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, MessageId(2));
        assert!(matches!(failures[0].1, BackendError::MissingPermission(_)));
    }

    #[test]
    fn test_admin_permissions() {
        assert!(grants_admin(Permissions::ADMINISTRATOR));
        assert!(grants_admin(Permissions::MANAGE_GUILD | Permissions::SEND_MESSAGES));
        assert!(!grants_admin(Permissions::BAN_MEMBERS | Permissions::KICK_MEMBERS));

        let combined = combined_permissions([
            Permissions::SEND_MESSAGES,
            Permissions::MANAGE_GUILD,
        ]);
        assert!(grants_admin(combined));
        assert_eq!(combined_permissions(Vec::<Permissions>::new()), Permissions::empty());
    }

    #[test]
    fn test_search_match_outcomes() {
        assert!(matches!(
            pick_search_match("bob", &[]),
            Err(CommandError::UserNotFound { query }) if query == "bob"
        ));
        assert_eq!(
            pick_search_match("bob", &[UserId(20)]).unwrap(),
            ResolvedTarget::from_argument(UserId(20))
        );
        assert!(matches!(
            pick_search_match("bo", &[UserId(20), UserId(21)]),
            Err(CommandError::AmbiguousTarget { .. })
        ));
    }
}
