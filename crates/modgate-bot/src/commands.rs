//! Prefix commands forwarding to the moderation handlers.
//!
//! Variants share one poise command through aliases (`skick`, `tmute`,
//! `stban`, ...); the handlers tell them apart by the name the user typed.

use crate::bot::Data;
use crate::error::BotError;
use modgate_commands::{ErrorKind, Invocation, ReplyContext};
use modgate_common::{ChatId, MessageId, UserId};
use poise::serenity_prelude as serenity;
use tracing::{debug, warn};

/// Poise context with the bot's data and error types.
pub type Context<'a> = poise::Context<'a, Data, BotError>;

/// Every prefix command the bot answers to.
pub fn all() -> Vec<poise::Command<Data, BotError>> {
    vec![
        kick(),
        mute(),
        unmute(),
        ban(),
        unban(),
        disable(),
        enable(),
        enableall(),
        disabled(),
        disableable(),
    ]
}

/// Builds an invocation from the message carrying a command.
pub fn invocation_from_message(message: &serenity::Message, args: &str) -> Invocation {
    let invocation = Invocation::new(
        ChatId(message.channel_id.get()),
        UserId(message.author.id.get()),
        MessageId(message.id.get()),
        args,
    );
    match &message.referenced_message {
        Some(replied) => invocation.replying_to(ReplyContext {
            message_id: MessageId(replied.id.get()),
            author_id: UserId(replied.author.id.get()),
        }),
        None => invocation,
    }
}

/// Refuses disabled commands for everyone but chat admins.
pub async fn command_check(ctx: Context<'_>) -> Result<bool, BotError> {
    let poise::Context::Prefix(prefix) = ctx else {
        return Ok(true);
    };
    let invocation = invocation_from_message(prefix.msg, "");
    Ok(ctx
        .data()
        .handlers
        .gate(ctx.invoked_command_name(), &invocation)
        .await?)
}

async fn forward(ctx: Context<'_>, args: Option<String>) -> Result<(), BotError> {
    let poise::Context::Prefix(prefix) = ctx else {
        return Ok(());
    };
    let command = ctx.invoked_command_name();
    let invocation = invocation_from_message(prefix.msg, args.as_deref().unwrap_or_default());

    match ctx.data().handlers.run(command, &invocation).await {
        Ok(response) => {
            debug!(command, message_id = %response.message_id, "Command answered");
        }
        Err(error) if error.kind() == ErrorKind::Backend => {
            warn!(command, chat_id = %invocation.chat_id, error = %error, "Command hit a platform failure");
        }
        // Already reported to the chat by the handlers.
        Err(_) => {}
    }
    Ok(())
}

/// Kick a user. `skick` does it silently.
#[poise::command(prefix_command, guild_only, aliases("skick"))]
pub async fn kick(ctx: Context<'_>, #[rest] args: Option<String>) -> Result<(), BotError> {
    forward(ctx, args).await
}

/// Mute a user, for a while with `tmute`, silently with `smute` or `stmute`.
#[poise::command(prefix_command, guild_only, aliases("smute", "tmute", "stmute"))]
pub async fn mute(ctx: Context<'_>, #[rest] args: Option<String>) -> Result<(), BotError> {
    forward(ctx, args).await
}

/// Let a muted user speak again.
#[poise::command(prefix_command, guild_only)]
pub async fn unmute(ctx: Context<'_>, #[rest] args: Option<String>) -> Result<(), BotError> {
    forward(ctx, args).await
}

/// Ban a user, for a while with `tban`, silently with `sban` or `stban`.
#[poise::command(prefix_command, guild_only, aliases("sban", "tban", "stban"))]
pub async fn ban(ctx: Context<'_>, #[rest] args: Option<String>) -> Result<(), BotError> {
    forward(ctx, args).await
}

/// Lift a ban.
#[poise::command(prefix_command, guild_only)]
pub async fn unban(ctx: Context<'_>, #[rest] args: Option<String>) -> Result<(), BotError> {
    forward(ctx, args).await
}

/// Disable a command in this chat.
#[poise::command(prefix_command, guild_only)]
pub async fn disable(ctx: Context<'_>, #[rest] args: Option<String>) -> Result<(), BotError> {
    forward(ctx, args).await
}

/// Enable a disabled command again.
#[poise::command(prefix_command, guild_only)]
pub async fn enable(ctx: Context<'_>, #[rest] args: Option<String>) -> Result<(), BotError> {
    forward(ctx, args).await
}

/// Enable every disabled command after confirmation.
#[poise::command(prefix_command, guild_only)]
pub async fn enableall(ctx: Context<'_>) -> Result<(), BotError> {
    forward(ctx, None).await
}

/// List the commands disabled in this chat.
#[poise::command(prefix_command, guild_only)]
pub async fn disabled(ctx: Context<'_>) -> Result<(), BotError> {
    forward(ctx, None).await
}

/// List the commands that can be disabled.
#[poise::command(prefix_command, guild_only, aliases("disablable"))]
pub async fn disableable(ctx: Context<'_>) -> Result<(), BotError> {
    forward(ctx, None).await
}
