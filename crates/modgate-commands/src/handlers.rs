//! Command entry points.
//!
//! Each handler is a chain of fallible steps; the first failing step ends the
//! invocation. Restriction handlers run:
//!
//! 1. invoker must be a chat admin
//! 2. resolve the target
//! 3. authorize the target (not the bot, not the invoker, not an admin)
//! 4. parse duration and reason
//! 5. build the confirmation text
//! 6. silent variants: mark the chat
//! 7. backend mutation
//! 8. send the confirmation
//! 9. silent variants: schedule deletion of the command, the confirmation,
//!    and the replied-to message when the target wrote it
//!
//! The mutation precedes the reply, so a failed mutation never leaves a
//! success message behind.

use crate::args::{parse_restriction_args, strip_target, CommandVariant, RestrictionArgs};
use crate::error::{CommandError, CommandResult, ErrorKind};
use crate::resolver::{ReplyContext, TargetResolver};
use crate::restrictions::{AuthorizedTarget, RestrictionAction, RestrictionExecutor};
use crate::silent::SilentCoordinator;
use crate::time_spec::format_duration;
use crate::toggle::{CommandToggle, DisabledExport, ENABLE_ALL_CANCEL, ENABLE_ALL_CONFIRM};
use chrono::Utc;
use modgate_common::{
    split_first_token, Button, ChatBackend, ChatId, MessageId, OutgoingMessage, RestrictionTarget,
    UserId,
};
use modgate_i18n::{fluent_args, I18n};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// One command as received from the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Chat the command was sent in.
    pub chat_id: ChatId,
    /// Sender of the command.
    pub invoker: UserId,
    /// The message carrying the command, or the prompt a button belongs to.
    pub message_id: MessageId,
    /// Everything after the command name.
    pub args: String,
    /// Message the command replied to.
    pub reply_to: Option<ReplyContext>,
}

impl Invocation {
    /// An invocation without reply context.
    pub fn new(
        chat_id: ChatId,
        invoker: UserId,
        message_id: MessageId,
        args: impl Into<String>,
    ) -> Self {
        Self {
            chat_id,
            invoker,
            message_id,
            args: args.into(),
            reply_to: None,
        }
    }

    /// Sets the replied-to message.
    #[must_use]
    pub const fn replying_to(mut self, reply: ReplyContext) -> Self {
        self.reply_to = Some(reply);
        self
    }
}

/// A message the handler posted or edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Id of the message.
    pub message_id: MessageId,
    /// Its text.
    pub text: String,
}

/// Every moderation command, ready to be called by a platform adapter.
#[derive(Clone)]
pub struct ModerationHandlers {
    backend: Arc<dyn ChatBackend>,
    i18n: Arc<I18n>,
    toggle: CommandToggle,
    executor: RestrictionExecutor,
    coordinator: Arc<SilentCoordinator>,
    resolver: Arc<dyn TargetResolver>,
    max_reason_length: usize,
}

impl fmt::Debug for ModerationHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModerationHandlers")
            .field("toggle", &self.toggle)
            .field("coordinator", &self.coordinator)
            .field("max_reason_length", &self.max_reason_length)
            .finish_non_exhaustive()
    }
}

const fn variant(action: RestrictionAction, silent: bool, temporal: bool) -> CommandVariant {
    CommandVariant {
        action,
        silent,
        temporal,
    }
}

impl ModerationHandlers {
    /// Wires the handlers to their collaborators.
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        i18n: Arc<I18n>,
        toggle: CommandToggle,
        coordinator: Arc<SilentCoordinator>,
        resolver: Arc<dyn TargetResolver>,
        max_reason_length: usize,
    ) -> Self {
        Self {
            executor: RestrictionExecutor::new(Arc::clone(&backend)),
            backend,
            i18n,
            toggle,
            coordinator,
            resolver,
            max_reason_length,
        }
    }

    /// The toggle used by the disable/enable commands.
    pub fn toggle(&self) -> &CommandToggle {
        &self.toggle
    }

    /// The silent-action coordinator.
    pub fn coordinator(&self) -> &Arc<SilentCoordinator> {
        &self.coordinator
    }

    /// The string table.
    pub fn i18n(&self) -> &I18n {
        &self.i18n
    }

    // ----- dispatch -----

    /// Runs a command by name, alias or variant spelling.
    ///
    /// On failure the localized error text has already been sent to the chat
    /// when this returns.
    pub async fn run(&self, command: &str, invocation: &Invocation) -> CommandResult<Response> {
        let result = self.dispatch(command, invocation).await;
        if let Err(error) = &result {
            self.report(invocation, error).await;
        }
        result
    }

    async fn dispatch(&self, command: &str, invocation: &Invocation) -> CommandResult<Response> {
        if let Some(variant) = CommandVariant::parse(command) {
            return self.restrict(variant, invocation).await;
        }

        match self.toggle.registry().canonicalize(command).as_str() {
            "disable" => self.disable(invocation).await,
            "enable" => self.enable(invocation).await,
            "enableall" => self.enableall(invocation).await,
            "disabled" => self.disabled(invocation).await,
            "disableable" => self.disableable(invocation).await,
            _ => Err(CommandError::UnknownCommand(command.to_string())),
        }
    }

    /// Routes a pressed button. `invocation.message_id` is the message carrying the button.
    pub async fn on_button(&self, payload: &str, invocation: &Invocation) -> CommandResult<Response> {
        match payload {
            ENABLE_ALL_CONFIRM => self.enableall_confirm(invocation).await,
            ENABLE_ALL_CANCEL => self.enableall_cancel(invocation).await,
            other => Err(CommandError::UnknownCommand(other.to_string())),
        }
    }

    /// Whether the command may run for this invocation.
    ///
    /// Chat admins may use disabled commands.
    pub async fn gate(&self, command: &str, invocation: &Invocation) -> CommandResult<bool> {
        if !self.toggle.is_disabled(invocation.chat_id, command).await? {
            return Ok(true);
        }
        let admin = self
            .backend
            .is_admin(invocation.chat_id, invocation.invoker)
            .await?;
        if !admin {
            debug!(chat_id = %invocation.chat_id, command, "Command disabled in chat");
        }
        Ok(admin)
    }

    /// Localized text for an error in the given chat.
    pub async fn render_error(&self, chat_id: ChatId, error: &CommandError) -> String {
        let chat = self
            .backend
            .chat_title(chat_id)
            .await
            .unwrap_or_else(|_| chat_id.to_string());
        error.render(&self.i18n, &chat)
    }

    async fn report(&self, invocation: &Invocation, error: &CommandError) {
        match error.kind() {
            ErrorKind::Backend => {
                warn!(chat_id = %invocation.chat_id, error = %error, "Command failed");
            }
            _ => debug!(chat_id = %invocation.chat_id, error = %error, "Command rejected"),
        }

        let text = self.render_error(invocation.chat_id, error).await;
        if let Err(e) = self
            .backend
            .send_message(
                invocation.chat_id,
                OutgoingMessage::text(text).reply_to(invocation.message_id),
            )
            .await
        {
            warn!(chat_id = %invocation.chat_id, error = %e, "Failed to send error reply");
        }
    }

    // ----- shared steps -----

    async fn require_admin(&self, invocation: &Invocation) -> CommandResult<()> {
        if self
            .backend
            .is_admin(invocation.chat_id, invocation.invoker)
            .await?
        {
            Ok(())
        } else {
            Err(CommandError::InvokerNotAdmin)
        }
    }

    async fn chat_title(&self, chat_id: ChatId) -> CommandResult<String> {
        Ok(self.backend.chat_title(chat_id).await?)
    }

    async fn reply(&self, invocation: &Invocation, message: OutgoingMessage) -> CommandResult<Response> {
        let text = message.text.clone();
        let message_id = self
            .backend
            .send_message(invocation.chat_id, message.reply_to(invocation.message_id))
            .await?;
        Ok(Response { message_id, text })
    }

    async fn edit(&self, invocation: &Invocation, text: String) -> CommandResult<Response> {
        self.backend
            .edit_message(invocation.chat_id, invocation.message_id, text.clone())
            .await?;
        Ok(Response {
            message_id: invocation.message_id,
            text,
        })
    }

    fn listing(&self, header: String, commands: &[String]) -> String {
        std::iter::once(header)
            .chain(commands.iter().map(|command| {
                self.i18n.lookup(
                    "disable",
                    "command-item",
                    Some(&fluent_args!("command" => command.as_str())),
                )
            }))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn first_argument(invocation: &Invocation) -> CommandResult<&str> {
        split_first_token(&invocation.args)
            .map(|(token, _)| token)
            .ok_or(CommandError::MissingArgument)
    }

    // ----- toggle commands -----

    /// `disableable`: lists the commands a chat may disable.
    pub async fn disableable(&self, invocation: &Invocation) -> CommandResult<Response> {
        let header = self.i18n.lookup("disable", "disablable", None);
        let text = self.listing(header, &self.toggle.list_disablable());
        self.reply(invocation, OutgoingMessage::text(text)).await
    }

    /// `disabled`: lists the chat's disabled commands.
    pub async fn disabled(&self, invocation: &Invocation) -> CommandResult<Response> {
        let chat = self.chat_title(invocation.chat_id).await?;
        let disabled = self.toggle.disabled(invocation.chat_id).await?;

        let text = if disabled.is_empty() {
            self.i18n.lookup(
                "disable",
                "no-disabled",
                Some(&fluent_args!("chat" => chat.as_str())),
            )
        } else {
            let header = self.i18n.lookup(
                "disable",
                "disabled-list",
                Some(&fluent_args!("chat" => chat.as_str())),
            );
            self.listing(header, &disabled)
        };
        self.reply(invocation, OutgoingMessage::text(text)).await
    }

    /// `disable <command>`
    #[instrument(skip(self), fields(chat_id = %invocation.chat_id))]
    pub async fn disable(&self, invocation: &Invocation) -> CommandResult<Response> {
        self.require_admin(invocation).await?;
        let requested = Self::first_argument(invocation)?;
        let chat = self.chat_title(invocation.chat_id).await?;

        let command = self.toggle.disable(invocation.chat_id, requested).await?;

        let text = self.i18n.lookup(
            "disable",
            "disabled",
            Some(&fluent_args!("command" => command.as_str(), "chat" => chat.as_str())),
        );
        self.reply(invocation, OutgoingMessage::text(text)).await
    }

    /// `enable <command>`
    #[instrument(skip(self), fields(chat_id = %invocation.chat_id))]
    pub async fn enable(&self, invocation: &Invocation) -> CommandResult<Response> {
        self.require_admin(invocation).await?;
        let requested = Self::first_argument(invocation)?;
        let chat = self.chat_title(invocation.chat_id).await?;

        let command = self.toggle.enable(invocation.chat_id, requested).await?;

        let text = self.i18n.lookup(
            "disable",
            "enabled",
            Some(&fluent_args!("command" => command.as_str(), "chat" => chat.as_str())),
        );
        self.reply(invocation, OutgoingMessage::text(text)).await
    }

    /// `enableall`: posts the yes/no prompt. Nothing is enabled yet.
    pub async fn enableall(&self, invocation: &Invocation) -> CommandResult<Response> {
        self.require_admin(invocation).await?;
        let chat = self.chat_title(invocation.chat_id).await?;
        let prompt = self.toggle.enable_all(invocation.chat_id).await?;

        let text = self.i18n.lookup(
            "disable",
            "enable-all-text",
            Some(&fluent_args!("count" => prompt.count, "chat" => chat.as_str())),
        );
        let message = OutgoingMessage::text(text)
            .button(Button::new(
                self.i18n.lookup("disable", "enable-all-yes", None),
                ENABLE_ALL_CONFIRM,
            ))
            .button(Button::new(
                self.i18n.lookup("disable", "enable-all-no", None),
                ENABLE_ALL_CANCEL,
            ));
        self.reply(invocation, message).await
    }

    /// "Yes" on the enable-all prompt: clears the set and rewrites the prompt.
    pub async fn enableall_confirm(&self, invocation: &Invocation) -> CommandResult<Response> {
        self.require_admin(invocation).await?;
        let chat = self.chat_title(invocation.chat_id).await?;
        let count = self.toggle.enable_all_confirm(invocation.chat_id).await?;

        let text = self.i18n.lookup(
            "disable",
            "enable-all-done",
            Some(&fluent_args!("count" => count, "chat" => chat.as_str())),
        );
        self.edit(invocation, text).await
    }

    /// "No" on the enable-all prompt.
    pub async fn enableall_cancel(&self, invocation: &Invocation) -> CommandResult<Response> {
        self.require_admin(invocation).await?;
        let text = self.i18n.lookup("disable", "enable-all-cancelled", None);
        self.edit(invocation, text).await
    }

    /// Disabled commands of a chat, for other modules and backups.
    pub async fn export(&self, chat_id: ChatId) -> CommandResult<DisabledExport> {
        self.toggle.export(chat_id).await
    }

    // ----- restriction commands -----

    /// `kick <target> [reason]`
    pub async fn kick(&self, invocation: &Invocation) -> CommandResult<Response> {
        self.restrict(variant(RestrictionAction::Kick, false, false), invocation)
            .await
    }

    /// `skick <target> [reason]`
    pub async fn skick(&self, invocation: &Invocation) -> CommandResult<Response> {
        self.restrict(variant(RestrictionAction::Kick, true, false), invocation)
            .await
    }

    /// `mute <target> [reason]`
    pub async fn mute(&self, invocation: &Invocation) -> CommandResult<Response> {
        self.restrict(variant(RestrictionAction::Mute, false, false), invocation)
            .await
    }

    /// `smute <target> [reason]`
    pub async fn smute(&self, invocation: &Invocation) -> CommandResult<Response> {
        self.restrict(variant(RestrictionAction::Mute, true, false), invocation)
            .await
    }

    /// `tmute <target> <duration> [reason]`
    pub async fn tmute(&self, invocation: &Invocation) -> CommandResult<Response> {
        self.restrict(variant(RestrictionAction::Mute, false, true), invocation)
            .await
    }

    /// `stmute <target> <duration> [reason]`
    pub async fn stmute(&self, invocation: &Invocation) -> CommandResult<Response> {
        self.restrict(variant(RestrictionAction::Mute, true, true), invocation)
            .await
    }

    /// `unmute <target>`
    pub async fn unmute(&self, invocation: &Invocation) -> CommandResult<Response> {
        self.restrict(variant(RestrictionAction::Unmute, false, false), invocation)
            .await
    }

    /// `ban <target> [reason]`
    pub async fn ban(&self, invocation: &Invocation) -> CommandResult<Response> {
        self.restrict(variant(RestrictionAction::Ban, false, false), invocation)
            .await
    }

    /// `sban <target> [reason]`
    pub async fn sban(&self, invocation: &Invocation) -> CommandResult<Response> {
        self.restrict(variant(RestrictionAction::Ban, true, false), invocation)
            .await
    }

    /// `tban <target> <duration> [reason]`
    pub async fn tban(&self, invocation: &Invocation) -> CommandResult<Response> {
        self.restrict(variant(RestrictionAction::Ban, false, true), invocation)
            .await
    }

    /// `stban <target> <duration> [reason]`
    pub async fn stban(&self, invocation: &Invocation) -> CommandResult<Response> {
        self.restrict(variant(RestrictionAction::Ban, true, true), invocation)
            .await
    }

    /// `unban <target>`
    pub async fn unban(&self, invocation: &Invocation) -> CommandResult<Response> {
        self.restrict(variant(RestrictionAction::Unban, false, false), invocation)
            .await
    }

    /// Shared restriction pipeline; see the module docs for the steps.
    #[instrument(skip(self, variant, invocation), fields(command = %variant.name(), chat_id = %invocation.chat_id))]
    pub async fn restrict(
        &self,
        variant: CommandVariant,
        invocation: &Invocation,
    ) -> CommandResult<Response> {
        self.require_admin(invocation).await?;

        let resolved = self
            .resolver
            .resolve(
                invocation.chat_id,
                &invocation.args,
                invocation.reply_to.as_ref(),
            )
            .await?;
        let target = RestrictionTarget::new(invocation.chat_id, resolved.user_id);

        let authorized = self
            .executor
            .authorize(variant.action, target, invocation.invoker)
            .await?;

        let rest = strip_target(&invocation.args, resolved.consumed_token);
        let args = parse_restriction_args(variant, rest, Utc::now(), self.max_reason_length)?;

        let text = self.confirmation_text(variant, &authorized, &args).await?;

        if variant.silent {
            self.coordinator
                .mark_silent(target.chat_id, target.user_id)
                .await;
        }

        self.executor.apply(&authorized, args.until).await?;

        let response = self.reply(invocation, OutgoingMessage::text(text)).await?;

        if variant.silent {
            let mut to_delete = vec![response.message_id, invocation.message_id];
            if let Some(reply) = invocation
                .reply_to
                .filter(|reply| reply.author_id == target.user_id)
            {
                to_delete.push(reply.message_id);
            }
            self.coordinator.schedule_cleanup(target.chat_id, to_delete);
        }

        info!(restriction = %target, invoker = %invocation.invoker, "Restriction applied");
        Ok(response)
    }

    async fn confirmation_text(
        &self,
        variant: CommandVariant,
        authorized: &AuthorizedTarget,
        args: &RestrictionArgs,
    ) -> CommandResult<String> {
        let target = authorized.target();
        let chat = self.chat_title(target.chat_id).await?;
        let user = self.backend.user_link(target.user_id);
        let admin = self.backend.user_link(authorized.invoker());

        let mut lines = vec![self.i18n.lookup(
            "restrictions",
            variant.action.confirmation_key(),
            Some(&fluent_args!(
                "user" => user.as_str(),
                "admin" => admin.as_str(),
                "chat" => chat.as_str()
            )),
        )];

        if let Some(duration) = args.time.and_then(|time| time.to_duration()) {
            let duration = format_duration(duration, &self.i18n);
            lines.push(self.i18n.lookup(
                "restrictions",
                "on-time",
                Some(&fluent_args!("duration" => duration.as_str())),
            ));
        }

        if let Some(reason) = &args.reason {
            lines.push(self.i18n.lookup(
                "restrictions",
                "reason",
                Some(&fluent_args!("reason" => reason.as_str())),
            ));
        }

        if variant.silent {
            let seconds = self.coordinator.cleanup_delay().as_secs();
            lines.push(self.i18n.lookup(
                "restrictions",
                "purge",
                Some(&fluent_args!("seconds" => seconds)),
            ));
        }

        Ok(lines.join("\n"))
    }
}
