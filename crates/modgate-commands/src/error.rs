//! Error taxonomy for moderation commands

use crate::restrictions::RestrictionAction;
use modgate_common::{BackendError, ModgateError};
use modgate_i18n::{fluent_args, FluentArgs, I18n};
use thiserror::Error;

/// Result type for command operations
pub type CommandResult<T> = std::result::Result<T, CommandError>;

/// Broad class of a [`CommandError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Target or invoker rejected; nothing changed.
    Validation,
    /// Malformed or missing arguments.
    Argument,
    /// The requested state already holds.
    AlreadyInState,
    /// Nothing to act on.
    NothingToDo,
    /// The chat platform or the store failed.
    Backend,
}

/// Everything a single command invocation can fail with
#[derive(Error, Debug)]
pub enum CommandError {
    /// The target is the bot account.
    #[error("cannot {action} the bot itself")]
    TargetIsSelf {
        /// Action that was refused.
        action: RestrictionAction,
    },

    /// The target is the admin who issued the command.
    #[error("cannot {action} the invoking user")]
    TargetIsInvoker {
        /// Action that was refused.
        action: RestrictionAction,
    },

    /// The target administers the chat.
    #[error("cannot {action} a chat admin")]
    TargetIsAdmin {
        /// Action that was refused.
        action: RestrictionAction,
    },

    /// Only chat admins may run this.
    #[error("invoker is not a chat admin")]
    InvokerNotAdmin,

    /// Neither a reply nor an argument named a user.
    #[error("no target given")]
    MissingTarget,

    /// The argument did not resolve to a member.
    #[error("no user matches '{query}'")]
    UserNotFound {
        /// Argument as typed.
        query: String,
    },

    /// The argument matched several members.
    #[error("more than one user matches '{query}'")]
    AmbiguousTarget {
        /// Argument as typed.
        query: String,
    },

    /// A `t` variant was used without a duration.
    #[error("temporal variant needs a duration")]
    MissingTimeArgument,

    /// The duration token is malformed.
    #[error("invalid duration '{token}'")]
    InvalidTimeUnit {
        /// Token as typed.
        token: String,
    },

    /// The command needs an argument.
    #[error("missing argument")]
    MissingArgument,

    /// No command or button payload by this name.
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// The command is not on the disablable list.
    #[error("'{command}' cannot be disabled")]
    NotDisablable {
        /// Command as typed.
        command: String,
    },

    /// The command is not on the disablable list, so it is never disabled.
    #[error("'{command}' cannot be enabled")]
    NotEnablable {
        /// Canonical command name.
        command: String,
    },

    /// The command is disabled already.
    #[error("'{command}' is already disabled")]
    AlreadyDisabled {
        /// Canonical command name.
        command: String,
    },

    /// The command is not disabled.
    #[error("'{command}' is already enabled")]
    AlreadyEnabled {
        /// Canonical command name.
        command: String,
    },

    /// `enableall` with an empty disabled set.
    #[error("no commands are disabled")]
    NothingDisabled,

    /// The chat platform refused or failed.
    #[error("chat backend failed: {0}")]
    Backend(#[from] BackendError),

    /// The disabled-command store failed.
    #[error("storage failed: {0}")]
    Storage(#[from] ModgateError),
}

impl CommandError {
    /// Classifies the error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::TargetIsSelf { .. }
            | Self::TargetIsInvoker { .. }
            | Self::TargetIsAdmin { .. }
            | Self::InvokerNotAdmin
            | Self::MissingTarget
            | Self::UserNotFound { .. }
            | Self::AmbiguousTarget { .. } => ErrorKind::Validation,
            Self::MissingTimeArgument
            | Self::InvalidTimeUnit { .. }
            | Self::MissingArgument
            | Self::UnknownCommand(_)
            | Self::NotDisablable { .. }
            | Self::NotEnablable { .. } => ErrorKind::Argument,
            Self::AlreadyDisabled { .. } | Self::AlreadyEnabled { .. } => ErrorKind::AlreadyInState,
            Self::NothingDisabled => ErrorKind::NothingToDo,
            Self::Backend(_) | Self::Storage(_) => ErrorKind::Backend,
        }
    }

    /// Localization domain and key of the user-facing text.
    pub fn message_key(&self) -> (&'static str, String) {
        match self {
            Self::TargetIsSelf { action } => ("restrictions", format!("{action}-bot")),
            Self::TargetIsInvoker { action } => ("restrictions", format!("{action}-self")),
            Self::TargetIsAdmin { action } => ("restrictions", format!("{action}-admin")),
            Self::InvokerNotAdmin => ("common", "admin-only".into()),
            Self::MissingTarget => ("restrictions", "missing-target".into()),
            Self::UserNotFound { .. } => ("restrictions", "user-not-found".into()),
            Self::AmbiguousTarget { .. } => ("restrictions", "ambiguous-target".into()),
            Self::MissingTimeArgument => ("restrictions", "enter-time".into()),
            Self::InvalidTimeUnit { .. } => ("restrictions", "invalid-time".into()),
            Self::MissingArgument => ("common", "missing-argument".into()),
            Self::UnknownCommand(_) => ("common", "unknown-command".into()),
            Self::NotDisablable { .. } => ("disable", "wot-to-disable".into()),
            Self::NotEnablable { .. } => ("disable", "wot-to-enable".into()),
            Self::AlreadyDisabled { .. } => ("disable", "already-disabled".into()),
            Self::AlreadyEnabled { .. } => ("disable", "already-enabled".into()),
            Self::NothingDisabled => ("disable", "nothing-disabled".into()),
            Self::Backend(BackendError::Unsupported(_)) => ("common", "backend-unsupported".into()),
            Self::Backend(_) => ("common", "backend-failure".into()),
            Self::Storage(_) => ("common", "storage-failure".into()),
        }
    }

    /// Renders the reply sent to the chat for this error.
    ///
    /// `chat` fills the chat name into messages that mention it.
    pub fn render(&self, i18n: &I18n, chat: &str) -> String {
        let (domain, key) = self.message_key();
        let args: FluentArgs = match self {
            Self::AmbiguousTarget { query } | Self::UserNotFound { query } => {
                fluent_args!("query" => query.as_str())
            }
            Self::InvalidTimeUnit { token } => fluent_args!("token" => token.as_str()),
            _ => fluent_args!("chat" => chat),
        };
        i18n.lookup(domain, &key, Some(&args))
    }
}
