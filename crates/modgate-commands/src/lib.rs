//! # modgate commands
//!
//! The moderation core: per-chat command toggling and the kick/mute/ban
//! pipeline with temporary and silent variants.
//!
//! Platform specifics stay behind [`modgate_common::ChatBackend`] and
//! [`TargetResolver`]; a platform adapter builds [`ModerationHandlers`] with
//! [`create_handlers`] and forwards commands to [`ModerationHandlers::run`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod args;
pub mod context;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod resolver;
pub mod restrictions;
pub mod silent;
pub mod store;
pub mod time_spec;
pub mod toggle;

pub use args::{CommandVariant, RestrictionArgs};
pub use context::{create_handlers, create_handlers_with_store, load_i18n, open_store};
pub use error::{CommandError, CommandResult, ErrorKind};
pub use handlers::{Invocation, ModerationHandlers, Response};
pub use registry::{CommandRegistry, CommandSpec};
pub use resolver::{parse_user_reference, MentionResolver, ReplyContext, ResolvedTarget, TargetResolver};
pub use restrictions::{AuthorizedTarget, RestrictionAction, RestrictionExecutor};
pub use silent::{LeaveOutcome, MokaMarkerStore, SilentCoordinator, SilentMarkerStore};
pub use store::{DisabledCommandStore, MemoryDisabledStore, SledDisabledStore};
pub use time_spec::{format_duration, parse_duration, parse_duration_at, TimeSpec, TimeUnit};
pub use toggle::{
    CommandToggle, DisabledExport, EnableAllPrompt, ENABLE_ALL_CANCEL, ENABLE_ALL_CONFIRM,
};
