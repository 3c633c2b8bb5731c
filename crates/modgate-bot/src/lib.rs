//! # modgate bot
//!
//! Discord front end for the modgate moderation core.
//!
//! Text commands arrive through poise prefix commands, are checked against the
//! per-chat disabled set and forwarded to [`modgate_commands::ModerationHandlers`];
//! the [`discord::DiscordBackend`] carries out kicks, mutes, bans and replies.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod bot;
pub mod commands;
pub mod discord;
pub mod error;

pub use bot::{Data, ModgateBot};
pub use discord::{DiscordBackend, DiscordResolver};
pub use error::{BotError, BotResult};
