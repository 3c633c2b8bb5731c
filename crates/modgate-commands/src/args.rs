//! Restriction command variants and their argument grammar
//!
//! ```text
//! <command> [target] [duration] [reason...]
//! ```
//!
//! The target token is absent when the command replies to the target's
//! message. The duration is required by `t` and `st` variants and absent
//! otherwise. Everything left over is the reason.

use crate::error::{CommandError, CommandResult};
use crate::restrictions::RestrictionAction;
use crate::time_spec::TimeSpec;
use modgate_common::{split_first_token, truncate_string, Timestamp};

/// One spelling of a restriction command, e.g. `stban`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandVariant {
    /// Underlying action.
    pub action: RestrictionAction,
    /// Hide the action from the chat afterwards.
    pub silent: bool,
    /// Requires a duration and lifts automatically.
    pub temporal: bool,
}

impl CommandVariant {
    /// Every restriction command name.
    pub const NAMES: [&'static str; 12] = [
        "kick", "skick", "mute", "smute", "tmute", "stmute", "unmute", "ban", "sban", "tban",
        "stban", "unban",
    ];

    /// Plain variant of `action`.
    pub const fn plain(action: RestrictionAction) -> Self {
        Self {
            action,
            silent: false,
            temporal: false,
        }
    }

    /// Parses a command name such as `tmute` (case-insensitive, optional `/` or `!`).
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim_start_matches(['/', '!']).to_lowercase();
        let (silent, temporal, base) = if let Some(base) = name.strip_prefix("st") {
            (true, true, base)
        } else if let Some(base) = name.strip_prefix('s') {
            (true, false, base)
        } else if let Some(base) = name.strip_prefix('t') {
            (false, true, base)
        } else {
            (false, false, name.as_str())
        };

        let action = match base {
            "kick" => RestrictionAction::Kick,
            "mute" => RestrictionAction::Mute,
            "unmute" => RestrictionAction::Unmute,
            "ban" => RestrictionAction::Ban,
            "unban" => RestrictionAction::Unban,
            _ => return None,
        };

        if (silent && !action.has_silent_variant()) || (temporal && !action.has_temporal_variant()) {
            return None;
        }

        Some(Self {
            action,
            silent,
            temporal,
        })
    }

    /// Command name of this variant.
    pub fn name(&self) -> String {
        let prefix = match (self.silent, self.temporal) {
            (true, true) => "st",
            (true, false) => "s",
            (false, true) => "t",
            (false, false) => "",
        };
        format!("{prefix}{}", self.action)
    }
}

/// Arguments after the target.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RestrictionArgs {
    /// Parsed duration of a temporal variant.
    pub time: Option<TimeSpec>,
    /// When a temporal restriction lifts.
    pub until: Option<Timestamp>,
    /// Free-text reason, already truncated.
    pub reason: Option<String>,
}

/// Parses what follows the target token.
///
/// `rest` must already exclude the target token when one was used.
pub fn parse_restriction_args(
    variant: CommandVariant,
    rest: &str,
    now: Timestamp,
    max_reason_length: usize,
) -> CommandResult<RestrictionArgs> {
    let mut args = RestrictionArgs::default();
    let mut remainder = rest.trim();

    if variant.temporal {
        let (token, after) = split_first_token(remainder).ok_or(CommandError::MissingTimeArgument)?;
        let invalid = || CommandError::InvalidTimeUnit {
            token: token.to_string(),
        };
        let time: TimeSpec = token.parse()?;
        args.until = Some(time.expiry_from(now).ok_or_else(invalid)?);
        args.time = Some(time);
        remainder = after;
    }

    if !remainder.is_empty() {
        args.reason = Some(truncate_string(remainder, max_reason_length));
    }

    Ok(args)
}

/// Text left after removing the target token, when the target was named in the arguments.
pub fn strip_target(args: &str, consumed_token: bool) -> &str {
    if !consumed_token {
        return args.trim();
    }
    split_first_token(args).map_or("", |(_, rest)| rest)
}
