//! Duration tokens such as `30m`, `2h`, `1d` or `3w`.

use crate::error::{CommandError, CommandResult};
use chrono::{TimeDelta, Utc};
use modgate_common::Timestamp;
use modgate_i18n::{fluent_args, I18n};
use std::fmt;
use std::str::FromStr;

/// Unit suffix of a duration token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    /// `m`
    Minutes,
    /// `h`
    Hours,
    /// `d`
    Days,
    /// `w`
    Weeks,
}

impl TimeUnit {
    fn from_suffix(suffix: char) -> Option<Self> {
        match suffix.to_ascii_lowercase() {
            'm' => Some(Self::Minutes),
            'h' => Some(Self::Hours),
            'd' => Some(Self::Days),
            'w' => Some(Self::Weeks),
            _ => None,
        }
    }

    const fn seconds(self) -> i64 {
        match self {
            Self::Minutes => 60,
            Self::Hours => 60 * 60,
            Self::Days => 24 * 60 * 60,
            Self::Weeks => 7 * 24 * 60 * 60,
        }
    }

    const fn message_key(self) -> &'static str {
        match self {
            Self::Minutes => "duration-minutes",
            Self::Hours => "duration-hours",
            Self::Days => "duration-days",
            Self::Weeks => "duration-weeks",
        }
    }
}

/// A parsed `<positive integer><unit>` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpec {
    amount: u64,
    unit: TimeUnit,
}

impl TimeSpec {
    /// Number of units.
    pub const fn amount(&self) -> u64 {
        self.amount
    }

    /// The unit.
    pub const fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// Length of the span, `None` when it does not fit a [`TimeDelta`].
    pub fn to_duration(&self) -> Option<TimeDelta> {
        let amount = i64::try_from(self.amount).ok()?;
        amount
            .checked_mul(self.unit.seconds())
            .and_then(TimeDelta::try_seconds)
    }

    /// Instant the span ends when started at `now`.
    pub fn expiry_from(&self, now: Timestamp) -> Option<Timestamp> {
        now.checked_add_signed(self.to_duration()?)
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self.unit {
            TimeUnit::Minutes => 'm',
            TimeUnit::Hours => 'h',
            TimeUnit::Days => 'd',
            TimeUnit::Weeks => 'w',
        };
        write!(f, "{}{suffix}", self.amount)
    }
}

impl FromStr for TimeSpec {
    type Err = CommandError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let invalid = || CommandError::InvalidTimeUnit {
            token: token.to_string(),
        };

        let suffix = token.chars().last().ok_or_else(invalid)?;
        let unit = TimeUnit::from_suffix(suffix).ok_or_else(invalid)?;
        let digits = &token[..token.len() - suffix.len_utf8()];

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let amount: u64 = digits.parse().map_err(|_| invalid())?;
        if amount == 0 {
            return Err(invalid());
        }

        Ok(Self { amount, unit })
    }
}

/// Expiry instant for `token` counted from now.
pub fn parse_duration(token: &str) -> CommandResult<Timestamp> {
    parse_duration_at(token, Utc::now())
}

/// Expiry instant for `token` counted from `now`.
///
/// Fails with [`CommandError::InvalidTimeUnit`] for anything but a positive
/// amount followed by `m`, `h`, `d` or `w`, and for spans past the end of the
/// calendar.
pub fn parse_duration_at(token: &str, now: Timestamp) -> CommandResult<Timestamp> {
    let spec: TimeSpec = token.parse()?;
    spec.expiry_from(now)
        .ok_or_else(|| CommandError::InvalidTimeUnit {
            token: token.to_string(),
        })
}

/// Renders a span in the largest unit that divides it evenly, e.g. "2 hours".
///
/// Spans shorter than a minute, or not a whole number of minutes, are rounded
/// down to minutes.
pub fn format_duration(duration: TimeDelta, i18n: &I18n) -> String {
    let seconds = duration.num_seconds().max(0);
    let unit = [TimeUnit::Weeks, TimeUnit::Days, TimeUnit::Hours]
        .into_iter()
        .find(|unit| seconds > 0 && seconds % unit.seconds() == 0)
        .unwrap_or(TimeUnit::Minutes);
    let count = seconds / unit.seconds();

    i18n.lookup("common", unit.message_key(), Some(&fluent_args!("count" => count)))
}
