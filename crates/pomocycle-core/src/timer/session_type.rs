use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The three kinds of countdown in a Pomodoro cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionType {
    Work,
    ShortBreak,
    LongBreak,
}

impl SessionType {
    pub const ALL: [SessionType; 3] = [
        SessionType::Work,
        SessionType::ShortBreak,
        SessionType::LongBreak,
    ];

    /// Duration used by a normal (non-custom) start, in minutes.
    pub const fn default_minutes(self) -> u32 {
        match self {
            SessionType::Work => 25,
            SessionType::ShortBreak => 5,
            SessionType::LongBreak => 15,
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            SessionType::Work => "Work Session",
            SessionType::ShortBreak => "Short Break",
            SessionType::LongBreak => "Long Break",
        }
    }

    /// Stable identifier used in storage.
    pub const fn as_str(self) -> &'static str {
        match self {
            SessionType::Work => "WORK",
            SessionType::ShortBreak => "SHORT_BREAK",
            SessionType::LongBreak => "LONG_BREAK",
        }
    }

    pub fn is_break(self) -> bool {
        !matches!(self, SessionType::Work)
    }

    /// True when `minutes` differs from this type's default duration.
    pub fn is_custom(self, minutes: u32) -> bool {
        self.default_minutes() != minutes
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for SessionType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SessionType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::invalid_argument(format!("unknown session type: {s}")))
    }
}
