use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Returned by [`PauseRecord::pause_duration_seconds`] while the pause is open.
pub const ONGOING_PAUSE: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum Interval {
    Open {
        paused_at: DateTime<Utc>,
    },
    Closed {
        paused_at: DateTime<Utc>,
        unpaused_at: DateTime<Utc>,
    },
}

/// One pause taken during a countdown.
///
/// A pause is either still open (the timer has not been resumed yet) or
/// closed, in which case `paused_at <= unpaused_at` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PauseRecord {
    interval: Interval,
}

impl PauseRecord {
    pub fn open(paused_at: DateTime<Utc>) -> Self {
        Self {
            interval: Interval::Open { paused_at },
        }
    }

    /// Build a finished pause. Fails if the interval would be inverted.
    pub fn closed(paused_at: DateTime<Utc>, unpaused_at: DateTime<Utc>) -> Result<Self> {
        if paused_at > unpaused_at {
            return Err(CoreError::invalid_argument(
                "pause cannot end before it starts",
            ));
        }
        Ok(Self {
            interval: Interval::Closed {
                paused_at,
                unpaused_at,
            },
        })
    }

    /// Close an open pause at `at`. Closing an already closed pause is a no-op.
    ///
    /// `at` is clamped to `paused_at` so the interval is never inverted.
    pub fn close(self, at: DateTime<Utc>) -> Self {
        match self.interval {
            Interval::Open { paused_at } => Self {
                interval: Interval::Closed {
                    paused_at,
                    unpaused_at: at.max(paused_at),
                },
            },
            Interval::Closed { .. } => self,
        }
    }

    pub fn paused_at(&self) -> DateTime<Utc> {
        match self.interval {
            Interval::Open { paused_at } | Interval::Closed { paused_at, .. } => paused_at,
        }
    }

    pub fn unpaused_at(&self) -> Option<DateTime<Utc>> {
        match self.interval {
            Interval::Open { .. } => None,
            Interval::Closed { unpaused_at, .. } => Some(unpaused_at),
        }
    }

    pub fn is_still_paused(&self) -> bool {
        matches!(self.interval, Interval::Open { .. })
    }

    /// Whole seconds between pause and resume, or [`ONGOING_PAUSE`] while open.
    pub fn pause_duration_seconds(&self) -> i64 {
        match self.interval {
            Interval::Open { .. } => ONGOING_PAUSE,
            Interval::Closed {
                paused_at,
                unpaused_at,
            } => (unpaused_at - paused_at).num_seconds(),
        }
    }
}

impl fmt::Display for PauseRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.interval {
            Interval::Open { paused_at } => write!(f, "paused at {paused_at} (ongoing)"),
            Interval::Closed {
                paused_at,
                unpaused_at,
            } => write!(
                f,
                "paused at {paused_at} for {}s",
                (unpaused_at - paused_at).num_seconds()
            ),
        }
    }
}
