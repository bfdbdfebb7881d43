//! Value types handed out of a [`Session`](crate::Session): finished-session
//! records, point-in-time snapshots and the daily statistics seed.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::session::POMODOROS_BEFORE_LONG_BREAK;
use crate::timer::{PauseRecord, SessionType, TimerState};

/// Why a countdown ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinishReason {
    Completed,
    Stopped,
}

impl FinishReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            FinishReason::Completed => "COMPLETED",
            FinishReason::Stopped => "STOPPED",
        }
    }
}

impl FromStr for FinishReason {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "COMPLETED" => Ok(FinishReason::Completed),
            "STOPPED" => Ok(FinishReason::Stopped),
            other => Err(CoreError::invalid_argument(format!(
                "unknown finish reason: {other}"
            ))),
        }
    }
}

/// The durable fact of one finished or stopped countdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerRecord {
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    reason: FinishReason,
    session_type: SessionType,
    duration_minutes: u32,
    #[serde(default)]
    description: String,
    #[serde(default)]
    pause_records: Vec<PauseRecord>,
}

impl TimerRecord {
    /// Validates `duration_minutes > 0` and `started_at <= finished_at`.
    pub fn new(
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        reason: FinishReason,
        session_type: SessionType,
        duration_minutes: u32,
        description: impl Into<String>,
        pause_records: Vec<PauseRecord>,
    ) -> Result<Self> {
        if duration_minutes == 0 {
            return Err(CoreError::invalid_argument(
                "duration_minutes must be greater than 0",
            ));
        }
        if started_at > finished_at {
            return Err(CoreError::invalid_argument(
                "record cannot finish before it starts",
            ));
        }
        Ok(Self {
            started_at,
            finished_at,
            reason,
            session_type,
            duration_minutes,
            description: description.into(),
            pause_records,
        })
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    pub fn reason(&self) -> FinishReason {
        self.reason
    }

    pub fn session_type(&self) -> SessionType {
        self.session_type
    }

    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn pause_records(&self) -> &[PauseRecord] {
        &self.pause_records
    }

    pub fn was_completed(&self) -> bool {
        self.reason == FinishReason::Completed
    }

    pub fn was_stopped(&self) -> bool {
        self.reason == FinishReason::Stopped
    }

    pub fn pause_count(&self) -> usize {
        self.pause_records.len()
    }

    /// Sum of closed pauses; an open pause contributes nothing.
    pub fn total_paused_seconds(&self) -> i64 {
        self.pause_records
            .iter()
            .filter(|p| !p.is_still_paused())
            .map(PauseRecord::pause_duration_seconds)
            .sum()
    }
}

impl fmt::Display for TimerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} min {} ({} -> {}, {} pauses, {}s paused)",
            self.session_type,
            self.duration_minutes,
            self.reason.as_str(),
            self.started_at,
            self.finished_at,
            self.pause_count(),
            self.total_paused_seconds()
        )
    }
}

/// Point-in-time view of the countdown, for display and queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerMemento {
    pub session_type: SessionType,
    pub remaining_seconds: u32,
    pub timestamp: DateTime<Utc>,
    pub state: TimerState,
}

/// A day's tally, used once at startup to seed the session counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStatistics {
    date: NaiveDate,
    completed_pomodoros: u32,
    current_cycle: u32,
}

impl DailyStatistics {
    pub fn new(date: NaiveDate, completed_pomodoros: u32, current_cycle: u32) -> Result<Self> {
        if current_cycle >= POMODOROS_BEFORE_LONG_BREAK {
            return Err(CoreError::invalid_argument(format!(
                "current_cycle must be below {POMODOROS_BEFORE_LONG_BREAK}, got {current_cycle}"
            )));
        }
        Ok(Self {
            date,
            completed_pomodoros,
            current_cycle,
        })
    }

    /// Seed from a raw count of completed pomodoros.
    ///
    /// The cycle is `completed % 4`. This drifts from the live cycle if a
    /// work session was stopped mid-cycle; kept as-is for compatibility
    /// with existing histories.
    pub fn from_completed(date: NaiveDate, completed_pomodoros: u32) -> Self {
        Self {
            date,
            completed_pomodoros,
            current_cycle: completed_pomodoros % POMODOROS_BEFORE_LONG_BREAK,
        }
    }

    pub fn empty(date: NaiveDate) -> Self {
        Self::from_completed(date, 0)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn completed_pomodoros(&self) -> u32 {
        self.completed_pomodoros
    }

    pub fn current_cycle(&self) -> u32 {
        self.current_cycle
    }
}
