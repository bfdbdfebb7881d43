use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{SessionType, TimerState};

/// Every state change made through the service produces an Event.
/// Presentation surfaces subscribe to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        session_type: SessionType,
        minutes: u32,
        custom: bool,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_seconds: u32,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_seconds: u32,
        at: DateTime<Utc>,
    },
    /// The countdown reached zero and the rotation was applied.
    TimerCompleted {
        session_type: SessionType,
        next_session_type: SessionType,
        completed_pomodoros: u32,
        current_cycle: u32,
        at: DateTime<Utc>,
    },
    /// A running or paused countdown was abandoned.
    TimerStopped {
        session_type: SessionType,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        session_type: SessionType,
        remaining_seconds: u32,
        completed_pomodoros: u32,
        current_cycle: u32,
        at: DateTime<Utc>,
    },
}
