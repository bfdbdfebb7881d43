//! Pomodoro rotation and bookkeeping.
//!
//! A [`Session`] owns exactly one [`CountdownTimer`] and is the only thing
//! allowed to drive it. It counts completed pomodoros, tracks the position in
//! the current cycle and decides which session type comes next:
//!
//! ```text
//! Work -> Short Break -> Work -> ... (4th Work) -> Long Break -> Work
//! ```

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{CoreError, Result};
use crate::record::{DailyStatistics, FinishReason, TimerMemento, TimerRecord};
use crate::timer::{system_clock, Clock, CountdownTimer, SessionType};

/// Work sessions per cycle; completing this many triggers a long break.
pub const POMODOROS_BEFORE_LONG_BREAK: u32 = 4;

/// Observer invoked synchronously whenever a session starts.
pub trait SessionEventHandler: Send {
    fn on_session_started(&mut self, session_type: SessionType, minutes: u32);
}

impl<F> SessionEventHandler for F
where
    F: FnMut(SessionType, u32) + Send,
{
    fn on_session_started(&mut self, session_type: SessionType, minutes: u32) {
        self(session_type, minutes)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventHandler;

impl SessionEventHandler for NoopEventHandler {
    fn on_session_started(&mut self, _session_type: SessionType, _minutes: u32) {}
}

/// Session type that follows `current`, given the cycle count after any
/// increment for the session that just finished.
pub fn next_session_type(current: SessionType, current_cycle: u32) -> SessionType {
    match current {
        SessionType::Work if current_cycle >= POMODOROS_BEFORE_LONG_BREAK => {
            SessionType::LongBreak
        }
        SessionType::Work => SessionType::ShortBreak,
        SessionType::ShortBreak | SessionType::LongBreak => SessionType::Work,
    }
}

pub struct Session {
    completed_pomodoros: u32,
    current_cycle: u32,
    current_session_type: SessionType,
    current_session_minutes: u32,
    timer: CountdownTimer,
    event_handler: Box<dyn SessionEventHandler>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("completed_pomodoros", &self.completed_pomodoros)
            .field("current_cycle", &self.current_cycle)
            .field("current_session_type", &self.current_session_type)
            .field("current_session_minutes", &self.current_session_minutes)
            .field("timer", &self.timer)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_handler(NoopEventHandler)
    }

    pub fn with_handler(handler: impl SessionEventHandler + 'static) -> Self {
        Self {
            completed_pomodoros: 0,
            current_cycle: 0,
            current_session_type: SessionType::Work,
            current_session_minutes: 0,
            timer: CountdownTimer::new(system_clock()),
            event_handler: Box::new(handler),
        }
    }

    /// Replace the time source used for start, stop and pause timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.timer = CountdownTimer::new(clock);
        self
    }

    /// Seed the counters from the history store's tally for today.
    pub fn initialize_from_today_stats(&mut self, stats: &DailyStatistics) {
        self.completed_pomodoros = stats.completed_pomodoros();
        self.current_cycle = stats.current_cycle();
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn completed_pomodoros(&self) -> u32 {
        self.completed_pomodoros
    }

    pub fn current_cycle(&self) -> u32 {
        self.current_cycle
    }

    pub fn current_session_type(&self) -> SessionType {
        self.current_session_type
    }

    /// Minutes the last started countdown was started with.
    pub fn current_session_minutes(&self) -> u32 {
        self.current_session_minutes
    }

    /// Read-only access to the owned countdown.
    pub fn timer(&self) -> &CountdownTimer {
        &self.timer
    }

    pub fn timer_session_type(&self) -> SessionType {
        self.timer.session_type()
    }

    pub fn is_timer_running(&self) -> bool {
        self.timer.is_running()
    }

    pub fn is_timer_paused(&self) -> bool {
        self.timer.is_paused()
    }

    pub fn is_timer_completed(&self) -> bool {
        self.timer.is_completed()
    }

    pub fn is_timer_started(&self) -> bool {
        self.timer.started_at().is_some() && self.timer.initial_duration_minutes() > 0
    }

    /// The countdown was started and then ended without completing.
    pub fn was_timer_stopped(&self) -> bool {
        !self.timer.is_running() && !self.timer.is_completed() && self.timer.started_at().is_some()
    }

    pub fn create_timer_memento(&self) -> TimerMemento {
        TimerMemento {
            session_type: self.timer.session_type(),
            remaining_seconds: self.timer.remaining_seconds(),
            timestamp: self.timer.now(),
            state: self.timer.state(),
        }
    }

    /// Build the record of the current countdown as of `finished_at`.
    pub fn create_timer_record(&self, finished_at: DateTime<Utc>) -> Result<TimerRecord> {
        let started_at = self
            .timer
            .started_at()
            .ok_or_else(|| CoreError::invalid_state("Timer was never started"))?;
        let reason = if self.is_timer_started() && self.is_timer_completed() {
            FinishReason::Completed
        } else {
            FinishReason::Stopped
        };
        TimerRecord::new(
            started_at,
            finished_at,
            reason,
            self.timer.session_type(),
            self.timer.initial_duration_minutes(),
            "",
            self.timer.pause_records().to_vec(),
        )
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start the current session type with its default duration.
    ///
    /// Returns `Ok(false)` without effect if the countdown is already running.
    pub fn start_session(&mut self) -> Result<bool> {
        let minutes = self.current_session_type.default_minutes();
        self.begin(minutes as i32)
    }

    /// Start the current session type with a custom duration.
    pub fn start_custom_session(&mut self, minutes: i32) -> Result<bool> {
        self.begin(minutes)
    }

    pub fn pause_timer(&mut self) -> bool {
        if !self.timer.is_running() {
            return false;
        }
        self.timer.pause().is_ok()
    }

    pub fn resume_timer(&mut self) -> bool {
        if !self.timer.is_paused() {
            return false;
        }
        self.timer.resume().is_ok()
    }

    /// Stop the countdown without touching the rotation.
    pub fn stop_timer(&mut self) {
        self.timer.stop();
    }

    /// Stop the countdown and return to the start of a cycle.
    ///
    /// `completed_pomodoros` is kept.
    pub fn reset_timer(&mut self) {
        self.timer.stop();
        self.reset();
        self.timer.set_session_type(SessionType::Work);
    }

    /// Like [`reset_timer`](Self::reset_timer) but also zeroes the day's count.
    pub fn reset_daily(&mut self) {
        self.completed_pomodoros = 0;
        self.reset_timer();
    }

    pub fn tick(&mut self) -> bool {
        self.timer.tick()
    }

    /// Apply the rotation rule after the countdown reached zero.
    ///
    /// The countdown stays `Completed` until the next start.
    pub fn handle_timer_completion(&mut self) -> Result<SessionType> {
        if !self.timer.is_completed() {
            return Err(CoreError::invalid_state("Timer not completed"));
        }
        if self.timer.session_type() == SessionType::Work {
            self.completed_pomodoros += 1;
            self.current_cycle += 1;
        }

        let next = next_session_type(self.current_session_type, self.current_cycle);
        if next == SessionType::LongBreak {
            self.current_cycle = 0;
        }
        self.current_session_type = next;
        self.timer.set_session_type(next);
        Ok(next)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn begin(&mut self, minutes: i32) -> Result<bool> {
        if self.timer.is_running() {
            return Ok(false);
        }
        let session_type = self.current_session_type;
        let previous_type = self.timer.session_type();
        self.timer.set_session_type(session_type);
        if let Err(err) = self.timer.start(minutes) {
            self.timer.set_session_type(previous_type);
            return Err(err);
        }
        self.current_session_minutes = self.timer.initial_duration_minutes();
        self.event_handler
            .on_session_started(session_type, self.current_session_minutes);
        Ok(true)
    }

    fn reset(&mut self) {
        self.current_cycle = 0;
        self.current_session_type = SessionType::Work;
    }
}
