//! Countdown timer implementation.
//!
//! The countdown is a tick-driven state machine. It does not use internal
//! threads - the owner is responsible for calling `tick()` once per second.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Paused -> Running -> Completed
//!            \________\___________\__________\--> Idle (stop)
//! ```
//!
//! `Ready` is only entered through `reset(minutes)`, which arms the
//! countdown without starting it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::clock::{system_clock, Clock};
use super::pause::PauseRecord;
use super::session_type::SessionType;
use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Ready,
    Running,
    Paused,
    Completed,
}

/// A single countdown and its pause history.
///
/// Mutation is crate-private: the owning [`Session`](crate::Session) is the
/// only driver of a countdown.
#[derive(Debug)]
pub struct CountdownTimer {
    remaining_seconds: u32,
    initial_duration_minutes: u32,
    state: TimerState,
    session_type: SessionType,
    started_at: Option<DateTime<Utc>>,
    stopped_at: Option<DateTime<Utc>>,
    /// Open pause; only `Some` while `Paused`.
    current_pause: Option<PauseRecord>,
    pause_records: Vec<PauseRecord>,
    clock: Arc<dyn Clock>,
}

impl Default for CountdownTimer {
    fn default() -> Self {
        Self::new(system_clock())
    }
}

impl CountdownTimer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            remaining_seconds: 0,
            initial_duration_minutes: 0,
            state: TimerState::Idle,
            session_type: SessionType::Work,
            started_at: None,
            stopped_at: None,
            current_pause: None,
            pause_records: Vec::new(),
            clock,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn initial_duration_minutes(&self) -> u32 {
        self.initial_duration_minutes
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn is_paused(&self) -> bool {
        self.state == TimerState::Paused
    }

    pub fn is_completed(&self) -> bool {
        self.state == TimerState::Completed
    }

    pub fn session_type(&self) -> SessionType {
        self.session_type
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn stopped_at(&self) -> Option<DateTime<Utc>> {
        self.stopped_at
    }

    /// Finished pauses of the current (or just stopped) countdown.
    pub fn pause_records(&self) -> &[PauseRecord] {
        &self.pause_records
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub(crate) fn set_session_type(&mut self, session_type: SessionType) {
        self.session_type = session_type;
    }

    /// Start a countdown of `minutes`, discarding the previous pause history.
    pub(crate) fn start(&mut self, minutes: i32) -> Result<()> {
        let seconds = seconds_for(minutes)?;
        if self.state == TimerState::Running {
            return Err(CoreError::invalid_state("Timer is already running"));
        }
        self.remaining_seconds = seconds;
        self.initial_duration_minutes = minutes.unsigned_abs();
        self.state = TimerState::Running;
        self.started_at = Some(self.clock.now());
        self.clear_history();
        Ok(())
    }

    pub(crate) fn pause(&mut self) -> Result<()> {
        if self.state != TimerState::Running {
            return Err(CoreError::invalid_state("Timer is not running"));
        }
        self.state = TimerState::Paused;
        self.current_pause = Some(PauseRecord::open(self.clock.now()));
        Ok(())
    }

    pub(crate) fn resume(&mut self) -> Result<()> {
        if self.state != TimerState::Paused {
            return Err(CoreError::invalid_state("Timer is not paused"));
        }
        if self.remaining_seconds > 0 {
            self.state = TimerState::Running;
            self.close_current_pause();
        }
        Ok(())
    }

    /// Stop the countdown. Pause history stays readable until the next start.
    pub(crate) fn stop(&mut self) {
        if self.started_at.is_some() {
            self.stopped_at = Some(self.clock.now());
            self.close_current_pause();
        }
        self.state = TimerState::Idle;
        self.remaining_seconds = 0;
    }

    /// Arm the countdown with `minutes` without starting it.
    #[cfg_attr(not(test), allow(dead_code))]
    pub(crate) fn reset(&mut self, minutes: i32) -> Result<()> {
        self.remaining_seconds = seconds_for(minutes)?;
        self.state = TimerState::Ready;
        Ok(())
    }

    /// Advance by one second. Returns `true` exactly when this tick reaches zero.
    pub(crate) fn tick(&mut self) -> bool {
        if self.state != TimerState::Running || self.remaining_seconds == 0 {
            return false;
        }
        self.remaining_seconds -= 1;
        if self.remaining_seconds == 0 {
            self.state = TimerState::Completed;
            return true;
        }
        false
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn close_current_pause(&mut self) {
        if let Some(open) = self.current_pause.take() {
            self.pause_records.push(open.close(self.clock.now()));
        }
    }

    fn clear_history(&mut self) {
        self.pause_records.clear();
        self.stopped_at = None;
        self.current_pause = None;
    }
}

fn seconds_for(minutes: i32) -> Result<u32> {
    if minutes <= 0 {
        return Err(CoreError::invalid_argument("Minutes must be greater than 0"));
    }
    minutes
        .unsigned_abs()
        .checked_mul(60)
        .ok_or_else(|| CoreError::invalid_argument(format!("{minutes} minutes is too long")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::clock::ManualClock;
    use chrono::{Duration, TimeZone};

    fn clocked() -> (CountdownTimer, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap());
        (CountdownTimer::new(Arc::new(clock.clone())), clock)
    }

    #[test]
    fn starts_idle() {
        let timer = CountdownTimer::default();
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.remaining_seconds(), 0);
        assert_eq!(timer.session_type(), SessionType::Work);
        assert!(timer.started_at().is_none());
    }

    #[test]
    fn start_pause_resume() {
        let mut timer = CountdownTimer::default();
        timer.start(10).unwrap();
        assert_eq!(timer.state(), TimerState::Running);
        assert_eq!(timer.remaining_seconds(), 600);
        assert_eq!(timer.initial_duration_minutes(), 10);

        timer.pause().unwrap();
        assert_eq!(timer.state(), TimerState::Paused);

        timer.resume().unwrap();
        assert_eq!(timer.state(), TimerState::Running);
    }

    #[test]
    fn start_rejects_non_positive_minutes() {
        let mut timer = CountdownTimer::default();
        assert!(matches!(timer.start(0), Err(CoreError::InvalidArgument(_))));
        assert!(matches!(timer.start(-1), Err(CoreError::InvalidArgument(_))));
        assert_eq!(timer.state(), TimerState::Idle);
    }

    #[test]
    fn start_twice_is_invalid_state() {
        let mut timer = CountdownTimer::default();
        timer.start(5).unwrap();
        assert!(matches!(timer.start(5), Err(CoreError::InvalidState(_))));
        assert_eq!(timer.remaining_seconds(), 300);
    }

    #[test]
    fn start_is_allowed_while_paused_or_completed() {
        let mut timer = CountdownTimer::default();
        timer.start(1).unwrap();
        timer.pause().unwrap();
        timer.start(2).unwrap();
        assert_eq!(timer.remaining_seconds(), 120);

        for _ in 0..120 {
            timer.tick();
        }
        assert!(timer.is_completed());
        timer.start(1).unwrap();
        assert!(timer.is_running());
    }

    #[test]
    fn pause_requires_running() {
        let mut timer = CountdownTimer::default();
        assert!(matches!(timer.pause(), Err(CoreError::InvalidState(_))));

        timer.start(1).unwrap();
        timer.pause().unwrap();
        assert!(matches!(timer.pause(), Err(CoreError::InvalidState(_))));

        timer.resume().unwrap();
        for _ in 0..60 {
            timer.tick();
        }
        assert!(timer.is_completed());
        assert!(matches!(timer.pause(), Err(CoreError::InvalidState(_))));
    }

    #[test]
    fn resume_requires_paused() {
        let mut timer = CountdownTimer::default();
        assert!(matches!(timer.resume(), Err(CoreError::InvalidState(_))));
        timer.start(1).unwrap();
        assert!(matches!(timer.resume(), Err(CoreError::InvalidState(_))));
    }

    #[test]
    fn ticks_until_exactly_zero() {
        let mut timer = CountdownTimer::default();
        timer.start(2).unwrap();
        for _ in 0..119 {
            assert!(!timer.tick());
        }
        assert!(timer.tick());
        assert_eq!(timer.state(), TimerState::Completed);
        assert_eq!(timer.remaining_seconds(), 0);
        assert!(!timer.tick());
    }

    #[test]
    fn tick_is_ignored_unless_running() {
        let mut timer = CountdownTimer::default();
        assert!(!timer.tick());

        timer.start(1).unwrap();
        timer.pause().unwrap();
        assert!(!timer.tick());
        assert_eq!(timer.remaining_seconds(), 60);
    }

    #[test]
    fn pause_round_trip_records_exact_interval() {
        let (mut timer, clock) = clocked();
        timer.start(10).unwrap();

        clock.advance(Duration::seconds(30));
        let t0 = clock.now();
        timer.pause().unwrap();

        clock.advance(Duration::seconds(47));
        let t1 = clock.now();
        timer.resume().unwrap();

        let pauses = timer.pause_records();
        assert_eq!(pauses.len(), 1);
        assert_eq!(pauses[0], PauseRecord::closed(t0, t1).unwrap());
        assert_eq!(pauses[0].pause_duration_seconds(), (t1 - t0).num_seconds());
    }

    #[test]
    fn stop_closes_open_pause_and_keeps_history() {
        let (mut timer, clock) = clocked();
        timer.start(10).unwrap();
        timer.pause().unwrap();
        clock.advance(Duration::seconds(5));
        timer.resume().unwrap();
        timer.pause().unwrap();
        clock.advance(Duration::seconds(8));

        timer.stop();
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.remaining_seconds(), 0);
        assert_eq!(timer.stopped_at(), Some(clock.now()));

        let durations: Vec<i64> = timer
            .pause_records()
            .iter()
            .map(PauseRecord::pause_duration_seconds)
            .collect();
        assert_eq!(durations, vec![5, 8]);
    }

    #[test]
    fn stop_before_start_records_nothing() {
        let mut timer = CountdownTimer::default();
        timer.stop();
        assert_eq!(timer.state(), TimerState::Idle);
        assert!(timer.stopped_at().is_none());
    }

    #[test]
    fn start_clears_previous_history() {
        let (mut timer, clock) = clocked();
        timer.start(10).unwrap();
        timer.pause().unwrap();
        clock.advance(Duration::seconds(3));
        timer.stop();
        assert_eq!(timer.pause_records().len(), 1);

        timer.start(10).unwrap();
        assert!(timer.pause_records().is_empty());
        assert!(timer.stopped_at().is_none());
    }

    #[test]
    fn reset_arms_without_starting() {
        let mut timer = CountdownTimer::default();
        timer.reset(3).unwrap();
        assert_eq!(timer.state(), TimerState::Ready);
        assert_eq!(timer.remaining_seconds(), 180);
        assert!(!timer.tick());
        assert!(matches!(timer.reset(0), Err(CoreError::InvalidArgument(_))));
    }
}
