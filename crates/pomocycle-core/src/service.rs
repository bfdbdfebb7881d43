//! Application layer around a [`Session`].
//!
//! [`TimerService`] turns user commands and ticks into session operations and
//! fans the results out to the tick source, the notification sink and the
//! history store. It assumes a single writer: the embedding application must
//! serialize calls (the CLI confines the service to one task).

use std::sync::Arc;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::events::Event;
use crate::ports::{HistoryStore, NotificationSink, TickSource};
use crate::record::{DailyStatistics, TimerRecord};
use crate::session::Session;
use crate::timer::{system_clock, Clock, SessionType, TimerState};

/// What a presentation surface needs to render the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerStateView {
    pub remaining_seconds: u32,
    pub state: TimerState,
    pub session_type: SessionType,
    pub completed_pomodoros: u32,
    pub current_cycle: u32,
}

pub struct TimerService<T, N, H> {
    session: Session,
    ticker: T,
    notifier: N,
    history: H,
    clock: Arc<dyn Clock>,
    /// Session-started events emitted by the session's handler.
    started: UnboundedReceiver<Event>,
    subscribers: Vec<UnboundedSender<Event>>,
}

impl<T, N, H> TimerService<T, N, H>
where
    T: TickSource,
    N: NotificationSink,
    H: HistoryStore,
{
    pub fn new(ticker: T, notifier: N, history: H) -> Self {
        Self::with_clock(ticker, notifier, history, system_clock())
    }

    /// Build the service and seed the session from today's statistics.
    ///
    /// A store that cannot load statistics yields a fresh day.
    pub fn with_clock(ticker: T, notifier: N, mut history: H, clock: Arc<dyn Clock>) -> Self {
        let stats = history.load_today_statistics().unwrap_or_else(|err| {
            error!(%err, "failed to load today's statistics, starting from zero");
            DailyStatistics::empty(clock.now().with_timezone(&Local).date_naive())
        });

        let (tx, started) = mpsc::unbounded_channel();
        let handler_clock = Arc::clone(&clock);
        let mut session = Session::with_handler(move |session_type: SessionType, minutes: u32| {
            let _ = tx.send(Event::SessionStarted {
                session_type,
                minutes,
                custom: session_type.is_custom(minutes),
                at: handler_clock.now(),
            });
        })
        .with_clock(Arc::clone(&clock));
        session.initialize_from_today_stats(&stats);

        info!(
            completed_pomodoros = stats.completed_pomodoros(),
            current_cycle = stats.current_cycle(),
            "restored session state"
        );

        Self {
            session,
            ticker,
            notifier,
            history,
            clock,
            started,
            subscribers: Vec::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn ticker(&self) -> &T {
        &self.ticker
    }

    pub fn ticker_mut(&mut self) -> &mut T {
        &mut self.ticker
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn current_state(&self) -> TimerStateView {
        let memento = self.session.create_timer_memento();
        TimerStateView {
            remaining_seconds: memento.remaining_seconds,
            state: memento.state,
            session_type: memento.session_type,
            completed_pomodoros: self.session.completed_pomodoros(),
            current_cycle: self.session.current_cycle(),
        }
    }

    pub fn snapshot(&self) -> Event {
        let memento = self.session.create_timer_memento();
        Event::StateSnapshot {
            state: memento.state,
            session_type: memento.session_type,
            remaining_seconds: memento.remaining_seconds,
            completed_pomodoros: self.session.completed_pomodoros(),
            current_cycle: self.session.current_cycle(),
            at: memento.timestamp,
        }
    }

    /// Receive every event published from now on.
    pub fn subscribe(&mut self) -> UnboundedReceiver<Event> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start the current session type with its default duration.
    pub fn start_normal(&mut self) -> Result<bool> {
        let started = self.session.start_session()?;
        if !started {
            debug!("start ignored, timer already running");
        }
        self.dispatch_started();
        Ok(started)
    }

    pub fn start_custom(&mut self, minutes: i32) -> Result<bool> {
        let started = self.session.start_custom_session(minutes)?;
        if !started {
            debug!(minutes, "custom start ignored, timer already running");
        }
        self.dispatch_started();
        Ok(started)
    }

    pub fn pause(&mut self) -> bool {
        if !self.session.pause_timer() {
            debug!("pause ignored, timer not running");
            return false;
        }
        self.ticker.pause_ticking();
        let remaining_seconds = self.session.timer().remaining_seconds();
        info!(remaining_seconds, "timer paused");
        self.publish(Event::TimerPaused {
            remaining_seconds,
            at: self.clock.now(),
        });
        true
    }

    pub fn resume(&mut self) -> bool {
        if !self.session.resume_timer() {
            debug!("resume ignored, timer not paused");
            return false;
        }
        self.ticker.resume_ticking();
        let remaining_seconds = self.session.timer().remaining_seconds();
        info!(remaining_seconds, "timer resumed");
        self.publish(Event::TimerResumed {
            remaining_seconds,
            at: self.clock.now(),
        });
        true
    }

    /// Abandon any active countdown and return to the start of a cycle.
    pub fn reset(&mut self) {
        self.save_abandoned();
        self.session.reset_timer();
        self.ticker.stop_ticking();
        info!("timer reset");
        self.publish(Event::TimerReset {
            at: self.clock.now(),
        });
    }

    /// Same bookkeeping as [`reset`](Self::reset), reported as a stop.
    pub fn stop(&mut self) {
        let session_type = self.session.timer_session_type();
        self.save_abandoned();
        self.session.reset_timer();
        self.ticker.stop_ticking();
        info!(%session_type, "timer stopped");
        self.publish(Event::TimerStopped {
            session_type,
            at: self.clock.now(),
        });
    }

    /// Called by the tick source once per second.
    ///
    /// Returns the next session type when this tick finished the countdown.
    pub fn on_tick(&mut self) -> Result<Option<SessionType>> {
        self.notifier.on_tick();
        if !self.session.tick() {
            return Ok(None);
        }
        self.complete().map(Some)
    }

    pub fn shutdown(&mut self) {
        self.ticker.stop_ticking();
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete(&mut self) -> Result<SessionType> {
        self.ticker.stop_ticking();
        self.notifier.on_alarm();

        let completed = self.session.timer_session_type();
        let record = self.session.create_timer_record(self.clock.now())?;
        self.persist(&record);

        let next = self.session.handle_timer_completion()?;
        info!(
            %completed,
            %next,
            completed_pomodoros = self.session.completed_pomodoros(),
            current_cycle = self.session.current_cycle(),
            "session completed"
        );
        self.notifier.on_session_completed(completed, next);
        self.publish(Event::TimerCompleted {
            session_type: completed,
            next_session_type: next,
            completed_pomodoros: self.session.completed_pomodoros(),
            current_cycle: self.session.current_cycle(),
            at: self.clock.now(),
        });
        Ok(next)
    }

    /// Stop an active countdown and store it as a stopped record.
    fn save_abandoned(&mut self) {
        if !(self.session.is_timer_running() || self.session.is_timer_paused()) {
            return;
        }
        self.session.stop_timer();
        let finished_at = self
            .session
            .timer()
            .stopped_at()
            .unwrap_or_else(|| self.clock.now());
        match self.session.create_timer_record(finished_at) {
            Ok(record) => self.persist(&record),
            Err(err) => warn!(%err, "could not build record for stopped timer"),
        }
    }

    fn persist(&mut self, record: &TimerRecord) {
        match self.history.save_record(record) {
            Ok(()) => debug!(%record, "saved timer record"),
            Err(err) => error!(%err, "failed to save timer record"),
        }
    }

    fn dispatch_started(&mut self) {
        while let Ok(event) = self.started.try_recv() {
            if let Event::SessionStarted {
                session_type,
                minutes,
                custom,
                ..
            } = &event
            {
                info!(%session_type, minutes, custom, "session started");
                self.ticker.start_ticking();
            }
            self.publish(event);
        }
    }

    fn publish(&mut self, event: Event) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
