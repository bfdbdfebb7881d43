//! Integration tests for the timer service.
//!
//! Drives a full work/break flow through `TimerService` with an in-memory
//! SQLite history and a manual clock, the way the CLI wires it up.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use pomocycle_core::{
    Clock, Database, Event, FinishReason, HistoryStore, LogNotifier, ManualClock,
    NotificationSink, SessionType, TickSource, TimerService, TimerState,
};

#[derive(Debug, Default)]
struct RecordingTicker {
    active: bool,
    paused: bool,
    starts: u32,
}

impl TickSource for RecordingTicker {
    fn start_ticking(&mut self) {
        self.active = true;
        self.paused = false;
        self.starts += 1;
    }
    fn stop_ticking(&mut self) {
        self.active = false;
        self.paused = false;
    }
    fn pause_ticking(&mut self) {
        self.paused = true;
    }
    fn resume_ticking(&mut self) {
        self.paused = false;
    }
}

#[derive(Debug, Default)]
struct RecordingSink {
    ticks: u32,
    alarms: u32,
    completions: Vec<(SessionType, SessionType)>,
}

impl NotificationSink for RecordingSink {
    fn on_tick(&mut self) {
        self.ticks += 1;
    }
    fn on_alarm(&mut self) {
        self.alarms += 1;
    }
    fn on_session_completed(&mut self, completed: SessionType, next: SessionType) {
        self.completions.push((completed, next));
    }
}

type Service<S> = TimerService<RecordingTicker, S, Database>;

fn clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap())
}

fn service_with<S: NotificationSink>(sink: S, clock: &ManualClock) -> Service<S> {
    TimerService::with_clock(
        RecordingTicker::default(),
        sink,
        Database::open_memory().unwrap(),
        Arc::new(clock.clone()),
    )
}

/// Tick once per simulated second until the countdown ends.
fn run_out<S: NotificationSink>(svc: &mut Service<S>, clock: &ManualClock) -> SessionType {
    loop {
        assert!(svc.ticker().active && !svc.ticker().paused);
        clock.advance(Duration::seconds(1));
        if let Some(next) = svc.on_tick().unwrap() {
            return next;
        }
    }
}

#[test]
fn completed_work_session_is_recorded_and_rotated() {
    let clock = clock();
    let mut svc = service_with(RecordingSink::default(), &clock);
    let mut events = svc.subscribe();

    assert!(svc.start_normal().unwrap());
    assert_eq!(svc.ticker().starts, 1);

    let next = run_out(&mut svc, &clock);
    assert_eq!(next, SessionType::ShortBreak);
    assert!(!svc.ticker().active);
    assert_eq!(svc.notifier().ticks, 1500);
    assert_eq!(svc.notifier().alarms, 1);
    assert_eq!(
        svc.notifier().completions,
        vec![(SessionType::Work, SessionType::ShortBreak)]
    );

    let view = svc.current_state();
    assert_eq!(view.completed_pomodoros, 1);
    assert_eq!(view.current_cycle, 1);
    assert_eq!(view.session_type, SessionType::ShortBreak);
    assert_eq!(view.state, TimerState::Completed);

    let records = svc.history().all_records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].reason(), FinishReason::Completed);
    assert_eq!(records[0].session_type(), SessionType::Work);
    assert_eq!(records[0].duration_minutes(), 25);
    assert_eq!(
        records[0].finished_at() - records[0].started_at(),
        Duration::seconds(1500)
    );

    assert!(matches!(events.try_recv().unwrap(), Event::SessionStarted { .. }));
    assert!(matches!(
        events.try_recv().unwrap(),
        Event::TimerCompleted {
            session_type: SessionType::Work,
            next_session_type: SessionType::ShortBreak,
            completed_pomodoros: 1,
            current_cycle: 1,
            ..
        }
    ));
}

#[test]
fn next_start_uses_the_rotated_type() {
    let clock = clock();
    let mut svc = service_with(RecordingSink::default(), &clock);
    svc.start_custom(1).unwrap();
    run_out(&mut svc, &clock);

    assert!(svc.start_normal().unwrap());
    assert_eq!(svc.current_state().session_type, SessionType::ShortBreak);
    assert_eq!(svc.current_state().remaining_seconds, 300);
    assert_eq!(run_out(&mut svc, &clock), SessionType::Work);
    assert_eq!(svc.current_state().completed_pomodoros, 1);
}

#[test]
fn pauses_are_carried_into_the_record() {
    let clock = clock();
    let mut svc = service_with(RecordingSink::default(), &clock);
    svc.start_custom(1).unwrap();

    clock.advance(Duration::seconds(10));
    for _ in 0..10 {
        svc.on_tick().unwrap();
    }
    assert!(svc.pause());
    assert!(svc.ticker().paused);
    clock.advance(Duration::seconds(90));
    assert!(svc.resume());

    run_out(&mut svc, &clock);
    let record = &svc.history().all_records().unwrap()[0];
    assert_eq!(record.pause_count(), 1);
    assert_eq!(record.total_paused_seconds(), 90);
}

#[test]
fn stopping_a_paused_session_saves_a_stopped_record() {
    let clock = clock();
    let mut svc = service_with(RecordingSink::default(), &clock);
    svc.start_normal().unwrap();
    svc.pause();
    clock.advance(Duration::seconds(45));

    svc.stop();
    assert!(!svc.ticker().active);

    let records = svc.history().all_records().unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].was_stopped());
    assert_eq!(records[0].total_paused_seconds(), 45);
    assert_eq!(records[0].finished_at(), clock.now());

    let view = svc.current_state();
    assert_eq!(view.state, TimerState::Idle);
    assert_eq!(view.session_type, SessionType::Work);
    assert_eq!(view.completed_pomodoros, 0);
}

#[test]
fn reset_while_running_saves_and_keeps_pomodoros() {
    let clock = clock();
    let mut svc = service_with(RecordingSink::default(), &clock);
    svc.start_custom(1).unwrap();
    run_out(&mut svc, &clock);

    svc.start_normal().unwrap();
    clock.advance(Duration::seconds(30));
    svc.reset();

    let records = svc.history().all_records().unwrap();
    assert_eq!(records.len(), 2);
    assert!(records[0].was_stopped());
    assert_eq!(records[0].session_type(), SessionType::ShortBreak);

    let view = svc.current_state();
    assert_eq!(view.completed_pomodoros, 1);
    assert_eq!(view.current_cycle, 0);
    assert_eq!(view.session_type, SessionType::Work);
}

#[test]
fn reset_when_idle_saves_nothing() {
    let clock = clock();
    let mut svc = service_with(RecordingSink::default(), &clock);
    svc.reset();
    svc.stop();
    assert!(svc.history().all_records().unwrap().is_empty());
}

#[test]
fn seeds_from_existing_history() {
    let clock = ManualClock::new(Utc::now() - Duration::minutes(10));
    let mut svc = service_with(RecordingSink::default(), &clock);
    for _ in 0..3 {
        svc.start_custom(1).unwrap();
        let next = run_out(&mut svc, &clock);
        // Skip the break so every record is a pomodoro.
        assert!(next.is_break());
        svc.reset();
    }

    let mut db = Database::open_memory().unwrap();
    for record in svc.history().all_records().unwrap() {
        db.save_record(&record).unwrap();
    }
    let stats = db.load_today_statistics().unwrap();

    let reseeded = TimerService::with_clock(
        RecordingTicker::default(),
        LogNotifier::default(),
        db,
        Arc::new(ManualClock::new(Utc::now())),
    );
    let view = reseeded.current_state();
    assert_eq!(view.completed_pomodoros, stats.completed_pomodoros());
    assert_eq!(view.current_cycle, stats.completed_pomodoros() % 4);
    assert_eq!(view.state, TimerState::Idle);
}
