//! # Pomocycle Core Library
//!
//! This library provides the core logic for the Pomocycle Pomodoro timer: the
//! countdown state machine, the work/break rotation, and the records written
//! when a countdown finishes or is stopped. The `pomocycle` CLI is a thin
//! layer over the same library.
//!
//! ## Architecture
//!
//! - **Timer**: a tick-driven countdown that keeps an exact pause history;
//!   the caller invokes `tick()` once per second
//! - **Session**: owns the countdown and applies the Pomodoro rotation
//!   (work, short break, ... long break after four pomodoros)
//! - **Service**: application layer wiring a session to a tick source,
//!   a notification sink and a history store
//! - **Storage**: SQLite history and TOML configuration
//!
//! ## Key Components
//!
//! - [`Session`]: rotation rules and pomodoro bookkeeping
//! - [`TimerService`]: command/tick entry point for presentation surfaces
//! - [`Database`]: timer record persistence and daily statistics
//! - [`Config`]: application configuration management

pub mod error;
pub mod events;
pub mod notify;
pub mod ports;
pub mod record;
pub mod service;
pub mod session;
pub mod storage;
pub mod ticker;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError, Result};
pub use events::Event;
pub use notify::LogNotifier;
pub use ports::{HistoryStore, NotificationSink, TickSource};
pub use record::{DailyStatistics, FinishReason, TimerMemento, TimerRecord};
pub use service::{TimerService, TimerStateView};
pub use session::{
    next_session_type, NoopEventHandler, Session, SessionEventHandler,
    POMODOROS_BEFORE_LONG_BREAK,
};
pub use storage::{Config, Database};
pub use ticker::IntervalTicker;
pub use timer::{
    Clock, CountdownTimer, ManualClock, PauseRecord, SessionType, SystemClock, TimerState,
};
