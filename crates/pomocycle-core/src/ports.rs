//! Collaborators the [`TimerService`](crate::TimerService) drives.
//!
//! The core does no I/O of its own. Adapters implementing these traits
//! own the clock tick, the user-facing signals and the history.

use crate::error::Result;
use crate::record::{DailyStatistics, TimerRecord};
use crate::timer::SessionType;

/// Once-per-second tick delivery.
///
/// While started and not paused, the driver calls
/// [`TimerService::on_tick`](crate::TimerService::on_tick) once per second.
pub trait TickSource {
    fn start_ticking(&mut self);
    fn stop_ticking(&mut self);
    fn pause_ticking(&mut self);
    fn resume_ticking(&mut self);
}

pub trait NotificationSink {
    fn on_tick(&mut self);
    fn on_alarm(&mut self);
    fn on_session_completed(&mut self, completed: SessionType, next: SessionType);
}

pub trait HistoryStore {
    /// Today's tally used to seed a new session.
    fn load_today_statistics(&mut self) -> Result<DailyStatistics>;
    fn save_record(&mut self, record: &TimerRecord) -> Result<()>;
}
