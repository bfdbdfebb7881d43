use std::io::Write;

use tracing::{info, trace};

use crate::ports::NotificationSink;
use crate::storage::NotificationsConfig;
use crate::timer::SessionType;

/// Notification sink that reports through `tracing`, optionally ringing the
/// terminal bell on alarm.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    config: NotificationsConfig,
    ticks: u64,
    alarms: u64,
}

impl LogNotifier {
    pub fn new(config: NotificationsConfig) -> Self {
        Self {
            config,
            ticks: 0,
            alarms: 0,
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn alarms(&self) -> u64 {
        self.alarms
    }
}

impl Default for LogNotifier {
    fn default() -> Self {
        Self::new(NotificationsConfig::default())
    }
}

impl NotificationSink for LogNotifier {
    fn on_tick(&mut self) {
        self.ticks += 1;
        if self.config.tick {
            trace!(tick = self.ticks, "tick");
        }
    }

    fn on_alarm(&mut self) {
        self.alarms += 1;
        if !self.config.alarm {
            return;
        }
        info!("alarm");
        if self.config.bell {
            let mut stderr = std::io::stderr();
            let _ = stderr.write_all(b"\x07");
            let _ = stderr.flush();
        }
    }

    fn on_session_completed(&mut self, completed: SessionType, next: SessionType) {
        info!(%completed, %next, "{completed} finished, {next} is next");
    }
}
