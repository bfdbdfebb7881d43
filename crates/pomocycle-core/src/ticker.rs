//! Tokio-backed tick source.
//!
//! The ticker does not call into the service itself. The driver loop awaits
//! [`IntervalTicker::next_tick`] and calls
//! [`TimerService::on_tick`](crate::TimerService::on_tick) when it resolves.

use std::time::Duration;

use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::ports::TickSource;

#[derive(Debug)]
pub struct IntervalTicker {
    period: Duration,
    interval: Option<Interval>,
    paused: bool,
}

impl Default for IntervalTicker {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            interval: None,
            paused: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.interval.is_some() && !self.paused
    }

    /// Resolves on the next tick. Pending forever while stopped or paused.
    pub async fn next_tick(&mut self) {
        match (self.interval.as_mut(), self.paused) {
            (Some(interval), false) => {
                interval.tick().await;
            }
            _ => std::future::pending::<()>().await,
        }
    }

    fn arm(&self) -> Interval {
        let mut interval = time::interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    }
}

impl TickSource for IntervalTicker {
    /// Must be called from within a tokio runtime.
    fn start_ticking(&mut self) {
        self.interval = Some(self.arm());
        self.paused = false;
    }

    fn stop_ticking(&mut self) {
        self.interval = None;
        self.paused = false;
    }

    fn pause_ticking(&mut self) {
        if self.interval.is_some() {
            self.paused = true;
        }
    }

    fn resume_ticking(&mut self) {
        if let Some(interval) = self.interval.as_mut() {
            interval.reset();
            self.paused = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        let mut ticker = IntervalTicker::default();
        ticker.start_ticking();
        let begin = Instant::now();

        for _ in 0..3 {
            ticker.next_tick().await;
        }
        assert_eq!(begin.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_until_started() {
        let mut ticker = IntervalTicker::default();
        assert!(!ticker.is_active());
        let waited = time::timeout(Duration::from_secs(10), ticker.next_tick()).await;
        assert!(waited.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn pause_holds_ticks_until_resume() {
        let mut ticker = IntervalTicker::default();
        ticker.start_ticking();
        ticker.pause_ticking();
        assert!(!ticker.is_active());
        assert!(time::timeout(Duration::from_secs(5), ticker.next_tick())
            .await
            .is_err());

        ticker.resume_ticking();
        let begin = Instant::now();
        ticker.next_tick().await;
        assert_eq!(begin.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_then_resume_stays_stopped() {
        let mut ticker = IntervalTicker::default();
        ticker.start_ticking();
        ticker.stop_ticking();
        ticker.resume_ticking();
        assert!(!ticker.is_active());
    }
}
