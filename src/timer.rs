//! Interval timer for periodic polling from the main loop.

use std::time::{Duration, Instant};

/// Tracks when a periodic task (battery polling, config checks) is next due.
pub struct PollTimer {
    interval: Duration,
    last_run: Option<Instant>,
}

impl PollTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
        }
    }

    /// Returns true and restarts the interval when the task is due.
    ///
    /// Always true on the first call.
    pub fn should_run(&mut self, now: Instant) -> bool {
        let due = self.is_due(now);
        if due {
            self.last_run = Some(now);
        }
        due
    }

    /// Like [`Self::should_run`] but without restarting the interval.
    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_run {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Time until the next run, zero if already due.
    pub fn time_until_next(&self, now: Instant) -> Duration {
        match self.last_run {
            None => Duration::ZERO,
            Some(last) => self
                .interval
                .saturating_sub(now.saturating_duration_since(last)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_call_runs() {
        let mut timer = PollTimer::new(Duration::from_secs(2));
        assert!(timer.should_run(Instant::now()));
    }

    #[test]
    fn test_immediate_second_call_waits() {
        let now = Instant::now();
        let mut timer = PollTimer::new(Duration::from_secs(2));
        timer.should_run(now);
        assert!(!timer.should_run(now + Duration::from_millis(1999)));
        assert!(timer.should_run(now + Duration::from_secs(2)));
    }

    #[test]
    fn test_is_due_does_not_reset() {
        let timer = PollTimer::new(Duration::from_secs(60));
        let now = Instant::now();
        assert!(timer.is_due(now));
        assert!(timer.is_due(now));
    }

    #[test]
    fn test_time_until_next() {
        let now = Instant::now();
        let mut timer = PollTimer::new(Duration::from_secs(2));
        assert_eq!(timer.time_until_next(now), Duration::ZERO);
        timer.should_run(now);
        assert_eq!(
            timer.time_until_next(now + Duration::from_millis(500)),
            Duration::from_millis(1500)
        );
        assert_eq!(timer.time_until_next(now + Duration::from_secs(5)), Duration::ZERO);
    }
}
