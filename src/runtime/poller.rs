use std::time::{Duration, Instant};

/// Fixed-interval progress timer driven by the event loop.
///
/// The loop sleeps in `event::poll` for at most `time_until_due`, then asks
/// `due` whether a tick should run. A cancelled poller never fires again.
#[derive(Debug)]
pub struct ProgressPoller {
    period: Duration,
    next_due: Option<Instant>,
}

impl ProgressPoller {
    pub fn start(period: Duration, now: Instant) -> Self {
        let period = period.max(Duration::from_millis(1));
        Self {
            period,
            next_due: Some(now + period),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_active(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    /// How long the loop may wait for input before the next tick.
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.next_due.map(|due| due.saturating_duration_since(now))
    }

    /// True once per elapsed period. Missed periods are not replayed.
    pub fn due(&mut self, now: Instant) -> bool {
        let Some(due) = self.next_due else {
            return false;
        };
        if now < due {
            return false;
        }
        let next = due + self.period;
        self.next_due = Some(if next <= now { now + self.period } else { next });
        true
    }
}
