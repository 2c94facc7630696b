//! Poll-with-deadline primitive: check, sleep a fixed interval, repeat.

use std::time::Duration;

/// How often and how many times to check for a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    /// Total number of checks (at least one check is always made).
    pub max_attempts: u32,
    /// Sleep between consecutive checks.
    pub interval: Duration,
}

impl PollSchedule {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            interval,
        }
    }

    /// Upper bound on the time spent sleeping between checks.
    pub fn max_wait(&self) -> Duration {
        self.interval
            .saturating_mul(self.max_attempts.max(1).saturating_sub(1))
    }
}

/// Stepper over a [`PollSchedule`].
///
/// `tick` returns immediately for the first check and sleeps `interval`
/// before each later one; it returns false once the attempts are used up.
/// Keeps the caller free to borrow its own state between checks.
#[derive(Debug)]
pub struct Poller {
    schedule: PollSchedule,
    attempt: u32,
}

impl Poller {
    pub fn new(schedule: PollSchedule) -> Self {
        Self {
            schedule,
            attempt: 0,
        }
    }

    /// Checks made so far.
    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    pub async fn tick(&mut self) -> bool {
        if self.attempt >= self.schedule.max_attempts.max(1) {
            return false;
        }
        if self.attempt > 0 {
            tokio::time::sleep(self.schedule.interval).await;
        }
        self.attempt += 1;
        true
    }
}

/// Runs `check` on `schedule` until it yields a value or the attempts run out.
pub async fn poll_until<T, F>(schedule: PollSchedule, mut check: F) -> Option<T>
where
    F: FnMut() -> Option<T>,
{
    let mut poller = Poller::new(schedule);
    while poller.tick().await {
        if let Some(v) = check() {
            return Some(v);
        }
    }
    None
}
