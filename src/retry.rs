//! Bounded retry.
//!
//! Every "keep trying until it works" loop in the crate goes through a
//! [`RetryPolicy`] so it has an explicit upper bound.

use anyhow::{anyhow, Result};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Pause between attempts.
    pub interval: Duration,
    /// Give up once this much time has passed since the first attempt.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// Call `attempt` until it yields a value, fails hard, or the timeout
    /// elapses. The first attempt always runs.
    pub fn poll<T>(&self, what: &str, attempt: impl FnMut() -> Result<Option<T>>) -> Result<T> {
        let mut attempts = 0u32;
        match self.poll_attempts(what, self.timeout, &mut attempts, attempt)? {
            Some(value) => Ok(value),
            None => Err(anyhow!(
                "{}: gave up after {} attempts over {:?}",
                what,
                attempts,
                self.timeout
            )),
        }
    }

    /// Like [`poll`](Self::poll) but spends at most `limit` (or the policy
    /// timeout, whichever is shorter) and reports expiry as `Ok(None)`.
    /// Hard failures from `attempt` still propagate.
    pub fn poll_within<T>(
        &self,
        what: &str,
        limit: Duration,
        attempt: impl FnMut() -> Result<Option<T>>,
    ) -> Result<Option<T>> {
        let mut attempts = 0u32;
        let budget = self.timeout.min(limit);
        let outcome = self.poll_attempts(what, budget, &mut attempts, attempt)?;
        if outcome.is_none() {
            log::debug!("{}: nothing after {} attempts over {:?}", what, attempts, budget);
        }
        Ok(outcome)
    }

    fn poll_attempts<T>(
        &self,
        what: &str,
        budget: Duration,
        attempts: &mut u32,
        mut attempt: impl FnMut() -> Result<Option<T>>,
    ) -> Result<Option<T>> {
        let started = Instant::now();
        loop {
            *attempts += 1;
            if let Some(value) = attempt()? {
                if *attempts > 1 {
                    log::debug!("{} succeeded after {} attempts", what, attempts);
                }
                return Ok(Some(value));
            }
            let elapsed = started.elapsed();
            if elapsed >= budget {
                return Ok(None);
            }
            let pause = self.interval.min(budget - elapsed);
            if !pause.is_zero() {
                std::thread::sleep(pause);
            }
        }
    }
}
