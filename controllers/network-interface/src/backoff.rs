//! # Fibonacci Backoff
//!
//! Per-key retry delays for failed reconciliation passes.
//!
//! The sequence is expressed in multiples of a minimum delay:
//! min, min, 2*min, 3*min, 5*min, 8*min, ... capped at a maximum.

use crate::scheduler::ObjectKey;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Fibonacci backoff calculator
///
/// Stateless: [`Retries`] keeps the failure count per key and asks for the
/// delay matching that count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FibonacciBackoff {
    min: Duration,
    max: Duration,
}

impl FibonacciBackoff {
    /// Create a new Fibonacci backoff with the given minimum and maximum delays
    ///
    /// A `max` below `min` is raised to `min`.
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max: max.max(min),
        }
    }

    /// Delay for the given number of consecutive failures (1-indexed)
    ///
    /// The first two failures both wait `min`, each following one waits the sum
    /// of the two previous delays, capped at `max`.
    #[must_use]
    pub fn delay_for(&self, failures: u32) -> Duration {
        if failures <= 2 {
            return self.min;
        }

        let mut prev: u32 = 1;
        let mut current: u32 = 1;
        for _ in 3..=failures {
            let next = prev.saturating_add(current);
            prev = current;
            current = next;

            // Once capped there is no point continuing
            if self.min.saturating_mul(current) >= self.max {
                return self.max;
            }
        }

        self.min.saturating_mul(current).min(self.max)
    }
}

impl Default for FibonacciBackoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(300))
    }
}

/// Consecutive failure counts per key (namespace/name -> failures)
#[derive(Debug, Default)]
pub struct Retries {
    backoff: FibonacciBackoff,
    failures: Mutex<HashMap<ObjectKey, u32>>,
}

impl Retries {
    pub fn new(backoff: FibonacciBackoff) -> Self {
        Self {
            backoff,
            failures: Mutex::default(),
        }
    }

    fn failures_map(&self) -> MutexGuard<'_, HashMap<ObjectKey, u32>> {
        self.failures.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count one more failure for `key` and return the delay before its retry
    pub fn record_failure(&self, key: &ObjectKey) -> Duration {
        let mut failures = self.failures_map();
        let count = failures.entry(key.clone()).or_default();
        *count = count.saturating_add(1);
        self.backoff.delay_for(*count)
    }

    /// Reset the failure count of `key` after a successful pass
    pub fn reset(&self, key: &ObjectKey) {
        self.failures_map().remove(key);
    }

    /// Number of keys currently backing off
    pub fn backing_off(&self) -> usize {
        self.failures_map().len()
    }

    #[cfg(test)]
    pub fn failures(&self, key: &ObjectKey) -> u32 {
        self.failures_map().get(key).copied().unwrap_or(0)
    }
}
