//! Rate-limit Backoff
//!
//! Bounded, capped exponential cooldown applied when the API answers 429.

use std::time::Duration;

/// Cooldown policy for throttled (HTTP 429) responses.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitRetryConfig {
    /// Maximum number of retries after the first throttled response.
    pub max_retries: u32,
    /// Cooldown before the first retry.
    pub initial_cooldown: Duration,
    /// Growth factor applied per retry.
    pub multiplier: f64,
    /// Upper bound for any single cooldown.
    pub max_cooldown: Duration,
}

impl Default for RateLimitRetryConfig {
    fn default() -> Self {
        DEFAULT_RATE_LIMIT_RETRY
    }
}

/// One minute first, doubling, never more than five minutes, three retries.
pub const DEFAULT_RATE_LIMIT_RETRY: RateLimitRetryConfig = RateLimitRetryConfig {
    max_retries: 3,
    initial_cooldown: Duration::from_secs(60),
    multiplier: 2.0,
    max_cooldown: Duration::from_secs(300),
};

impl RateLimitRetryConfig {
    /// Fixed cooldown with no growth.
    pub fn fixed(cooldown: Duration, max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_cooldown: cooldown,
            multiplier: 1.0,
            max_cooldown: cooldown,
        }
    }

    /// Cooldown before retry number `retry` (zero-based).
    pub fn cooldown_for(&self, retry: u32) -> Duration {
        let base = self.initial_cooldown.as_millis() as f64
            * self.multiplier.max(1.0).powi(retry.min(i32::MAX as u32) as i32);
        let capped = base.min(self.max_cooldown.as_millis() as f64);

        // max_cooldown below initial_cooldown still honours the initial wait
        let floor = self.initial_cooldown.min(self.max_cooldown);
        Duration::from_millis(capped as u64).max(floor)
    }

    /// Whether another retry is allowed after `retries_done` retries.
    pub fn allows_retry(&self, retries_done: u32) -> bool {
        retries_done < self.max_retries
    }
}

/// Counters for throttling seen by an executor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitStats {
    pub throttled_responses: u32,
    pub retries: u32,
    pub exhausted: u32,
}
