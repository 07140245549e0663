//! Request Pacer
//!
//! Minimum spacing between consecutive outbound requests. A single "last
//! call" cursor, not a token bucket: it bounds how close two calls can be,
//! not how many can happen in a window.

use std::time::Duration;
use tokio::time::Instant;

/// Pacing statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PacerStats {
    pub total_calls: u32,
    pub delayed_calls: u32,
    pub total_wait: Duration,
}

/// Single-cursor request pacer.
#[derive(Debug)]
pub struct RequestPacer {
    min_interval: Duration,
    last_call: Option<Instant>,
    stats: PacerStats,
}

impl RequestPacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: None,
            stats: PacerStats::default(),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Time left before the next call is allowed.
    pub fn remaining(&self) -> Duration {
        match self.last_call {
            Some(last) => self.min_interval.saturating_sub(last.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// Sleep until the minimum interval since the last call has passed.
    /// Returns how long it waited.
    pub async fn wait(&mut self) -> Duration {
        let remaining = self.remaining();
        self.stats.total_calls += 1;

        if !remaining.is_zero() {
            tracing::trace!(wait_ms = remaining.as_millis() as u64, "Pacing request");
            self.stats.delayed_calls += 1;
            self.stats.total_wait += remaining;
            tokio::time::sleep(remaining).await;
        }

        remaining
    }

    /// Record that a call just completed, whatever its outcome.
    pub fn mark(&mut self) {
        self.last_call = Some(Instant::now());
    }

    pub fn stats(&self) -> &PacerStats {
        &self.stats
    }
}
