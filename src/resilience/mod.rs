//! Resilience
//!
//! - **Pacer**: minimum spacing between consecutive requests
//! - **Retry**: bounded exponential cooldown for throttled responses

pub mod pacer;
pub mod retry;

pub use pacer::{PacerStats, RequestPacer};
pub use retry::{RateLimitRetryConfig, RateLimitStats, DEFAULT_RATE_LIMIT_RETRY};
