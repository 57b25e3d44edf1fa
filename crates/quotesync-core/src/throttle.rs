//! Request budget applied to outgoing provider calls.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Shared request budget: `limit` calls per `window`, spread evenly with a
/// burst allowance of the full limit.
#[derive(Clone)]
pub struct RequestBudget {
    limiter: Arc<DirectRateLimiter>,
}

impl RequestBudget {
    pub fn new(window: Duration, limit: u32) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::direct(quota_for(window, limit))),
        }
    }

    /// Whether a request may go out right now. A denied request is simply
    /// reported as rate-limited; the retry policy decides what happens next.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

impl Default for RequestBudget {
    /// Free-tier style default: 100 requests per 10 seconds.
    fn default() -> Self {
        Self::new(Duration::from_secs(10), 100)
    }
}

fn quota_for(window: Duration, limit: u32) -> Quota {
    let limit = limit.max(1);
    let burst = NonZeroU32::new(limit).expect("limit is clamped to at least one");

    let period = Duration::from_secs_f64((window.as_secs_f64() / f64::from(limit)).max(0.001));
    Quota::with_period(period)
        .expect("period is always positive")
        .allow_burst(burst)
}
