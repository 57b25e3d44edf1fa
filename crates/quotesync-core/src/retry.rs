//! Jittered exponential backoff for provider retries.

use std::time::Duration;

/// Retry policy applied to retryable provider failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum retries after the initial attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Hard cap on any single delay.
    pub max_delay: Duration,
    /// Apply ±50% random jitter to each delay.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(4),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: false,
        }
    }

    /// Delay before retry `attempt` (0-based), or `None` once the budget is
    /// exhausted.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_retries {
            return None;
        }

        let scaled = self.base_delay.as_secs_f64() * 2_f64.powi(attempt as i32);
        let capped = scaled.min(self.max_delay.as_secs_f64());
        let mut delay = Duration::from_secs_f64(capped);

        if self.jitter {
            let window = delay.as_millis() as u64 / 2;
            if window > 0 {
                let offset = fastrand::u64(0..=window * 2) as i64 - window as i64;
                let millis = (delay.as_millis() as i64 + offset).max(0) as u64;
                delay = Duration::from_millis(millis);
            }
        }

        Some(delay)
    }
}
