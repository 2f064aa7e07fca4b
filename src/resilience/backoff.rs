//! Retry delays: fixed or exponential with jitter.

use std::time::Duration;

use rand::Rng;

use crate::config::BackoffStrategy;

/// Calculate exponential backoff delay, optionally with jitter.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64, jitter: bool) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Apply jitter (0 to 10% of the delay)
    let jitter_range = capped_delay / 10;
    let jitter_ms = if jitter && jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter_ms)
}

impl BackoffStrategy {
    /// Delay to wait before retry number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            BackoffStrategy::Fixed { delay_ms } => {
                if attempt == 0 {
                    Duration::ZERO
                } else {
                    Duration::from_millis(delay_ms)
                }
            }
            BackoffStrategy::Exponential {
                base_delay_ms,
                max_delay_ms,
                jitter,
            } => calculate_backoff(attempt, base_delay_ms, max_delay_ms, jitter),
        }
    }
}
