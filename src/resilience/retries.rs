//! Retry logic.
//!
//! # Responsibilities
//! - Determine if a failed lookup is worth repeating
//! - Execute retries with the configured backoff
//! - Give up early when the next delay would overrun the deadline
//!
//! # Design Decisions
//! - Transport errors and attempt timeouts are retryable
//! - An open circuit is never retried; the breaker already said no
//! - At most `max_retries` extra attempts, so `max_retries + 1` calls in total

use std::future::Future;

use crate::config::RetryConfig;
use crate::inventory::StockClientError;
use crate::observability::metrics;
use crate::resilience::timeouts::Deadline;
use crate::resilience::types::ResilienceError;

/// Whether `error` may succeed on another attempt.
pub fn is_retryable(error: &ResilienceError) -> bool {
    match error {
        ResilienceError::Stock(StockClientError::Transport(_)) => true,
        ResilienceError::Stock(StockClientError::Timeout(_)) => true,
        ResilienceError::Stock(StockClientError::InvalidRequest(_)) => false,
        ResilienceError::CircuitOpen { .. } => false,
        ResilienceError::Timeout(_) => false,
    }
}

/// Run `attempt` until it succeeds, fails permanently, or retries run out.
///
/// `attempt` receives the zero-based attempt number.
pub async fn retry<T, F, Fut>(
    config: &RetryConfig,
    deadline: &Deadline,
    mut attempt: F,
) -> Result<T, ResilienceError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ResilienceError>>,
{
    let max_retries = if config.enabled { config.max_retries } else { 0 };
    let mut attempt_no = 0;

    loop {
        let error = match attempt(attempt_no).await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        if attempt_no >= max_retries || !is_retryable(&error) {
            return Err(error);
        }

        attempt_no += 1;
        let delay = config.backoff.delay(attempt_no);
        if !deadline.allows(delay) {
            tracing::info!(
                attempt = attempt_no,
                delay = ?delay,
                remaining = ?deadline.remaining(),
                "Retry skipped, budget would be exceeded"
            );
            return Err(error);
        }

        tracing::info!(attempt = attempt_no, delay = ?delay, error = %error, "Retrying stock check");
        metrics::record_retry();
        tokio::time::sleep(delay).await;
    }
}
