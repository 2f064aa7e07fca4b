//! Timeout enforcement.
//!
//! # Responsibilities
//! - Bound a whole stock lookup, retries and backoff included, by one budget
//! - Bound each attempt by the attempt limit and by what is left of the budget
//! - Let the retry loop ask whether another delay still fits
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; expiry drops the inner future
//! - An attempt cut short by the budget surfaces as a client timeout, so the
//!   breaker counts it like any other failed call
//! - A deadline may start before the lookup does (time spent queued counts)
//! - Time comes from `tokio::time`, so paused-clock tests are deterministic

use std::future::Future;
use std::time::Duration;

use tokio::time::{self, Instant};

use crate::inventory::StockClientError;
use crate::resilience::types::ResilienceError;

/// A fixed point in time by which a lookup must have finished.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    budget: Duration,
    expires_at: Instant,
}

impl Deadline {
    /// Start a deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self::starting_at(Instant::now(), budget)
    }

    /// Deadline `budget` after `start`, which may lie in the past.
    pub fn starting_at(start: Instant, budget: Duration) -> Self {
        Self {
            budget,
            expires_at: start + budget,
        }
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Time left before expiry, zero once passed.
    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    /// Whether waiting `delay` would still leave time for another attempt.
    pub fn allows(&self, delay: Duration) -> bool {
        self.remaining() > delay
    }

    /// Bound one attempt by `limit` and by the deadline, whichever ends first.
    ///
    /// Expiry is reported as `StockClientError::Timeout` carrying the limit
    /// that fired.
    pub async fn bound_attempt<F, T>(
        &self,
        limit: Option<Duration>,
        fut: F,
    ) -> Result<T, StockClientError>
    where
        F: Future<Output = Result<T, StockClientError>>,
    {
        let now = Instant::now();
        let (expires_at, reported) = match limit {
            Some(limit) if now + limit < self.expires_at => (now + limit, limit),
            _ => (self.expires_at, self.budget),
        };

        match time::timeout_at(expires_at, fut).await {
            Ok(result) => result,
            Err(_) => Err(StockClientError::Timeout(reported)),
        }
    }

    /// Run `fut` to completion or fail with `ResilienceError::Timeout` at expiry.
    pub async fn enforce<F, T>(&self, fut: F) -> Result<T, ResilienceError>
    where
        F: Future<Output = Result<T, ResilienceError>>,
    {
        match time::timeout_at(self.expires_at, fut).await {
            Ok(result) => result,
            Err(_) => Err(ResilienceError::Timeout(self.budget)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expires() {
        let deadline = Deadline::after(Duration::from_millis(100));
        let result: Result<(), _> = deadline
            .enforce(async {
                time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert_eq!(result, Err(ResilienceError::Timeout(Duration::from_millis(100))));
        assert_eq!(deadline.remaining(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_allows() {
        let deadline = Deadline::after(Duration::from_millis(500));
        assert!(deadline.allows(Duration::from_millis(400)));
        time::advance(Duration::from_millis(200)).await;
        assert!(!deadline.allows(Duration::from_millis(400)));
        assert!(deadline.allows(Duration::from_millis(100)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_limit() {
        let deadline = Deadline::after(Duration::from_secs(5));
        let slow = async {
            time::sleep(Duration::from_secs(1)).await;
            Ok::<_, StockClientError>(7)
        };
        let err = deadline
            .bound_attempt(Some(Duration::from_millis(10)), slow)
            .await
            .unwrap_err();
        assert_eq!(err, StockClientError::Timeout(Duration::from_millis(10)));

        let fast = async { Ok::<_, StockClientError>(7) };
        assert_eq!(deadline.bound_attempt(None, fast).await, Ok(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_bounded_by_remaining_budget() {
        let deadline = Deadline::after(Duration::from_millis(300));
        time::advance(Duration::from_millis(100)).await;

        let started = Instant::now();
        let err = deadline
            .bound_attempt(Some(Duration::from_secs(1)), std::future::pending::<Result<(), _>>())
            .await
            .unwrap_err();

        assert_eq!(err, StockClientError::Timeout(Duration::from_millis(300)));
        assert_eq!(started.elapsed(), Duration::from_millis(200));
        assert!(deadline.is_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_counts_time_before_start() {
        let accepted = Instant::now();
        time::advance(Duration::from_millis(250)).await;

        let deadline = Deadline::starting_at(accepted, Duration::from_millis(300));
        assert_eq!(deadline.remaining(), Duration::from_millis(50));
        assert!(!deadline.allows(Duration::from_millis(100)));
    }
}
