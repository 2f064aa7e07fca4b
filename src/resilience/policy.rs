//! Resilience policy engine: the composed wrapper around one stock lookup.
//!
//! # Data Flow
//! ```text
//! check_stock(query)
//!     → Timeout  (one budget for everything below)
//!     → Retry    (backoff between attempts, stops if the budget can't cover it)
//!     → Breaker  (fails fast while Open)
//!     → StockClient::check_stock
//!     → on failure: Fallback → StockCheck::Degraded
//! ```

use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::time::Instant;

use crate::config::ResilienceConfig;
use crate::inventory::{StockClient, StockQuery, StockResult};
use crate::observability::metrics;
use crate::resilience::circuit_breaker::CircuitBreaker;
use crate::resilience::types::{ResilienceError, StockCheck};
use crate::resilience::{fallback, retries, timeouts};

/// Stock lookups wrapped in Timeout ⊃ Retry ⊃ CircuitBreaker, with Fallback on top.
pub struct ResiliencePolicy {
    client: Arc<dyn StockClient>,
    breaker: Arc<CircuitBreaker>,
    settings: ArcSwap<ResilienceConfig>,
}

impl ResiliencePolicy {
    /// Wrap `client`, sharing `breaker` with any other policy for the same target.
    pub fn new(
        client: Arc<dyn StockClient>,
        breaker: Arc<CircuitBreaker>,
        config: ResilienceConfig,
    ) -> Self {
        Self {
            client,
            breaker,
            settings: ArcSwap::from_pointee(config),
        }
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Settings used by lookups starting now.
    pub fn settings(&self) -> Arc<ResilienceConfig> {
        self.settings.load_full()
    }

    /// Swap in new settings. Lookups already running keep the old ones and
    /// the breaker keeps its state.
    pub fn reload(&self, config: ResilienceConfig) {
        tracing::info!(
            max_retries = config.retry.max_retries,
            budget_ms = config.timeout.budget_ms,
            failure_threshold = config.circuit_breaker.failure_threshold,
            "Resilience settings reloaded"
        );
        self.settings.store(Arc::new(config));
    }

    /// Look up stock, absorbing any failure into a degraded result.
    pub async fn check_stock(&self, query: &StockQuery) -> StockCheck {
        self.check_stock_since(query, Instant::now()).await
    }

    /// Like [`check_stock`](Self::check_stock), with the budget counted from
    /// `started` rather than from now.
    pub async fn check_stock_since(&self, query: &StockQuery, started: Instant) -> StockCheck {
        match self.execute_since(query, started).await {
            Ok(result) => StockCheck::Available(result),
            Err(error) => StockCheck::Degraded(fallback::degrade(
                &self.settings.load().fallback,
                &error,
            )),
        }
    }

    /// Look up stock under timeout, retry and breaker, without the fallback.
    pub async fn execute(&self, query: &StockQuery) -> Result<StockResult, ResilienceError> {
        self.execute_since(query, Instant::now()).await
    }

    /// Like [`execute`](Self::execute), with the budget counted from `started`.
    pub async fn execute_since(
        &self,
        query: &StockQuery,
        started: Instant,
    ) -> Result<StockResult, ResilienceError> {
        let settings = self.settings.load_full();
        let settings: &ResilienceConfig = &settings;

        let deadline = timeouts::Deadline::starting_at(started, settings.timeout.budget());
        let deadline = &deadline;
        let result = deadline
            .enforce(retries::retry(&settings.retry, deadline, move |attempt| {
                self.attempt(query, settings, deadline, attempt)
            }))
            .await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(ResilienceError::CircuitOpen { .. }) => "circuit_open",
            Err(ResilienceError::Timeout(_)) => "timeout",
            Err(ResilienceError::Stock(_)) => "failure",
        };
        metrics::record_stock_check(outcome, started.elapsed());
        result
    }

    async fn attempt(
        &self,
        query: &StockQuery,
        settings: &ResilienceConfig,
        deadline: &timeouts::Deadline,
        attempt: u32,
    ) -> Result<StockResult, ResilienceError> {
        if deadline.is_expired() {
            return Err(ResilienceError::Timeout(deadline.budget()));
        }

        let breaker_config = &settings.circuit_breaker;
        let permit = self.breaker.try_acquire(breaker_config)?;

        let call = self.client.check_stock(query);
        match deadline.bound_attempt(settings.timeout.attempt(), call).await {
            Ok(result) => {
                permit.record_success(breaker_config);
                Ok(result)
            }
            Err(error) => {
                if error.is_service_failure() {
                    permit.record_failure(breaker_config);
                }
                tracing::warn!(attempt, error = %error, "Stock check attempt failed");
                // A call cut off by the overall budget ends the lookup.
                if deadline.is_expired() {
                    return Err(ResilienceError::Timeout(deadline.budget()));
                }
                Err(error.into())
            }
        }
    }
}

impl std::fmt::Debug for ResiliencePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResiliencePolicy")
            .field("target", &self.breaker.target())
            .field("settings", &self.settings.load_full())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackoffStrategy, CircuitBreakerConfig, RetryConfig, TimeoutConfig};
    use crate::inventory::{ItemAvailability, StockClientError};
    use crate::resilience::circuit_breaker::CircuitState;
    use crate::resilience::types::DegradedReason;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Fails the first `failures` calls, then reports everything in stock.
    struct FlakyClient {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl StockClient for FlakyClient {
        async fn check_stock(&self, query: &StockQuery) -> Result<StockResult, StockClientError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(StockClientError::Transport("connection refused".into()));
            }
            Ok(StockResult::from_items(query.codes().iter().map(|code| {
                ItemAvailability {
                    item_code: code.clone(),
                    available: true,
                    quantity: 10,
                }
            })))
        }
    }

    fn settings() -> ResilienceConfig {
        ResilienceConfig {
            retry: RetryConfig {
                enabled: true,
                max_retries: 2,
                backoff: BackoffStrategy::Fixed { delay_ms: 10 },
            },
            circuit_breaker: CircuitBreakerConfig {
                window_size: 3,
                minimum_calls: 3,
                ..CircuitBreakerConfig::default()
            },
            timeout: TimeoutConfig {
                budget_ms: 1000,
                attempt_ms: None,
            },
            ..ResilienceConfig::default()
        }
    }

    fn policy(failures: u32) -> (ResiliencePolicy, Arc<FlakyClient>) {
        let client = Arc::new(FlakyClient {
            failures,
            calls: AtomicU32::new(0),
        });
        let breaker = Arc::new(CircuitBreaker::new("inventory"));
        (
            ResiliencePolicy::new(client.clone(), breaker, settings()),
            client,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_is_retried() {
        let (policy, client) = policy(2);
        let query = StockQuery::new(["item-42"]).unwrap();
        let check = policy.check_stock(&query).await;

        assert!(matches!(check, StockCheck::Available(_)));
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
        assert_eq!(policy.breaker().state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_fall_back_and_open_breaker() {
        let (policy, client) = policy(u32::MAX);
        let query = StockQuery::new(["item-42"]).unwrap();

        match policy.check_stock(&query).await {
            StockCheck::Degraded(degraded) => {
                assert_eq!(degraded.reason, DegradedReason::Unavailable);
            }
            other => panic!("expected fallback, got {other:?}"),
        }
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
        assert_eq!(policy.breaker().state(), CircuitState::Open);

        match policy.check_stock(&query).await {
            StockCheck::Degraded(degraded) => {
                assert_eq!(degraded.reason, DegradedReason::CircuitOpen);
            }
            other => panic!("expected fallback, got {other:?}"),
        }
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_keeps_breaker_state() {
        let (policy, client) = policy(u32::MAX);
        let query = StockQuery::new(["item-42"]).unwrap();
        let _ = policy.check_stock(&query).await;
        assert_eq!(policy.breaker().state(), CircuitState::Open);

        let mut updated = settings();
        updated.circuit_breaker.cooldown_ms = 50;
        updated.retry.max_retries = 0;
        policy.reload(updated);
        assert_eq!(policy.settings().retry.max_retries, 0);
        assert_eq!(policy.breaker().state(), CircuitState::Open);

        tokio::time::advance(Duration::from_millis(50)).await;
        let _ = policy.check_stock(&query).await;
        // One trial call, which failed and re-opened the breaker.
        assert_eq!(client.calls.load(Ordering::SeqCst), 4);
        assert_eq!(policy.breaker().state(), CircuitState::Open);
    }
}
