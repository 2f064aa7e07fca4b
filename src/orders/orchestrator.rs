//! Order placement workflow.
//!
//! # State Machine
//! ```text
//! Received → CheckingStock → AllInStock → Persisting → Placed
//!                          → PartialOrNoStock → Rejected
//!                          → PolicyFailure → Degraded
//! Persisting → (commit failed) → Degraded
//! ```
//!
//! # Design Decisions
//! - Validation happens before any remote call
//! - All-or-nothing: one short line rejects the whole order
//! - Only a genuine stock answer can reject; a fallback result degrades
//! - A failed commit is reported as Degraded, never dropped or called Rejected

use std::sync::Arc;

use tokio::time::Instant;

use crate::observability::metrics;
use crate::orders::store::OrderStore;
use crate::orders::types::{
    CheckedOrder, OrderError, OrderOutcome, OrderRequest, StockDecision, OUT_OF_STOCK_REASON,
};
use crate::resilience::{fallback, ResilienceError, ResiliencePolicy, StockCheck};

/// Steps an order placement moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderPhase {
    Received,
    CheckingStock,
    AllInStock,
    Persisting,
    Placed,
    PartialOrNoStock,
    Rejected,
    PolicyFailure,
    Degraded,
}

fn enter(phase: OrderPhase) {
    tracing::debug!(phase = ?phase, "Order phase");
}

fn finish(outcome: OrderOutcome, accepted: Instant) -> OrderOutcome {
    tracing::info!(status = outcome.status(), elapsed = ?accepted.elapsed(), "Order finished");
    metrics::record_order_outcome(outcome.status(), accepted.elapsed());
    outcome
}

/// Checks stock through the resilience policy and commits accepted orders.
pub struct OrderOrchestrator {
    policy: Arc<ResiliencePolicy>,
    store: Arc<dyn OrderStore>,
}

impl OrderOrchestrator {
    pub fn new(policy: Arc<ResiliencePolicy>, store: Arc<dyn OrderStore>) -> Self {
        Self { policy, store }
    }

    pub fn policy(&self) -> &Arc<ResiliencePolicy> {
        &self.policy
    }

    /// Validate and place an order on the current task.
    pub async fn place_order(&self, request: OrderRequest) -> Result<OrderOutcome, OrderError> {
        let order = CheckedOrder::try_from(request)?;
        Ok(self.execute(order).await)
    }

    /// Place an already validated order.
    pub async fn execute(&self, order: CheckedOrder) -> OrderOutcome {
        self.execute_since(order, Instant::now()).await
    }

    /// Place an order accepted at `accepted`; the stock check budget counts
    /// from then.
    #[tracing::instrument(name = "place_order", skip_all, fields(items = order.query().len()))]
    pub async fn execute_since(&self, order: CheckedOrder, accepted: Instant) -> OrderOutcome {
        enter(OrderPhase::Received);

        let outcome = self.run(&order, accepted).await;
        finish(outcome, accepted)
    }

    /// Outcome for an order whose budget ran out before placement started.
    pub fn expired_before_start(&self, accepted: Instant) -> OrderOutcome {
        let budget = self.policy.settings().timeout.budget();
        tracing::warn!(budget = ?budget, "Order budget spent waiting for a placement slot");
        enter(OrderPhase::PolicyFailure);
        enter(OrderPhase::Degraded);
        let degraded = fallback::degrade(
            &self.policy.settings().fallback,
            &ResilienceError::Timeout(budget),
        );
        finish(
            OrderOutcome::Degraded {
                reason: degraded.reason,
                message: degraded.message,
            },
            accepted,
        )
    }

    async fn run(&self, order: &CheckedOrder, accepted: Instant) -> OrderOutcome {
        enter(OrderPhase::CheckingStock);
        let stock = match self
            .policy
            .check_stock_since(order.query(), accepted)
            .await
        {
            StockCheck::Available(stock) => stock,
            StockCheck::Degraded(degraded) => {
                enter(OrderPhase::PolicyFailure);
                enter(OrderPhase::Degraded);
                return OrderOutcome::Degraded {
                    reason: degraded.reason,
                    message: degraded.message,
                };
            }
        };

        match order.evaluate(&stock) {
            StockDecision::Insufficient(shortfalls) => {
                enter(OrderPhase::PartialOrNoStock);
                tracing::info!(short_items = shortfalls.len(), "Order rejected, insufficient stock");
                enter(OrderPhase::Rejected);
                OrderOutcome::Rejected {
                    reason: OUT_OF_STOCK_REASON.to_string(),
                    shortfalls,
                }
            }
            StockDecision::AllInStock => {
                enter(OrderPhase::AllInStock);
                enter(OrderPhase::Persisting);
                match self.store.persist(order.request()).await {
                    Ok(order_id) => {
                        enter(OrderPhase::Placed);
                        OrderOutcome::Placed { order_id }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Stock confirmed but order could not be saved");
                        enter(OrderPhase::Degraded);
                        let degraded = fallback::degrade_persistence(&self.policy.settings().fallback);
                        OrderOutcome::Degraded {
                            reason: degraded.reason,
                            message: degraded.message,
                        }
                    }
                }
            }
        }
    }
}
