//! Asynchronous dispatch of order placements.
//!
//! # Responsibilities
//! - Run each placement as its own task on an explicit runtime
//! - Bound concurrent placements with a semaphore
//! - Hand the boundary a cancellable handle that always yields an outcome
//!
//! # Design Decisions
//! - Validation runs on the caller before spawning, so bad requests fail fast
//! - The stock check budget starts at dispatch; time queued for a slot counts
//! - Cancelling aborts the task; the abort lands on whatever the task is
//!   awaiting, including the policy's timeout scope
//! - Dropping a handle cancels the placement; `detach` lets it run on

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::orders::orchestrator::OrderOrchestrator;
use crate::orders::types::{CheckedOrder, OrderError, OrderOutcome, OrderRequest};
use crate::resilience::DegradedReason;

/// Message returned when a placement was cancelled before finishing.
const CANCELLED_MESSAGE: &str = "Order placement was cancelled";
/// Message returned when a placement task failed unexpectedly.
const INTERNAL_MESSAGE: &str = "Order placement failed unexpectedly, please try again later";

/// Spawns order placements off the accepting task.
pub struct OrderDispatcher {
    orchestrator: Arc<OrderOrchestrator>,
    runtime: Handle,
    permits: Arc<Semaphore>,
}

impl OrderDispatcher {
    /// Dispatch onto `runtime`, running at most `max_in_flight` placements at once.
    pub fn new(orchestrator: Arc<OrderOrchestrator>, runtime: Handle, max_in_flight: usize) -> Self {
        Self {
            orchestrator,
            runtime,
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
        }
    }

    pub fn orchestrator(&self) -> &Arc<OrderOrchestrator> {
        &self.orchestrator
    }

    /// Placements that could start right now without waiting.
    pub fn available_slots(&self) -> usize {
        self.permits.available_permits()
    }

    /// Validate `request` and start placing it in the background.
    pub fn dispatch(&self, request: OrderRequest) -> Result<PendingOrder, OrderError> {
        let order = CheckedOrder::try_from(request)?;
        let accepted = Instant::now();
        let orchestrator = self.orchestrator.clone();
        let permits = self.permits.clone();

        let handle = self.runtime.spawn(async move {
            let budget = orchestrator.policy().settings().timeout.budget();
            let _permit = match time::timeout_at(accepted + budget, permits.acquire_owned()).await {
                // The semaphore is never closed; a failed acquire runs the order unbounded.
                Ok(permit) => permit.ok(),
                Err(_) => return orchestrator.expired_before_start(accepted),
            };
            orchestrator.execute_since(order, accepted).await
        });

        Ok(PendingOrder {
            handle,
            detached: false,
        })
    }
}

/// Deferred result of a dispatched placement.
///
/// Awaiting it yields the outcome; a cancelled or failed task yields
/// `OrderOutcome::Degraded`. Dropping it before completion cancels the
/// placement, so an abandoned request never commits an order.
#[derive(Debug)]
pub struct PendingOrder {
    handle: JoinHandle<OrderOutcome>,
    detached: bool,
}

impl PendingOrder {
    /// Best-effort cancellation. Has no effect once the placement finished.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Let the placement run to completion without anyone awaiting it.
    pub fn detach(mut self) {
        self.detached = true;
    }
}

impl Drop for PendingOrder {
    fn drop(&mut self) {
        if !self.detached && !self.handle.is_finished() {
            tracing::debug!("Pending order dropped, cancelling placement");
            self.handle.abort();
        }
    }
}

impl Future for PendingOrder {
    type Output = OrderOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx).map(|joined| match joined {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => OrderOutcome::Degraded {
                reason: DegradedReason::Cancelled,
                message: CANCELLED_MESSAGE.to_string(),
            },
            Err(e) => {
                tracing::error!(error = %e, "Order placement task failed");
                OrderOutcome::Degraded {
                    reason: DegradedReason::Internal,
                    message: INTERNAL_MESSAGE.to_string(),
                }
            }
        })
    }
}
