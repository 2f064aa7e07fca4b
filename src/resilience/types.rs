//! Resilience error taxonomy and the fallback-aware lookup result.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::inventory::{StockClientError, StockResult};

/// Failure of a stock lookup after the policies had their say.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResilienceError {
    /// The breaker for `target` rejected the call without any I/O.
    #[error("circuit for {target} is open")]
    CircuitOpen { target: String },

    /// The overall budget, retries and backoff included, ran out.
    #[error("stock check exceeded its {}ms budget", .0.as_millis())]
    Timeout(Duration),

    /// The last attempt's own failure.
    #[error(transparent)]
    Stock(#[from] StockClientError),
}

/// Why an order ended up Degraded rather than Placed or Rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradedReason {
    /// The inventory breaker was open.
    CircuitOpen,
    /// The overall lookup budget was exhausted.
    Timeout,
    /// The inventory service kept failing until retries ran out.
    Unavailable,
    /// Stock was confirmed but the order could not be committed.
    Persistence,
    /// The caller cancelled the placement before it finished.
    Cancelled,
    /// The placement task died unexpectedly.
    Internal,
}

impl DegradedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CircuitOpen => "circuit_open",
            Self::Timeout => "timeout",
            Self::Unavailable => "unavailable",
            Self::Persistence => "persistence",
            Self::Cancelled => "cancelled",
            Self::Internal => "internal",
        }
    }
}

impl From<&ResilienceError> for DegradedReason {
    fn from(error: &ResilienceError) -> Self {
        match error {
            ResilienceError::CircuitOpen { .. } => Self::CircuitOpen,
            ResilienceError::Timeout(_) => Self::Timeout,
            ResilienceError::Stock(_) => Self::Unavailable,
        }
    }
}

/// A substituted response produced by the fallback policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Degradation {
    pub reason: DegradedReason,
    pub message: String,
}

/// Outcome of a policy-wrapped stock lookup. Never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockCheck {
    /// The inventory service answered.
    Available(StockResult),
    /// The lookup failed and the fallback took over.
    Degraded(Degradation),
}
