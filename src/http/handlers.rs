//! Route handlers.
//!
//! Status mapping for `POST /api/order`:
//! - Placed → 201
//! - Rejected → 409
//! - Degraded → 503
//! - invalid body or order → 400
//!
//! A request dropped by the timeout layer or a disconnect cancels its placement.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::http::server::AppState;
use crate::orders::{OrderError, OrderOutcome, OrderRequest};
use crate::resilience::{CircuitSnapshot, CircuitState};

/// Body returned for requests that never reached the order workflow.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    fn bad_request(message: impl Into<String>) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(Self {
                error: message.into(),
            }),
        )
            .into_response()
    }
}

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub inventory_circuit: CircuitState,
    pub available_order_slots: usize,
}

fn outcome_status(outcome: &OrderOutcome) -> StatusCode {
    match outcome {
        OrderOutcome::Placed { .. } => StatusCode::CREATED,
        OrderOutcome::Rejected { .. } => StatusCode::CONFLICT,
        OrderOutcome::Degraded { .. } => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub async fn place_order(
    State(state): State<AppState>,
    payload: Result<Json<OrderRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Malformed order body");
            return ErrorBody::bad_request(rejection.body_text());
        }
    };

    let pending = match state.dispatcher.dispatch(request) {
        Ok(pending) => pending,
        Err(OrderError::InvalidRequest(reason)) => {
            tracing::debug!(reason = %reason, "Order rejected during validation");
            return ErrorBody::bad_request(reason);
        }
    };

    let outcome = pending.await;
    (outcome_status(&outcome), Json(outcome)).into_response()
}

pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    let circuit = state.breaker.state();
    Json(HealthReport {
        status: if circuit == CircuitState::Closed { "ok" } else { "degraded" },
        inventory_circuit: circuit,
        available_order_slots: state.dispatcher.available_slots(),
    })
}

pub async fn circuit(State(state): State<AppState>) -> Json<CircuitSnapshot> {
    Json(state.breaker.snapshot())
}
