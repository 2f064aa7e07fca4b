//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define order service metrics (lookups, retries, breaker, outcomes)
//! - Expose a Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `inventory_stock_checks_total` (counter): policy-wrapped lookups by outcome
//! - `inventory_stock_check_duration_seconds` (histogram): lookup latency incl. retries
//! - `inventory_retries_total` (counter): retry attempts
//! - `inventory_circuit_transitions_total` (counter): breaker transitions by target, state
//! - `inventory_circuit_rejections_total` (counter): calls refused by an open breaker
//! - `inventory_circuit_state` (gauge): 0=closed, 1=half_open, 2=open
//! - `inventory_fallbacks_total` (counter): degraded responses by reason
//! - `orders_total` (counter): order outcomes by status
//! - `order_duration_seconds` (histogram): end-to-end placement latency
//!
//! # Design Decisions
//! - Recording without an installed recorder is a no-op, so tests need no setup
//! - Labels are low-cardinality enums, never item codes or order ids

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::resilience::{CircuitState, DegradedReason};

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_stock_check(outcome: &'static str, elapsed: Duration) {
    metrics::counter!("inventory_stock_checks_total", "outcome" => outcome).increment(1);
    metrics::histogram!("inventory_stock_check_duration_seconds", "outcome" => outcome)
        .record(elapsed.as_secs_f64());
}

pub fn record_retry() {
    metrics::counter!("inventory_retries_total").increment(1);
}

pub fn record_circuit_state(target: &str, state: CircuitState) {
    let value = match state {
        CircuitState::Closed => 0.0,
        CircuitState::HalfOpen => 1.0,
        CircuitState::Open => 2.0,
    };
    metrics::gauge!("inventory_circuit_state", "target" => target.to_string()).set(value);
}

pub fn record_circuit_transition(target: &str, to: CircuitState) {
    metrics::counter!(
        "inventory_circuit_transitions_total",
        "target" => target.to_string(),
        "state" => to.as_str()
    )
    .increment(1);
    record_circuit_state(target, to);
}

pub fn record_circuit_rejection(target: &str) {
    metrics::counter!("inventory_circuit_rejections_total", "target" => target.to_string())
        .increment(1);
}

pub fn record_fallback(reason: DegradedReason) {
    metrics::counter!("inventory_fallbacks_total", "reason" => reason.as_str()).increment(1);
}

pub fn record_order_outcome(status: &'static str, elapsed: Duration) {
    metrics::counter!("orders_total", "status" => status).increment(1);
    metrics::histogram!("order_duration_seconds", "status" => status)
        .record(elapsed.as_secs_f64());
}
