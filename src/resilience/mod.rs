//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Stock lookup:
//!     → timeouts.rs (one deadline for the whole lookup)
//!     → retries.rs (retry transient failures with backoff.rs delays)
//!     → circuit_breaker.rs (fail fast while the endpoint is down)
//!     → inventory client
//!     → fallback.rs (degraded response once everything above gave up)
//! policy.rs composes the layers in that fixed order.
//! ```
//!
//! # Design Decisions
//! - The timeout bounds retries too, so callers get a predictable worst case
//! - The breaker sits innermost so an open circuit costs no I/O
//! - The breaker is injected, one instance per remote target
//! - Failures never escape the fallback; it is the terminal boundary

pub mod backoff;
pub mod circuit_breaker;
pub mod fallback;
pub mod policy;
pub mod retries;
pub mod timeouts;
pub mod types;

pub use circuit_breaker::{CircuitBreaker, CircuitSnapshot, CircuitState};
pub use policy::ResiliencePolicy;
pub use types::{Degradation, DegradedReason, ResilienceError, StockCheck};
