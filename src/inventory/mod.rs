//! Inventory lookup subsystem.
//!
//! # Data Flow
//! ```text
//! Order line items
//!     → types.rs (StockQuery: deduplicated, non-empty item codes)
//!     → client.rs (one GET against the inventory service)
//!     → types.rs (StockResult: availability keyed by item code)
//! ```
//!
//! # Design Decisions
//! - The client issues exactly one request per call; retries belong to `resilience`
//! - Lookups are idempotent and side-effect free, so they are always safe to retry
//! - Empty queries are unrepresentable: `StockQuery::new` rejects them up front

pub mod client;
pub mod types;

pub use client::{HttpStockClient, StockClient};
pub use types::{Availability, ItemAvailability, StockClientError, StockQuery, StockResult};
