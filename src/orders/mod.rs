//! Order placement subsystem.
//!
//! # Data Flow
//! ```text
//! OrderRequest
//!     → dispatcher.rs (validate, spawn, hand back PendingOrder)
//!     → orchestrator.rs (check stock via resilience, decide)
//!     → store.rs (commit accepted orders)
//!     → OrderOutcome: Placed | Rejected | Degraded
//! ```

pub mod dispatcher;
pub mod orchestrator;
pub mod store;
pub mod types;

pub use dispatcher::{OrderDispatcher, PendingOrder};
pub use orchestrator::{OrderOrchestrator, OrderPhase};
pub use store::{InMemoryOrderStore, OrderStore, PersistenceError, StoredOrder};
pub use types::{
    CheckedOrder, ItemDemand, OrderError, OrderLineItem, OrderOutcome, OrderRequest, Shortfall,
    StockDecision,
};
