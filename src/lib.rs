//! Order placement service with a resilient inventory dependency.

pub mod config;
pub mod http;
pub mod inventory;
pub mod lifecycle;
pub mod observability;
pub mod orders;
pub mod resilience;

pub use config::schema::ServiceConfig;
pub use http::HttpServer;
pub use inventory::{HttpStockClient, StockClient};
pub use lifecycle::Shutdown;
pub use orders::{OrderDispatcher, OrderOrchestrator, OrderOutcome, OrderRequest};
pub use resilience::{ResiliencePolicy, StockCheck};
