//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the stock client, breaker, policy, orchestrator and dispatcher
//!   in dependency order
//! - Surface construction failures as one error type
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Collaborators are injected so tests can substitute the stock client
//!   and the order store

use std::sync::Arc;

use thiserror::Error;
use tokio::runtime::Handle;

use crate::config::ServiceConfig;
use crate::inventory::{HttpStockClient, StockClient, StockClientError};
use crate::orders::{InMemoryOrderStore, OrderDispatcher, OrderOrchestrator, OrderStore};
use crate::resilience::{CircuitBreaker, ResiliencePolicy};

/// Name the inventory breaker reports under.
pub const INVENTORY_TARGET: &str = "inventory";

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("failed to build inventory client: {0}")]
    Inventory(#[from] StockClientError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Fully wired service internals, ready to be served.
#[derive(Clone)]
pub struct ServiceComponents {
    pub policy: Arc<ResiliencePolicy>,
    pub orchestrator: Arc<OrderOrchestrator>,
    pub dispatcher: Arc<OrderDispatcher>,
}

/// Wire the service around the given stock client and order store.
pub fn assemble(
    config: &ServiceConfig,
    client: Arc<dyn StockClient>,
    store: Arc<dyn OrderStore>,
    runtime: Handle,
) -> ServiceComponents {
    let breaker = Arc::new(CircuitBreaker::new(INVENTORY_TARGET));
    let policy = Arc::new(ResiliencePolicy::new(
        client,
        breaker,
        config.resilience.clone(),
    ));
    let orchestrator = Arc::new(OrderOrchestrator::new(policy.clone(), store));
    let dispatcher = Arc::new(OrderDispatcher::new(
        orchestrator.clone(),
        runtime,
        config.listener.max_in_flight_orders,
    ));

    tracing::debug!(
        target_service = INVENTORY_TARGET,
        max_in_flight = config.listener.max_in_flight_orders,
        "Service components assembled"
    );

    ServiceComponents {
        policy,
        orchestrator,
        dispatcher,
    }
}

/// Wire the service with the HTTP inventory client and the in-memory store.
pub fn assemble_default(
    config: &ServiceConfig,
    runtime: Handle,
) -> Result<ServiceComponents, StartupError> {
    let client = HttpStockClient::new(&config.inventory)?;
    tracing::info!(endpoint = %client.endpoint(), "Inventory client ready");
    Ok(assemble(
        config,
        Arc::new(client),
        Arc::new(InMemoryOrderStore::new()),
        runtime,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_assemble_default_shares_breaker() {
        let config = ServiceConfig::default();
        let components = assemble_default(&config, Handle::current()).unwrap();

        assert_eq!(components.policy.breaker().target(), INVENTORY_TARGET);
        assert!(Arc::ptr_eq(
            components.orchestrator.policy(),
            &components.policy
        ));
        assert_eq!(
            components.dispatcher.available_slots(),
            config.listener.max_in_flight_orders
        );
    }

    #[tokio::test]
    async fn test_assemble_default_rejects_bad_url() {
        let mut config = ServiceConfig::default();
        config.inventory.base_url = "not a url".into();
        assert!(matches!(
            assemble_default(&config, Handle::current()),
            Err(StartupError::Inventory(_))
        ));
    }
}
