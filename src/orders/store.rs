//! Order persistence.
//!
//! # Responsibilities
//! - Define the commit contract used once stock is confirmed
//! - Provide an in-process store keyed by order number
//!
//! # Design Decisions
//! - A successful `persist` is durable; the orchestrator never retries it
//! - Order numbers are random UUIDs assigned by the store

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::orders::types::{OrderLineItem, OrderRequest};

/// Failure to commit an order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    #[error("order store unavailable: {0}")]
    Unavailable(String),

    #[error("order rejected by store: {0}")]
    Rejected(String),
}

/// Durable commit of an accepted order.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist `order` and return its order number.
    async fn persist(&self, order: &OrderRequest) -> Result<Uuid, PersistenceError>;
}

/// A committed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredOrder {
    pub order_number: Uuid,
    pub line_items: Vec<OrderLineItem>,
    /// Seconds since the Unix epoch.
    pub placed_at: u64,
}

/// Thread-safe in-memory `OrderStore`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
    inner: Arc<DashMap<Uuid, StoredOrder>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, order_number: &Uuid) -> Option<StoredOrder> {
        self.inner.get(order_number).map(|r| r.value().clone())
    }

    pub fn count(&self) -> usize {
        self.inner.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn persist(&self, order: &OrderRequest) -> Result<Uuid, PersistenceError> {
        let order_number = Uuid::new_v4();
        let placed_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        self.inner.insert(
            order_number,
            StoredOrder {
                order_number,
                line_items: order.line_items.clone(),
                placed_at,
            },
        );
        tracing::info!(order_number = %order_number, lines = order.line_items.len(), "Order saved");
        Ok(order_number)
    }
}
