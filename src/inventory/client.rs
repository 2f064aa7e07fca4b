//! Inventory service client.
//!
//! # Responsibilities
//! - Define the stock lookup contract consumed by the resilience layer
//! - Issue exactly one HTTP request per lookup
//! - Classify failures as transport errors or timeouts
//!
//! # Design Decisions
//! - Repeated `skuCode` query parameters, one per deduplicated item code
//! - Connect and request timeouts are enforced by the HTTP client itself
//! - A non-2xx status is a transport error; the body is never trusted

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::config::InventoryConfig;
use crate::inventory::types::{ItemAvailability, StockClientError, StockQuery, StockResult};

/// Query parameter the inventory service expects for each item code.
const ITEM_CODE_PARAM: &str = "skuCode";

/// One logical stock lookup against the inventory service.
///
/// Implementations must be idempotent and must not retry internally.
#[async_trait]
pub trait StockClient: Send + Sync {
    async fn check_stock(&self, query: &StockQuery) -> Result<StockResult, StockClientError>;
}

/// `StockClient` backed by the inventory service's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpStockClient {
    client: reqwest::Client,
    endpoint: Url,
    request_timeout: Duration,
}

impl HttpStockClient {
    /// Create a client for the configured inventory service.
    pub fn new(config: &InventoryConfig) -> Result<Self, StockClientError> {
        let base: Url = config.base_url.parse().map_err(|e| {
            StockClientError::InvalidRequest(format!(
                "invalid inventory base URL '{}': {}",
                config.base_url, e
            ))
        })?;
        let endpoint = base.join("api/inventory").map_err(|e| {
            StockClientError::InvalidRequest(format!("invalid inventory endpoint: {}", e))
        })?;

        let request_timeout = Duration::from_millis(config.request_timeout_ms);
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(request_timeout)
            .build()
            .map_err(|e| StockClientError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            request_timeout,
        })
    }

    /// The fully-qualified lookup endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn classify(&self, error: reqwest::Error) -> StockClientError {
        if error.is_timeout() {
            StockClientError::Timeout(self.request_timeout)
        } else {
            StockClientError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl StockClient for HttpStockClient {
    async fn check_stock(&self, query: &StockQuery) -> Result<StockResult, StockClientError> {
        let params: Vec<(&str, &str)> = query
            .codes()
            .iter()
            .map(|code| (ITEM_CODE_PARAM, code.as_str()))
            .collect();

        tracing::debug!(endpoint = %self.endpoint, items = query.len(), "Checking stock");

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&params)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StockClientError::Transport(format!(
                "inventory service returned status {}",
                status
            )));
        }

        let items: Vec<ItemAvailability> = response.json().await.map_err(|e| self.classify(e))?;
        Ok(StockResult::from_items(items))
    }
}
