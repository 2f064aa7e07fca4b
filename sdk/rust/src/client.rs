use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service rejected the request ({status}): {body}")]
    Status { status: StatusCode, body: String },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub item_code: String,
    pub requested_quantity: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub line_items: Vec<LineItem>,
}

impl PlaceOrderRequest {
    pub fn item(mut self, item_code: impl Into<String>, requested_quantity: u32) -> Self {
        self.line_items.push(LineItem {
            item_code: item_code.into(),
            requested_quantity,
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shortfall {
    pub item_code: String,
    pub requested: u64,
    pub available: u64,
}

/// Outcome of `POST /api/order`, tagged by `status`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OrderResponse {
    #[serde(rename_all = "camelCase")]
    Placed { order_id: String },
    Rejected {
        reason: String,
        #[serde(default)]
        shortfalls: Vec<Shortfall>,
    },
    Degraded { reason: String, message: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub inventory_circuit: String,
    pub available_order_slots: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CircuitSnapshot {
    pub target: String,
    pub state: String,
    pub calls: usize,
    pub failures: usize,
    pub trials_in_flight: u32,
}

pub struct OrderClient {
    client: Client,
    base_url: String,
}

impl OrderClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Place an order. Placed, rejected and degraded outcomes are all `Ok`;
    /// only a 400 or an unexpected status is an error.
    pub async fn place_order(&self, req: &PlaceOrderRequest) -> Result<OrderResponse, SdkError> {
        let resp = self
            .client
            .post(format!("{}/api/order", self.base_url))
            .json(req)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        match status {
            StatusCode::CREATED | StatusCode::CONFLICT | StatusCode::SERVICE_UNAVAILABLE => {
                Ok(serde_json::from_str(&text)?)
            }
            _ => Err(SdkError::Status { status, body: text }),
        }
    }

    pub async fn health(&self) -> Result<HealthReport, SdkError> {
        self.get_json("/health").await
    }

    /// Current state of the inventory circuit breaker.
    pub async fn circuit(&self) -> Result<CircuitSnapshot, SdkError> {
        self.get_json("/api/inventory/circuit").await
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, SdkError> {
        let resp = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(SdkError::Status { status, body: text });
        }
        Ok(serde_json::from_str(&text)?)
    }
}
