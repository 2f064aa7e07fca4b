//! Stock lookup request/response types and client errors.

use std::collections::HashMap;
use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced by a single stock lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockClientError {
    /// The query was rejected before any request was sent.
    #[error("invalid stock query: {0}")]
    InvalidRequest(String),

    /// Connection failure, non-success status or undecodable body.
    #[error("inventory transport error: {0}")]
    Transport(String),

    /// The individual request did not complete in time.
    #[error("inventory request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl StockClientError {
    /// Whether this error says something about the health of the inventory service.
    pub fn is_service_failure(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_))
    }
}

/// Ordered, deduplicated, non-empty set of item codes to look up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockQuery {
    codes: Vec<String>,
}

impl StockQuery {
    /// Build a query, keeping the first occurrence of each code.
    pub fn new<I, S>(codes: I) -> Result<Self, StockClientError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut unique = Vec::new();
        for code in codes {
            let code = code.into();
            if code.trim().is_empty() {
                return Err(StockClientError::InvalidRequest(
                    "item codes must not be blank".to_string(),
                ));
            }
            if seen.insert(code.clone()) {
                unique.push(code);
            }
        }

        if unique.is_empty() {
            return Err(StockClientError::InvalidRequest(
                "at least one item code is required".to_string(),
            ));
        }

        Ok(Self { codes: unique })
    }

    /// The codes in first-seen order.
    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// A constructed query is never empty.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// One entry of the inventory service response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemAvailability {
    #[serde(alias = "skuCode")]
    pub item_code: String,
    #[serde(alias = "isInStock")]
    pub available: bool,
    #[serde(default)]
    pub quantity: u64,
}

/// Availability of a single item code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Availability {
    pub available: bool,
    pub quantity: u64,
}

impl Availability {
    /// True when the item is flagged available and holds at least `requested` units.
    pub fn covers(&self, requested: u64) -> bool {
        self.available && self.quantity >= requested
    }
}

/// Availability per item code, produced once per successful lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StockResult {
    items: HashMap<String, Availability>,
}

impl StockResult {
    /// Build from response entries; correspondence is by item code, not position.
    ///
    /// If the service reports a code twice, the last entry wins.
    pub fn from_items<I>(items: I) -> Self
    where
        I: IntoIterator<Item = ItemAvailability>,
    {
        let items = items
            .into_iter()
            .map(|item| {
                (
                    item.item_code,
                    Availability {
                        available: item.available,
                        quantity: item.quantity,
                    },
                )
            })
            .collect();
        Self { items }
    }

    pub fn get(&self, item_code: &str) -> Option<&Availability> {
        self.items.get(item_code)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
