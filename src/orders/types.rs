//! Order request/outcome types and the stock decision rule.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::inventory::{StockQuery, StockResult};
use crate::resilience::DegradedReason;

/// Reason given to the caller when an order cannot be fulfilled from stock.
pub const OUT_OF_STOCK_REASON: &str = "Product is not in stock, please try again later";

/// Caller errors. Raised before any remote call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("invalid order request: {0}")]
    InvalidRequest(String),
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
    #[serde(alias = "skuCode")]
    pub item_code: String,
    #[serde(alias = "quantity")]
    pub requested_quantity: u32,
}

impl OrderLineItem {
    pub fn new(item_code: impl Into<String>, requested_quantity: u32) -> Self {
        Self {
            item_code: item_code.into(),
            requested_quantity,
        }
    }
}

/// An order as received from the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    #[serde(alias = "orderLineItemsDtoList")]
    pub line_items: Vec<OrderLineItem>,
}

impl OrderRequest {
    pub fn new(line_items: Vec<OrderLineItem>) -> Self {
        Self { line_items }
    }
}

/// Units of one item code requested across all lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDemand {
    pub item_code: String,
    pub requested: u64,
}

/// An item the inventory cannot cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Shortfall {
    pub item_code: String,
    pub requested: u64,
    pub available: u64,
}

/// Result of comparing an order with a stock lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockDecision {
    AllInStock,
    Insufficient(Vec<Shortfall>),
}

/// A validated order together with the stock query derived from it.
#[derive(Debug, Clone)]
pub struct CheckedOrder {
    request: OrderRequest,
    query: StockQuery,
    demand: Vec<ItemDemand>,
}

impl TryFrom<OrderRequest> for CheckedOrder {
    type Error = OrderError;

    fn try_from(request: OrderRequest) -> Result<Self, Self::Error> {
        if request.line_items.is_empty() {
            return Err(OrderError::InvalidRequest(
                "an order needs at least one line item".to_string(),
            ));
        }

        let mut totals: HashMap<String, u64> = HashMap::new();
        for (index, line) in request.line_items.iter().enumerate() {
            if line.item_code.trim().is_empty() {
                return Err(OrderError::InvalidRequest(format!(
                    "line {} has an empty item code",
                    index + 1
                )));
            }
            if line.requested_quantity == 0 {
                return Err(OrderError::InvalidRequest(format!(
                    "line {} ({}) must request a quantity above zero",
                    index + 1,
                    line.item_code
                )));
            }
            *totals.entry(line.item_code.clone()).or_default() +=
                u64::from(line.requested_quantity);
        }

        let query = StockQuery::new(request.line_items.iter().map(|l| l.item_code.clone()))
            .map_err(|e| OrderError::InvalidRequest(e.to_string()))?;
        let demand = query
            .codes()
            .iter()
            .map(|code| ItemDemand {
                item_code: code.clone(),
                requested: totals.get(code).copied().unwrap_or_default(),
            })
            .collect();

        Ok(Self {
            request,
            query,
            demand,
        })
    }
}

impl CheckedOrder {
    pub fn request(&self) -> &OrderRequest {
        &self.request
    }

    pub fn query(&self) -> &StockQuery {
        &self.query
    }

    /// Demand per distinct item code, in query order.
    pub fn demand(&self) -> &[ItemDemand] {
        &self.demand
    }

    /// All-or-nothing: every item must be available in the requested quantity.
    pub fn evaluate(&self, stock: &StockResult) -> StockDecision {
        let shortfalls: Vec<Shortfall> = self
            .demand
            .iter()
            .filter_map(|item| {
                let availability = stock.get(&item.item_code);
                match availability {
                    Some(a) if a.covers(item.requested) => None,
                    _ => Some(Shortfall {
                        item_code: item.item_code.clone(),
                        requested: item.requested,
                        available: availability
                            .filter(|a| a.available)
                            .map_or(0, |a| a.quantity),
                    }),
                }
            })
            .collect();

        if shortfalls.is_empty() {
            StockDecision::AllInStock
        } else {
            StockDecision::Insufficient(shortfalls)
        }
    }
}

/// What the caller gets back for one order placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OrderOutcome {
    /// Stock confirmed and order committed.
    #[serde(rename_all = "camelCase")]
    Placed { order_id: Uuid },

    /// At least one item cannot be covered; nothing was committed.
    Rejected {
        reason: String,
        shortfalls: Vec<Shortfall>,
    },

    /// The stock check or the commit could not complete.
    Degraded {
        reason: DegradedReason,
        message: String,
    },
}

impl OrderOutcome {
    /// Short status label, also used as a metrics label.
    pub fn status(&self) -> &'static str {
        match self {
            OrderOutcome::Placed { .. } => "placed",
            OrderOutcome::Rejected { .. } => "rejected",
            OrderOutcome::Degraded { .. } => "degraded",
        }
    }

    pub fn order_id(&self) -> Option<Uuid> {
        match self {
            OrderOutcome::Placed { order_id } => Some(*order_id),
            _ => None,
        }
    }
}
