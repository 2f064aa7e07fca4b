//! Client for the order service HTTP API.

pub mod client;

pub use client::{
    CircuitSnapshot, HealthReport, LineItem, OrderClient, OrderResponse, PlaceOrderRequest,
    SdkError, Shortfall,
};
