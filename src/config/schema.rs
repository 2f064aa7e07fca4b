//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the order service.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the order service.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address, concurrency).
    pub listener: ListenerConfig,

    /// Inventory service endpoint.
    pub inventory: InventoryConfig,

    /// Retry, circuit breaker, timeout and fallback policies.
    pub resilience: ResilienceConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Upper bound on order placements running at once.
    pub max_in_flight_orders: usize,

    /// Whole-request timeout for the HTTP boundary in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_in_flight_orders: 256,
            request_timeout_secs: 30,
        }
    }
}

/// Inventory service endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct InventoryConfig {
    /// Base URL of the inventory service.
    pub base_url: String,

    /// Connection establishment timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// Single request timeout in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8082/".to_string(),
            connect_timeout_ms: 500,
            request_timeout_ms: 2000,
        }
    }
}

/// Policies wrapped around each stock lookup.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ResilienceConfig {
    pub retry: RetryConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub timeout: TimeoutConfig,
    pub fallback: FallbackConfig,
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// Enable retries.
    pub enabled: bool,

    /// Additional attempts after the first one.
    pub max_retries: u32,

    /// Delay between attempts.
    pub backoff: BackoffStrategy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: 2,
            backoff: BackoffStrategy::default(),
        }
    }
}

/// Delay strategy between retry attempts.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Same delay before every retry.
    Fixed { delay_ms: u64 },

    /// Doubling delay starting at `base_delay_ms`, capped at `max_delay_ms`.
    Exponential {
        base_delay_ms: u64,
        max_delay_ms: u64,
        #[serde(default = "default_jitter")]
        jitter: bool,
    },
}

fn default_jitter() -> bool {
    true
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self::Exponential {
            base_delay_ms: 100,
            max_delay_ms: 1000,
            jitter: true,
        }
    }
}

/// Circuit breaker configuration for the inventory endpoint.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Enable the breaker. When disabled every call passes through.
    pub enabled: bool,

    /// Failure ratio (0.0-1.0] at or above which the breaker opens.
    pub failure_threshold: f64,

    /// Number of most recent outcomes in the sliding window.
    pub window_size: usize,

    /// Outcomes required in the window before the ratio is evaluated.
    pub minimum_calls: usize,

    /// Time spent Open before a trial is allowed, in milliseconds.
    pub cooldown_ms: u64,

    /// Trial calls allowed concurrently while HalfOpen.
    pub half_open_trials: u32,
}

impl CircuitBreakerConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            failure_threshold: 0.5,
            window_size: 5,
            minimum_calls: 5,
            cooldown_ms: 5000,
            half_open_trials: 3,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Budget for the whole lookup including retries and backoff, in milliseconds.
    pub budget_ms: u64,

    /// Optional limit for a single attempt, in milliseconds.
    pub attempt_ms: Option<u64>,
}

impl TimeoutConfig {
    pub fn budget(&self) -> Duration {
        Duration::from_millis(self.budget_ms)
    }

    pub fn attempt(&self) -> Option<Duration> {
        self.attempt_ms.map(Duration::from_millis)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            budget_ms: 3000,
            attempt_ms: None,
        }
    }
}

/// Messages returned when the lookup or the commit cannot complete.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct FallbackConfig {
    /// Message for a lookup that failed after all policies.
    pub message: String,

    /// Message for an order whose stock check passed but could not be saved.
    pub persistence_message: String,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            message: "Oops! Something went wrong, please try again later!".to_string(),
            persistence_message: "Your order could not be saved, please try again later."
                .to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
