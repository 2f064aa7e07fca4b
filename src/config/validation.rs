//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (ratios, windows, timeouts)
//! - Check addresses and URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system, including on reload

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{BackoffStrategy, ServiceConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: invalid URL '{value}'")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field}: must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field}: {value} is outside {range}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        range: &'static str,
    },

    #[error("{field}: {detail}")]
    Inconsistent {
        field: &'static str,
        detail: String,
    },
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.listener.max_in_flight_orders == 0 {
        errors.push(ValidationError::Zero {
            field: "listener.max_in_flight_orders",
        });
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero {
            field: "listener.request_timeout_secs",
        });
    }

    match Url::parse(&config.inventory.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        _ => errors.push(ValidationError::InvalidUrl {
            field: "inventory.base_url",
            value: config.inventory.base_url.clone(),
        }),
    }
    if config.inventory.request_timeout_ms == 0 {
        errors.push(ValidationError::Zero {
            field: "inventory.request_timeout_ms",
        });
    }

    let resilience = &config.resilience;
    match resilience.retry.backoff {
        BackoffStrategy::Fixed { delay_ms } => {
            if delay_ms == 0 {
                errors.push(ValidationError::Zero {
                    field: "resilience.retry.backoff.delay_ms",
                });
            }
        }
        BackoffStrategy::Exponential {
            base_delay_ms,
            max_delay_ms,
            ..
        } => {
            if base_delay_ms == 0 {
                errors.push(ValidationError::Zero {
                    field: "resilience.retry.backoff.base_delay_ms",
                });
            }
            if base_delay_ms > max_delay_ms {
                errors.push(ValidationError::Inconsistent {
                    field: "resilience.retry.backoff",
                    detail: format!(
                        "base_delay_ms ({}) exceeds max_delay_ms ({})",
                        base_delay_ms, max_delay_ms
                    ),
                });
            }
        }
    }

    let breaker = &resilience.circuit_breaker;
    if !(breaker.failure_threshold > 0.0 && breaker.failure_threshold <= 1.0) {
        errors.push(ValidationError::OutOfRange {
            field: "resilience.circuit_breaker.failure_threshold",
            value: breaker.failure_threshold,
            range: "(0, 1]",
        });
    }
    if breaker.window_size == 0 {
        errors.push(ValidationError::Zero {
            field: "resilience.circuit_breaker.window_size",
        });
    }
    if breaker.minimum_calls == 0 {
        errors.push(ValidationError::Zero {
            field: "resilience.circuit_breaker.minimum_calls",
        });
    } else if breaker.minimum_calls > breaker.window_size {
        errors.push(ValidationError::Inconsistent {
            field: "resilience.circuit_breaker.minimum_calls",
            detail: format!(
                "{} exceeds window_size {}",
                breaker.minimum_calls, breaker.window_size
            ),
        });
    }
    if breaker.half_open_trials == 0 {
        errors.push(ValidationError::Zero {
            field: "resilience.circuit_breaker.half_open_trials",
        });
    }

    let timeout = &resilience.timeout;
    if timeout.budget_ms == 0 {
        errors.push(ValidationError::Zero {
            field: "resilience.timeout.budget_ms",
        });
    }
    match timeout.attempt_ms {
        Some(0) => errors.push(ValidationError::Zero {
            field: "resilience.timeout.attempt_ms",
        }),
        Some(attempt) if attempt > timeout.budget_ms => {
            errors.push(ValidationError::Inconsistent {
                field: "resilience.timeout.attempt_ms",
                detail: format!("{} exceeds budget_ms {}", attempt, timeout.budget_ms),
            })
        }
        _ => {}
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ServiceConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = ServiceConfig::default();
        config.listener.bind_address = "nowhere".to_string();
        config.inventory.base_url = "ftp://inventory/".to_string();
        config.resilience.circuit_breaker.minimum_calls = 10;
        config.resilience.timeout.attempt_ms = Some(10_000);
        config.resilience.retry.backoff = BackoffStrategy::Exponential {
            base_delay_ms: 500,
            max_delay_ms: 100,
            jitter: false,
        };

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.contains(&ValidationError::InvalidUrl {
            field: "inventory.base_url",
            value: "ftp://inventory/".to_string(),
        }));
    }

    #[test]
    fn test_threshold_bounds() {
        let mut config = ServiceConfig::default();
        config.resilience.circuit_breaker.failure_threshold = 1.0;
        assert!(validate_config(&config).is_ok());

        config.resilience.circuit_breaker.failure_threshold = 0.0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors[0].to_string(),
            "resilience.circuit_breaker.failure_threshold: 0 is outside (0, 1]"
        );
    }

    #[test]
    fn test_metrics_address_ignored_when_disabled() {
        let mut config = ServiceConfig::default();
        config.observability.metrics_enabled = false;
        config.observability.metrics_address = "bogus".to_string();
        assert!(validate_config(&config).is_ok());
    }
}
