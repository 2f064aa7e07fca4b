//! Fallback: the terminal error boundary of a stock lookup.
//!
//! Turns whatever failure survived the other policies into a degraded
//! response. Infallible by construction.

use crate::config::FallbackConfig;
use crate::observability::metrics;
use crate::resilience::types::{Degradation, DegradedReason, ResilienceError};

/// Degraded response for a lookup that failed after retries, on an open
/// circuit, or on budget exhaustion.
pub fn degrade(config: &FallbackConfig, error: &ResilienceError) -> Degradation {
    let reason = DegradedReason::from(error);
    tracing::warn!(reason = reason.as_str(), error = %error, "Stock check failed, using fallback");
    metrics::record_fallback(reason);
    Degradation {
        reason,
        message: config.message.clone(),
    }
}

/// Degraded response for an order whose stock check passed but whose commit failed.
pub fn degrade_persistence(config: &FallbackConfig) -> Degradation {
    metrics::record_fallback(DegradedReason::Persistence);
    Degradation {
        reason: DegradedReason::Persistence,
        message: config.persistence_message.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::StockClientError;

    #[test]
    fn test_uses_configured_message() {
        let config = FallbackConfig {
            message: "inventory unavailable".into(),
            persistence_message: "not saved".into(),
        };
        let degraded = degrade(
            &config,
            &ResilienceError::Stock(StockClientError::Transport("refused".into())),
        );
        assert_eq!(degraded.reason, DegradedReason::Unavailable);
        assert_eq!(degraded.message, "inventory unavailable");

        let degraded = degrade_persistence(&config);
        assert_eq!(degraded.reason, DegradedReason::Persistence);
        assert_eq!(degraded.message, "not saved");
    }
}
