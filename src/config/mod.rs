//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → shared with the subsystems at startup
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → resilience policy swaps in the new settings
//! ```
//!
//! # Design Decisions
//! - Only resilience settings are hot-reloaded; listener and endpoint changes need a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    BackoffStrategy, CircuitBreakerConfig, FallbackConfig, InventoryConfig, ListenerConfig,
    LogFormat, ObservabilityConfig, ResilienceConfig, RetryConfig, ServiceConfig, TimeoutConfig,
};
