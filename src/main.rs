//! Order Service (v1)
//!
//! Accepts orders over HTTP, checks stock with the inventory service and
//! commits orders that are fully in stock.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────────────┐
//!                  │                      ORDER SERVICE                       │
//!                  │                                                          │
//!   POST /api/order│  ┌─────────┐   ┌────────────┐   ┌──────────────┐         │
//!   ───────────────┼─▶│  http   │──▶│ dispatcher │──▶│ orchestrator │         │
//!                  │  │ server  │   │  (spawn)   │   │              │         │
//!                  │  └─────────┘   └────────────┘   └──────┬───────┘         │
//!                  │                                        │                 │
//!                  │                       ┌────────────────┴──────┐          │
//!                  │                       ▼                       ▼          │
//!                  │              ┌─────────────────┐      ┌─────────────┐    │
//!                  │              │   resilience    │      │ order store │    │
//!                  │              │ timeout / retry │      └─────────────┘    │
//!                  │              │ breaker/fallback│                         │
//!                  │              └────────┬────────┘                         │
//!                  │                       ▼                                  │
//!                  │              ┌─────────────────┐                         │
//!                  │              │ inventory client│─────────────────────────┼──▶ Inventory
//!                  │              └─────────────────┘                         │    Service
//!                  │                                                          │
//!                  │   config (TOML + watcher) · observability · lifecycle    │
//!                  └──────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use order_service::config::{self, watcher::ConfigWatcher, ServiceConfig};
use order_service::http::HttpServer;
use order_service::lifecycle::{self, signals, Shutdown, StartupError};
use order_service::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "order-service")]
#[command(about = "Order placement service", long_about = None)]
struct Args {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "ORDER_SERVICE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => config::load_config(path).map_err(StartupError::from)?,
        None => ServiceConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!("order-service v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        inventory = %config.inventory.base_url,
        max_retries = config.resilience.retry.max_retries,
        budget_ms = config.resilience.timeout.budget_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let components = lifecycle::assemble_default(&config, tokio::runtime::Handle::current())?;

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    // The watcher handle must stay alive for reloads to flow.
    let (updates, _watcher) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path, config.clone());
            match watcher.run() {
                Ok(handle) => (updates, Some(handle)),
                Err(e) => {
                    tracing::warn!(error = %e, "Config watcher unavailable, hot reload disabled");
                    (updates, None)
                }
            }
        }
        None => (tokio::sync::mpsc::unbounded_channel().1, None),
    };

    let shutdown = Arc::new(Shutdown::new());
    let shutdown_rx = shutdown.subscribe();
    signals::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config, components);
    server.run(listener, updates, shutdown_rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
