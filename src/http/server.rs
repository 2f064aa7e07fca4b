//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the order and status handlers
//! - Wire up middleware (request id, tracing, request timeout)
//! - Apply configuration reloads to the resilience policy
//! - Serve until the shutdown coordinator fires

use axum::{
    body::Body,
    http::Request,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServiceConfig;
use crate::http::{handlers, request};
use crate::lifecycle::startup::ServiceComponents;
use crate::orders::OrderDispatcher;
use crate::resilience::{CircuitBreaker, ResiliencePolicy};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<OrderDispatcher>,
    pub breaker: Arc<CircuitBreaker>,
}

/// HTTP front end of the order service.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
    policy: Arc<ResiliencePolicy>,
}

impl HttpServer {
    /// Create a new HTTP server over already assembled components.
    pub fn new(config: ServiceConfig, components: ServiceComponents) -> Self {
        let state = AppState {
            dispatcher: components.dispatcher.clone(),
            breaker: components.policy.breaker().clone(),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            policy: components.policy,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        Router::new()
            .route("/api/order", post(handlers::place_order))
            .route("/api/inventory/circuit", get(handlers::circuit))
            .route("/health", get(handlers::health))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(request::set_request_id())
                    .layer(
                        TraceLayer::new_for_http()
                            .make_span_with(|req: &Request<Body>| request::make_span(req)),
                    )
                    .layer(request::propagate_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.listener.request_timeout_secs,
                    ))),
            )
    }

    /// The router, for driving the service without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configs arriving on `config_updates` replace the resilience settings;
    /// the listener itself is not rebound.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ServiceConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let policy = self.policy.clone();
        let bind_address = self.config.listener.bind_address.clone();
        let reloads = tokio::spawn(async move {
            while let Some(updated) = config_updates.recv().await {
                if updated.listener.bind_address != bind_address {
                    tracing::warn!(
                        configured = %updated.listener.bind_address,
                        active = %bind_address,
                        "Listener address changes require a restart"
                    );
                }
                policy.reload(updated.resilience);
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloads.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}
