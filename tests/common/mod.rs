//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use uuid::Uuid;

use order_service::config::{BackoffStrategy, ResilienceConfig, ServiceConfig};
use order_service::http::HttpServer;
use order_service::inventory::{
    ItemAvailability, StockClient, StockClientError, StockQuery, StockResult,
};
use order_service::lifecycle::{assemble, ServiceComponents, Shutdown};
use order_service::orders::{
    InMemoryOrderStore, OrderLineItem, OrderRequest, OrderStore, PersistenceError,
};

/// One scripted answer from the stock client.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Every queried code has this many units.
    Quantity(u64),
    /// Fixed per-item answers.
    Items(Vec<(&'static str, u64)>),
    /// Transport failure.
    Fail,
    /// Never answers.
    Hang,
    /// Answer with the inner reply after a delay.
    Slow(Duration, Box<Reply>),
}

/// Stock client answering from a script, then repeating a default reply.
pub struct ScriptedStockClient {
    script: Mutex<VecDeque<Reply>>,
    default: Mutex<Reply>,
    calls: AtomicU32,
}

impl ScriptedStockClient {
    pub fn always(reply: Reply) -> Arc<Self> {
        Self::scripted(Vec::new(), reply)
    }

    pub fn scripted(script: Vec<Reply>, default: Reply) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            default: Mutex::new(default),
            calls: AtomicU32::new(0),
        })
    }

    /// Replace the default reply, e.g. when the inventory recovers.
    pub fn set_default(&self, reply: Reply) {
        *self.default.lock().unwrap() = reply;
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_reply(&self) -> Reply {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.default.lock().unwrap().clone())
    }
}

async fn answer(reply: Reply, query: &StockQuery) -> Result<StockResult, StockClientError> {
    let mut reply = reply;
    loop {
        match reply {
            Reply::Quantity(quantity) => {
                return Ok(StockResult::from_items(query.codes().iter().map(|code| {
                    ItemAvailability {
                        item_code: code.clone(),
                        available: quantity > 0,
                        quantity,
                    }
                })))
            }
            Reply::Items(items) => {
                return Ok(StockResult::from_items(items.into_iter().map(
                    |(code, quantity)| ItemAvailability {
                        item_code: code.to_string(),
                        available: quantity > 0,
                        quantity,
                    },
                )))
            }
            Reply::Fail => return Err(StockClientError::Transport("connection refused".into())),
            Reply::Hang => std::future::pending::<()>().await,
            Reply::Slow(delay, inner) => {
                tokio::time::sleep(delay).await;
                reply = *inner;
            }
        }
    }
}

#[async_trait]
impl StockClient for ScriptedStockClient {
    async fn check_stock(&self, query: &StockQuery) -> Result<StockResult, StockClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.next_reply();
        answer(reply, query).await
    }
}

/// Order store that counts commits and can be told to fail.
#[derive(Clone, Default)]
pub struct RecordingOrderStore {
    inner: InMemoryOrderStore,
    attempts: Arc<AtomicU32>,
    failing: Arc<std::sync::atomic::AtomicBool>,
}

impl RecordingOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let store = Self::default();
        store.failing.store(true, Ordering::SeqCst);
        store
    }

    /// Commit attempts, successful or not.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Orders actually committed.
    pub fn committed(&self) -> usize {
        self.inner.count()
    }

    pub fn contains(&self, order_number: &Uuid) -> bool {
        self.inner.get(order_number).is_some()
    }
}

#[async_trait]
impl OrderStore for RecordingOrderStore {
    async fn persist(&self, order: &OrderRequest) -> Result<Uuid, PersistenceError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable("database offline".into()));
        }
        self.inner.persist(order).await
    }
}

/// Build an order from `(item code, quantity)` pairs.
pub fn order(items: &[(&str, u32)]) -> OrderRequest {
    OrderRequest::new(
        items
            .iter()
            .map(|(code, quantity)| OrderLineItem::new(*code, *quantity))
            .collect(),
    )
}

/// Resilience settings with fixed backoff, for predictable timings.
pub fn resilience(max_retries: u32, delay_ms: u64, budget_ms: u64) -> ResilienceConfig {
    let mut config = ResilienceConfig::default();
    config.retry.max_retries = max_retries;
    config.retry.backoff = BackoffStrategy::Fixed { delay_ms };
    config.timeout.budget_ms = budget_ms;
    config
}

/// Service internals around the given collaborators, on the current runtime.
pub fn components(
    resilience: ResilienceConfig,
    client: Arc<dyn StockClient>,
    store: Arc<dyn OrderStore>,
) -> ServiceComponents {
    let slots = ServiceConfig::default().listener.max_in_flight_orders;
    components_with_slots(resilience, slots, client, store)
}

/// Like [`components`], with at most `slots` placements running at once.
pub fn components_with_slots(
    resilience: ResilienceConfig,
    slots: usize,
    client: Arc<dyn StockClient>,
    store: Arc<dyn OrderStore>,
) -> ServiceComponents {
    let mut config = ServiceConfig::default();
    config.resilience = resilience;
    config.listener.max_in_flight_orders = slots;
    assemble(&config, client, store, tokio::runtime::Handle::current())
}

/// Running HTTP service bound to an ephemeral port.
pub struct TestService {
    pub addr: SocketAddr,
    pub components: ServiceComponents,
    shutdown: Shutdown,
}

impl TestService {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestService {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Serve `config` with the given collaborators on 127.0.0.1:0.
pub async fn start_service(
    mut config: ServiceConfig,
    client: Arc<dyn StockClient>,
    store: Arc<dyn OrderStore>,
) -> TestService {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.listener.bind_address = addr.to_string();

    let components = assemble(&config, client, store, tokio::runtime::Handle::current());
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let (_, config_updates) = tokio::sync::mpsc::unbounded_channel();

    let server = HttpServer::new(config, components.clone());
    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    TestService {
        addr,
        components,
        shutdown,
    }
}

/// Start a programmable inventory backend on an ephemeral port.
///
/// `f` receives the raw request head and returns the status and JSON body.
pub async fn start_mock_inventory<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let mut head = Vec::new();
                        let mut buf = [0u8; 1024];
                        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                            match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => return,
                                Ok(n) => head.extend_from_slice(&buf[..n]),
                            }
                        }

                        let (status, body) = f(String::from_utf8_lossy(&head).into_owned()).await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}
