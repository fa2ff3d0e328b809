//! Integration tests for Rocket Cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rocket-cart-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `inventory_client` - REST client against a stub inventory service
//! - `cart_manager` - Cart operations end to end: HTTP lookups, file-backed
//!   persistence, notifications
//!
//! Tests run against [`StubInventory`], an axum server bound to an ephemeral
//! local port that serves `/products/{id}` and `/stock/{id}` the way the
//! real service does.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use rocket_cart::config::InventoryConfig;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use url::Url;

/// Seconds advertised in `Retry-After` when the stub rate-limits.
pub const RETRY_AFTER_SECS: u64 = 7;

#[derive(Default)]
struct StubState {
    products: Mutex<HashMap<i32, Value>>,
    stock: Mutex<HashMap<i32, Value>>,
    product_hits: AtomicUsize,
    stock_hits: AtomicUsize,
    failure: Mutex<Option<StatusCode>>,
    delay: Mutex<Duration>,
    last_authorization: Mutex<Option<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl StubState {
    /// Shared request handling: record the call, then delay or fail if told to.
    async fn prelude(&self, headers: &HeaderMap) -> Option<Response> {
        *lock(&self.last_authorization) = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let delay = *lock(&self.delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let failure = *lock(&self.failure);
        failure.map(|status| {
            if status == StatusCode::TOO_MANY_REQUESTS {
                (
                    status,
                    [(header::RETRY_AFTER, RETRY_AFTER_SECS.to_string())],
                    "slow down",
                )
                    .into_response()
            } else {
                (status, "stub failure").into_response()
            }
        })
    }
}

async fn product(
    State(state): State<Arc<StubState>>,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> Response {
    state.product_hits.fetch_add(1, Ordering::SeqCst);
    if let Some(response) = state.prelude(&headers).await {
        return response;
    }
    let record = lock(&state.products).get(&id).cloned();
    record.map_or_else(
        || StatusCode::NOT_FOUND.into_response(),
        |v| axum::Json(v).into_response(),
    )
}

async fn stock(
    State(state): State<Arc<StubState>>,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> Response {
    state.stock_hits.fetch_add(1, Ordering::SeqCst);
    if let Some(response) = state.prelude(&headers).await {
        return response;
    }
    let record = lock(&state.stock).get(&id).cloned();
    record.map_or_else(
        || StatusCode::NOT_FOUND.into_response(),
        |v| axum::Json(v).into_response(),
    )
}

/// In-process stand-in for the inventory service.
///
/// The server task is aborted when the stub is dropped.
pub struct StubInventory {
    state: Arc<StubState>,
    base_url: Url,
    server: JoinHandle<()>,
}

impl StubInventory {
    /// Start a stub on an ephemeral local port.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener can't be bound.
    pub async fn spawn() -> std::io::Result<Self> {
        let state = Arc::new(StubState::default());
        let app = Router::new()
            .route("/products/{id}", get(product))
            .route("/stock/{id}", get(stock))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let base_url =
            Url::parse(&format!("http://{addr}/")).map_err(std::io::Error::other)?;
        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                report_server_exit(&e);
            }
        });

        Ok(Self {
            state,
            base_url,
            server,
        })
    }

    /// Base URL of the stub, with a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> Url {
        self.base_url.clone()
    }

    /// Client configuration pointing at the stub.
    #[must_use]
    pub fn config(&self) -> InventoryConfig {
        InventoryConfig::new(self.base_url())
    }

    /// Serve a product in the service's wire shape.
    pub fn insert_product(&self, id: i32, title: &str, price: f64) {
        self.insert_product_raw(
            id,
            json!({
                "id": id,
                "title": title,
                "price": price,
                "image": format!("https://cdn.example.com/{id}.jpg"),
            }),
        );
    }

    /// Serve an arbitrary body for `/products/{id}`.
    pub fn insert_product_raw(&self, id: i32, body: Value) {
        lock(&self.state.products).insert(id, body);
    }

    /// Serve a stock record.
    pub fn set_stock(&self, id: i32, amount: u32) {
        lock(&self.state.stock).insert(id, json!({ "id": id, "amount": amount }));
    }

    /// Serve an arbitrary body for `/stock/{id}`.
    pub fn set_stock_raw(&self, id: i32, body: Value) {
        lock(&self.state.stock).insert(id, body);
    }

    /// Stop serving a stock record (404 from now on).
    pub fn remove_stock(&self, id: i32) {
        lock(&self.state.stock).remove(&id);
    }

    /// Answer every request with `status`, or recover with `None`.
    pub fn fail_with(&self, status: Option<StatusCode>) {
        *lock(&self.state.failure) = status;
    }

    /// Hold every response for `delay`.
    pub fn set_delay(&self, delay: Duration) {
        *lock(&self.state.delay) = delay;
    }

    /// Requests received on `/products/{id}`.
    #[must_use]
    pub fn product_hits(&self) -> usize {
        self.state.product_hits.load(Ordering::SeqCst)
    }

    /// Requests received on `/stock/{id}`.
    #[must_use]
    pub fn stock_hits(&self) -> usize {
        self.state.stock_hits.load(Ordering::SeqCst)
    }

    /// `Authorization` header of the most recent request.
    #[must_use]
    pub fn last_authorization(&self) -> Option<String> {
        lock(&self.state.last_authorization).clone()
    }
}

impl Drop for StubInventory {
    fn drop(&mut self) {
        self.server.abort();
    }
}

#[allow(clippy::print_stderr)]
fn report_server_exit(error: &std::io::Error) {
    eprintln!("stub inventory server stopped: {error}");
}
