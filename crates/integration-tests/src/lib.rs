//! Integration tests for the cart drawer.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cart-drawer-integration-tests
//! ```
//!
//! No external services are needed: each test starts a [`MockServer`] on an
//! ephemeral localhost port, backed by a [`MockStore`] that behaves like a
//! storefront's AJAX cart (session cookie, line keys, error bodies).
//!
//! # Test Categories
//!
//! - `http_client` - `HttpCartClient` against the mock store
//! - `drawer_flow` - `CartController` end to end
//! - `mock_store` - The mock's routes, driven through `tower::ServiceExt`

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod store;

use std::io;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

pub use store::{CART_COOKIE, MockStore, Product};

/// A [`MockStore`] served over HTTP. The server stops when this is dropped.
pub struct MockServer {
    addr: SocketAddr,
    base_url: Url,
    store: MockStore,
    handle: JoinHandle<()>,
}

impl MockServer {
    /// Serve `store` on an ephemeral localhost port.
    ///
    /// # Errors
    ///
    /// Returns error if the listener cannot be bound.
    pub async fn start(store: MockStore) -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let base_url = Url::parse(&format!("http://{addr}")).map_err(io::Error::other)?;

        let app = store.router();
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Mock store stopped: {e}");
            }
        });
        tracing::debug!(%addr, "Mock store listening");

        Ok(Self {
            addr,
            base_url,
            store,
            handle,
        })
    }

    /// Serve the seeded test catalog.
    ///
    /// # Errors
    ///
    /// Returns error if the listener cannot be bound.
    pub async fn seeded() -> io::Result<Self> {
        Self::start(MockStore::seeded()).await
    }

    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Store origin, e.g. `http://127.0.0.1:41234/`.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub const fn store(&self) -> &MockStore {
        &self.store
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Install a test-friendly tracing subscriber once per test binary.
///
/// Honors `RUST_LOG`; defaults to warnings only.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
}

/// An origin nothing is listening on.
///
/// # Errors
///
/// Returns error if a probe listener cannot be bound.
pub async fn closed_origin() -> io::Result<Url> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Url::parse(&format!("http://{addr}")).map_err(io::Error::other)
}
