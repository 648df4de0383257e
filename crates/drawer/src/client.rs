//! Remote cart client.
//!
//! Talks to the store's AJAX cart endpoints:
//!
//! - `GET  {base}/cart.js` - current cart snapshot
//! - `POST {base}/cart/add.js` - add a form or a single variant
//! - `POST {base}/cart/change.js` - set a line's quantity (0 removes it)
//!
//! The session cart lives behind a `cart` cookie, so the HTTP client keeps
//! a cookie jar for its whole lifetime.

use std::future::Future;
use std::sync::Arc;

use cart_drawer_core::{AddPayload, AddedItem, CartSnapshot, LineChange, VariantLine};
use reqwest::cookie::Jar;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument};
use url::Url;

use crate::config::DrawerConfig;
use crate::error::{CartError, Result};

/// Name of the cookie the store keys session carts on.
pub const CART_COOKIE: &str = "cart";

/// Longest slice of an error body kept in a [`CartError::Rejected`] message.
const MAX_ERROR_BODY: usize = 200;

/// Operations the controller needs from the remote cart.
///
/// The HTTP implementation is [`HttpCartClient`]; tests substitute scripted
/// fakes to control response ordering.
pub trait CartApi: Send + Sync {
    /// Fetch the current cart snapshot.
    fn fetch(&self) -> impl Future<Output = Result<CartSnapshot>> + Send;

    /// Add items to the cart.
    fn add(&self, payload: &AddPayload) -> impl Future<Output = Result<AddedItem>> + Send;

    /// Set a line's quantity. The reply body is not consumed.
    fn change(&self, change: &LineChange) -> impl Future<Output = Result<()>> + Send;
}

impl<T: CartApi> CartApi for Arc<T> {
    fn fetch(&self) -> impl Future<Output = Result<CartSnapshot>> + Send {
        (**self).fetch()
    }

    fn add(&self, payload: &AddPayload) -> impl Future<Output = Result<AddedItem>> + Send {
        (**self).add(payload)
    }

    fn change(&self, change: &LineChange) -> impl Future<Output = Result<()>> + Send {
        (**self).change(change)
    }
}

// =============================================================================
// HttpCartClient
// =============================================================================

/// Client for the store's AJAX cart endpoints.
///
/// Cheap to clone; clones share the connection pool and cookie jar.
#[derive(Clone)]
pub struct HttpCartClient {
    inner: Arc<HttpCartClientInner>,
}

struct HttpCartClientInner {
    client: reqwest::Client,
    cart_endpoint: String,
    add_endpoint: String,
    change_endpoint: String,
}

impl HttpCartClient {
    /// Create a client for the store at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(base_url: &Url, cart_token: Option<&SecretString>) -> Result<Self> {
        let jar = Jar::default();
        if let Some(token) = cart_token {
            jar.add_cookie_str(
                &format!("{CART_COOKIE}={}; Path=/", token.expose_secret()),
                base_url,
            );
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .cookie_provider(Arc::new(jar))
            .build()?;

        let base = base_url.as_str().trim_end_matches('/');

        Ok(Self {
            inner: Arc::new(HttpCartClientInner {
                client,
                cart_endpoint: format!("{base}/cart.js"),
                add_endpoint: format!("{base}/cart/add.js"),
                change_endpoint: format!("{base}/cart/change.js"),
            }),
        })
    }

    /// Create a client from drawer configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn from_config(config: &DrawerConfig) -> Result<Self> {
        Self::new(&config.base_url, config.cart_token.as_ref())
    }

    /// Snapshot endpoint URL.
    #[must_use]
    pub fn cart_endpoint(&self) -> &str {
        &self.inner.cart_endpoint
    }

    /// Read a reply body, turning non-success statuses into [`CartError::Rejected`].
    async fn read_body(response: reqwest::Response) -> Result<String> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(CartError::Rejected {
                status: status.as_u16(),
                message: rejection_message(&body),
            });
        }

        Ok(body)
    }
}

impl CartApi for HttpCartClient {
    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<CartSnapshot> {
        let response = self
            .inner
            .client
            .get(&self.inner.cart_endpoint)
            .send()
            .await?;
        let body = Self::read_body(response).await?;
        let snapshot = CartSnapshot::from_json(&body)?;

        debug!(
            item_count = snapshot.item_count(),
            lines = snapshot.items().len(),
            "Fetched cart"
        );
        Ok(snapshot)
    }

    #[instrument(skip(self, payload))]
    async fn add(&self, payload: &AddPayload) -> Result<AddedItem> {
        let request = self.inner.client.post(&self.inner.add_endpoint);
        let request = match payload {
            AddPayload::Form(form) => request.form(form.fields()),
            AddPayload::Variant {
                variant_id,
                quantity,
            } => request.json(&VariantLine {
                id: *variant_id,
                quantity: *quantity,
            }),
        };

        let body = Self::read_body(request.send().await?).await?;
        let item = AddedItem::from_json(&body)?;

        debug!(item_id = item.id(), "Added to cart");
        Ok(item)
    }

    #[instrument(skip(self, change), fields(key = %change.id, quantity = change.quantity))]
    async fn change(&self, change: &LineChange) -> Result<()> {
        let response = self
            .inner
            .client
            .post(&self.inner.change_endpoint)
            .json(change)
            .send()
            .await?;
        Self::read_body(response).await?;
        Ok(())
    }
}

/// Pick a human-readable message out of an error reply.
///
/// The store answers errors with `{"status", "message", "description"}`;
/// `description` is the specific one. Non-JSON bodies are truncated.
fn rejection_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for field in ["description", "message"] {
            if let Some(text) = value.get(field).and_then(serde_json::Value::as_str)
                && !text.is_empty()
            {
                return text.to_string();
            }
        }
    }

    body.chars().take(MAX_ERROR_BODY).collect()
}
