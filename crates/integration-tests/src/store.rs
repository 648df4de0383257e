//! In-memory stand-in for a storefront's AJAX cart.
//!
//! # Route Structure
//!
//! ```text
//! GET  /cart.js         - Cart snapshot for the session cart
//! POST /cart/add.js     - Add a form (urlencoded) or `{id, quantity}` (JSON)
//! POST /cart/change.js  - Set `{id: <line key>, quantity}`; 0 removes
//! ```
//!
//! Session carts are keyed on the `cart` cookie. A request without one gets a
//! fresh cart and a `Set-Cookie` header.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tower_http::trace::TraceLayer;

/// Cookie carrying the session cart token.
pub const CART_COOKIE: &str = "cart";

/// A sellable variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub title: String,
    pub variant_title: Option<String>,
    pub price: u64,
    pub image: Option<String>,
}

impl Product {
    #[must_use]
    pub fn new(title: &str, price: u64) -> Self {
        Self {
            title: title.to_string(),
            variant_title: None,
            price,
            image: None,
        }
    }

    #[must_use]
    pub fn variant_title(mut self, title: &str) -> Self {
        self.variant_title = Some(title.to_string());
        self
    }

    #[must_use]
    pub fn image(mut self, url: &str) -> Self {
        self.image = Some(url.to_string());
        self
    }
}

#[derive(Debug, Clone)]
struct Line {
    key: String,
    variant_id: u64,
    quantity: u32,
    properties: Vec<(String, String)>,
    selling_plan: Option<String>,
}

/// What an add request asks for, however it was encoded.
#[derive(Debug)]
struct AddRequest {
    variant_id: u64,
    quantity: u32,
    properties: Vec<(String, String)>,
    selling_plan: Option<String>,
}

impl AddRequest {
    /// Line key: variant id plus a hash of everything that splits lines.
    fn line_key(&self) -> String {
        let mut hasher = DefaultHasher::new();
        self.properties.hash(&mut hasher);
        self.selling_plan.hash(&mut hasher);
        format!("{}:{:016x}", self.variant_id, hasher.finish())
    }
}

#[derive(Debug, Deserialize)]
struct JsonAdd {
    id: u64,
    #[serde(default = "one")]
    quantity: u32,
}

const fn one() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
struct JsonChange {
    id: String,
    quantity: u32,
}

type HandlerResult = Result<Value, (StatusCode, Value)>;

#[derive(Debug, Default)]
struct StoreState {
    catalog: HashMap<u64, Product>,
    carts: HashMap<String, Vec<Line>>,
    next_cart: u64,
    requests: Vec<String>,
    canned: Option<(StatusCode, String)>,
}

impl StoreState {
    fn issue_token(&mut self) -> String {
        self.next_cart += 1;
        format!("c{}-mock", self.next_cart)
    }

    fn cart_json(&self, token: &str) -> Value {
        let lines = self.carts.get(token).map(Vec::as_slice).unwrap_or_default();
        let items: Vec<Value> = lines.iter().map(|line| self.line_json(line)).collect();
        let item_count: u32 = lines.iter().map(|line| line.quantity).sum();
        let total_price: u64 = lines.iter().map(|line| self.line_price(line)).sum();

        json!({
            "token": token,
            "item_count": item_count,
            "total_price": total_price,
            "currency": "USD",
            "items": items,
        })
    }

    fn line_price(&self, line: &Line) -> u64 {
        self.catalog
            .get(&line.variant_id)
            .map_or(0, |product| product.price * u64::from(line.quantity))
    }

    fn line_json(&self, line: &Line) -> Value {
        let product = self.catalog.get(&line.variant_id);
        let properties: Map<String, Value> = line
            .properties
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect();

        json!({
            "key": line.key,
            "id": line.variant_id,
            "variant_id": line.variant_id,
            "product_title": product.map(|p| p.title.as_str()),
            "variant_title": product.and_then(|p| p.variant_title.as_deref()),
            "price": product.map_or(0, |p| p.price),
            "line_price": self.line_price(line),
            "quantity": line.quantity,
            "image": product.and_then(|p| p.image.as_deref()),
            "properties": properties,
            "selling_plan": line.selling_plan,
        })
    }

    fn add(&mut self, token: &str, request: &AddRequest) -> HandlerResult {
        if !self.catalog.contains_key(&request.variant_id) {
            return Err(cart_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Cannot find variant",
            ));
        }
        if request.quantity == 0 {
            return Err(cart_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Quantity must be at least 1",
            ));
        }

        let key = request.line_key();
        let lines = self.carts.entry(token.to_string()).or_default();
        let line = match lines.iter().position(|line| line.key == key) {
            Some(index) => {
                let Some(line) = lines.get_mut(index) else {
                    return Err(cart_error(StatusCode::INTERNAL_SERVER_ERROR, "Line vanished"));
                };
                line.quantity += request.quantity;
                line.clone()
            }
            None => {
                let line = Line {
                    key,
                    variant_id: request.variant_id,
                    quantity: request.quantity,
                    properties: request.properties.clone(),
                    selling_plan: request.selling_plan.clone(),
                };
                lines.push(line.clone());
                line
            }
        };

        Ok(self.line_json(&line))
    }

    fn change(&mut self, token: &str, change: &JsonChange) -> HandlerResult {
        let lines = self.carts.entry(token.to_string()).or_default();
        let Some(index) = lines.iter().position(|line| line.key == change.id) else {
            return Err(cart_error(
                StatusCode::BAD_REQUEST,
                "Cannot update a line that does not exist",
            ));
        };

        if change.quantity == 0 {
            lines.remove(index);
        } else if let Some(line) = lines.get_mut(index) {
            line.quantity = change.quantity;
        }

        Ok(self.cart_json(token))
    }
}

/// Error body in the store's `{status, message, description}` shape.
fn cart_error(status: StatusCode, description: &str) -> (StatusCode, Value) {
    (
        status,
        json!({
            "status": status.as_u16(),
            "message": "Cart Error",
            "description": description,
        }),
    )
}

fn bad_request(description: &str) -> (StatusCode, Value) {
    (
        StatusCode::BAD_REQUEST,
        json!({
            "status": "bad_request",
            "message": "Parameter Missing or Invalid",
            "description": description,
        }),
    )
}

/// A mock store. Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct MockStore {
    inner: Arc<Mutex<StoreState>>,
}

impl MockStore {
    /// A store with an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store with the test catalog:
    ///
    /// - `39` Focus / 60 capsules, $19.99, with an image
    /// - `40` Calm / Default Title, $25.99, no image
    /// - `41` Sleep, $5.99, image with a query string
    #[must_use]
    pub fn seeded() -> Self {
        Self::new()
            .with_product(
                39,
                Product::new("Focus", 1999)
                    .variant_title("60 capsules")
                    .image("https://cdn.example.com/files/focus.jpg"),
            )
            .with_product(40, Product::new("Calm", 2599).variant_title("Default Title"))
            .with_product(
                41,
                Product::new("Sleep", 599).image("https://cdn.example.com/files/sleep.png?v=3"),
            )
    }

    #[must_use]
    pub fn with_product(self, variant_id: u64, product: Product) -> Self {
        self.state().catalog.insert(variant_id, product);
        self
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create an empty cart and return its token.
    #[must_use]
    pub fn create_cart(&self) -> String {
        let mut state = self.state();
        let token = state.issue_token();
        state.carts.insert(token.clone(), Vec::new());
        token
    }

    /// Put `quantity` units of a variant into a cart directly. Returns the line key.
    ///
    /// # Panics
    ///
    /// Panics if the variant is not in the catalog.
    pub fn seed_line(&self, token: &str, variant_id: u64, quantity: u32) -> String {
        let request = AddRequest {
            variant_id,
            quantity,
            properties: Vec::new(),
            selling_plan: None,
        };
        match self.state().add(token, &request) {
            Ok(line) => line
                .get("key")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            Err((status, body)) => panic!("cannot seed variant {variant_id}: {status} {body}"),
        }
    }

    /// `(key, quantity)` for every line in a cart, in cart order.
    #[must_use]
    pub fn lines(&self, token: &str) -> Vec<(String, u32)> {
        self.state()
            .carts
            .get(token)
            .map(|lines| {
                lines
                    .iter()
                    .map(|line| (line.key.clone(), line.quantity))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Tokens of every cart the store knows.
    #[must_use]
    pub fn cart_tokens(&self) -> Vec<String> {
        let mut tokens: Vec<String> = self.state().carts.keys().cloned().collect();
        tokens.sort();
        tokens
    }

    /// Requests served so far, as `"METHOD /path"`.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.state().requests.clone()
    }

    /// Answer the next request, whatever it is, with `status` and a raw body.
    pub fn respond_next(&self, status: StatusCode, body: &str) {
        self.state().canned = Some((status, body.to_string()));
    }

    /// Router serving the cart endpoints.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/cart.js", get(show))
            .route("/cart/add.js", post(add))
            .route("/cart/change.js", post(change))
            .layer(TraceLayer::new_for_http())
            .with_state(self.clone())
    }

    /// Record the request, resolve the session cart and run `handler` on it.
    fn handle(
        &self,
        request: &str,
        headers: &HeaderMap,
        handler: impl FnOnce(&mut StoreState, &str) -> HandlerResult,
    ) -> Response {
        let mut state = self.state();
        state.requests.push(request.to_string());

        if let Some((status, body)) = state.canned.take() {
            return (status, body).into_response();
        }

        let (token, issued) = match cart_cookie(headers) {
            Some(token) => (token, false),
            None => (state.issue_token(), true),
        };
        state.carts.entry(token.clone()).or_default();

        let result = handler(&mut *state, &token);
        drop(state);

        let mut response = match result {
            Ok(body) => Json(body).into_response(),
            Err((status, body)) => (status, Json(body)).into_response(),
        };
        if issued
            && let Ok(cookie) = HeaderValue::from_str(&format!("{CART_COOKIE}={token}; Path=/"))
        {
            response.headers_mut().insert(header::SET_COOKIE, cookie);
        }
        response
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn show(State(store): State<MockStore>, headers: HeaderMap) -> Response {
    store.handle("GET /cart.js", &headers, |state, token| {
        Ok(state.cart_json(token))
    })
}

async fn add(State(store): State<MockStore>, headers: HeaderMap, body: Bytes) -> Response {
    store.handle("POST /cart/add.js", &headers, |state, token| {
        let request = parse_add(&headers, &body)?;
        state.add(token, &request)
    })
}

async fn change(State(store): State<MockStore>, headers: HeaderMap, body: Bytes) -> Response {
    store.handle("POST /cart/change.js", &headers, |state, token| {
        let change: JsonChange = serde_json::from_slice(&body)
            .map_err(|_| bad_request("Required parameter missing or invalid: id"))?;
        state.change(token, &change)
    })
}

// =============================================================================
// Helper Functions
// =============================================================================

fn cart_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == CART_COOKIE)
        .map(|(_, token)| token.to_string())
}

fn parse_add(headers: &HeaderMap, body: &[u8]) -> Result<AddRequest, (StatusCode, Value)> {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));

    if is_json {
        let add: JsonAdd = serde_json::from_slice(body)
            .map_err(|_| bad_request("Required parameter missing or invalid: items"))?;
        return Ok(AddRequest {
            variant_id: add.id,
            quantity: add.quantity,
            properties: Vec::new(),
            selling_plan: None,
        });
    }

    let mut variant_id = None;
    let mut quantity = 1;
    let mut properties = Vec::new();
    let mut selling_plan = None;

    for (name, value) in url::form_urlencoded::parse(body) {
        match name.as_ref() {
            "id" => variant_id = value.parse().ok(),
            "quantity" => {
                quantity = value
                    .parse()
                    .map_err(|_| bad_request("Required parameter missing or invalid: quantity"))?;
            }
            "selling_plan" if !value.is_empty() => selling_plan = Some(value.into_owned()),
            other => {
                if let Some(property) = other
                    .strip_prefix("properties[")
                    .and_then(|rest| rest.strip_suffix(']'))
                {
                    properties.push((property.to_string(), value.into_owned()));
                }
            }
        }
    }

    let variant_id =
        variant_id.ok_or_else(|| bad_request("Required parameter missing or invalid: items"))?;
    Ok(AddRequest {
        variant_id,
        quantity,
        properties,
        selling_plan,
    })
}
