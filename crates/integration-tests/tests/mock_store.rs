//! The mock store's routes, driven in-process through `tower::ServiceExt`.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use cart_drawer_core::{AddedItem, CartSnapshot};
use cart_drawer_integration_tests::MockStore;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn send(store: &MockStore, request: Request<Body>) -> Response {
    store.router().oneshot(request).await.unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get_cart(cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get("/cart.js");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(path: &str, cookie: &str, body: &Value) -> Request<Body> {
    Request::post(path)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_new_session_gets_cookie() {
    let store = MockStore::seeded();

    let response = send(&store, get_cart(None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("cart=c1-mock"));

    let cart = CartSnapshot::from_value(body_json(response).await).unwrap();
    assert_eq!(cart.token(), Some("c1-mock"));
    assert!(cart.is_empty());
}

#[tokio::test]
async fn test_known_session_gets_no_cookie() {
    let store = MockStore::seeded();
    let token = store.create_cart();

    let response = send(&store, get_cart(Some(&format!("cart={token}")))).await;

    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(store.cart_tokens(), vec![token]);
}

#[tokio::test]
async fn test_add_reply_names_line() {
    let store = MockStore::seeded();
    let token = store.create_cart();
    let cookie = format!("cart={token}");

    let response = send(
        &store,
        post_json("/cart/add.js", &cookie, &json!({"id": 39, "quantity": 2})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["product_title"], "Focus");
    assert_eq!(body["quantity"], 2);
    assert_eq!(body["line_price"], 3998);
    let added = AddedItem::from_value(&body).unwrap();
    assert_eq!(added.id(), "39");
    assert_eq!(
        store.lines(&token),
        vec![(added.key().unwrap().to_string(), 2)]
    );
}

#[tokio::test]
async fn test_form_add() {
    let store = MockStore::seeded();
    let token = store.create_cart();

    let request = Request::post("/cart/add.js")
        .header(header::COOKIE, format!("cart={token}"))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("id=41&quantity=3&properties%5BNote%5D=gift"))
        .unwrap();
    let body = body_json(send(&store, request).await).await;

    assert_eq!(body["quantity"], 3);
    assert_eq!(body["properties"], json!({"Note": "gift"}));
}

#[tokio::test]
async fn test_change_returns_cart() {
    let store = MockStore::seeded();
    let token = store.create_cart();
    let key = store.seed_line(&token, 40, 1);
    let cookie = format!("cart={token}");

    let response = send(
        &store,
        post_json("/cart/change.js", &cookie, &json!({"id": key, "quantity": 4})),
    )
    .await;

    let cart = CartSnapshot::from_value(body_json(response).await).unwrap();
    assert_eq!(cart.item_count(), 4);
    assert_eq!(cart.total_price().display(), "$103.96");
}

#[tokio::test]
async fn test_error_bodies() {
    let store = MockStore::seeded();
    let cookie = format!("cart={}", store.create_cart());

    let response = send(
        &store,
        post_json("/cart/add.js", &cookie, &json!({"id": 7})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["description"], "Cannot find variant");

    let response = send(
        &store,
        post_json("/cart/change.js", &cookie, &json!({"id": "7:none", "quantity": 1})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &store,
        post_json("/cart/change.js", &cookie, &json!({"quantity": 1})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["message"],
        "Parameter Missing or Invalid"
    );
}

#[tokio::test]
async fn test_requests_are_recorded() {
    let store = MockStore::seeded();

    send(&store, get_cart(None)).await;
    send(&store, get_cart(None)).await;

    assert_eq!(store.requests(), vec!["GET /cart.js", "GET /cart.js"]);
    assert_eq!(store.cart_tokens().len(), 2);
}
