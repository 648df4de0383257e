//! Integration tests for `HttpCartClient` against the mock store.
//!
//! These cover the wire contract: snapshot decoding, form and JSON adds,
//! quantity changes, the session cookie and how failures are classified.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use cart_drawer::{CartApi, CartError, HttpCartClient};
use cart_drawer_core::{AddForm, AddPayload, DecodeError, LineChange, LineItemKey, VariantId};
use cart_drawer_integration_tests::{MockServer, closed_origin, init_tracing};
use secrecy::SecretString;

async fn setup() -> (MockServer, HttpCartClient) {
    init_tracing();
    let server = MockServer::seeded().await.unwrap();
    let client = HttpCartClient::new(server.base_url(), None).unwrap();
    (server, client)
}

// =============================================================================
// Snapshot
// =============================================================================

#[tokio::test]
async fn test_fetch_empty_cart() {
    let (server, client) = setup().await;

    let cart = client.fetch().await.unwrap();

    assert!(cart.is_empty());
    assert_eq!(cart.total_price().cents(), 0);
    assert!(cart.items().is_empty());
    assert!(cart.token().is_some());
    assert_eq!(server.store().requests(), vec!["GET /cart.js"]);
}

#[tokio::test]
async fn test_session_cookie_keeps_one_cart() {
    let (server, client) = setup().await;

    let first = client.fetch().await.unwrap();
    let second = client.fetch().await.unwrap();

    assert_eq!(first.token(), second.token());
    assert_eq!(server.store().cart_tokens().len(), 1);
}

#[tokio::test]
async fn test_separate_clients_get_separate_carts() {
    let (server, client) = setup().await;
    let other = HttpCartClient::new(server.base_url(), None).unwrap();

    client
        .add(&AddPayload::variant(VariantId::new(39)))
        .await
        .unwrap();
    let theirs = other.fetch().await.unwrap();

    assert!(theirs.is_empty());
    assert_eq!(server.store().cart_tokens().len(), 2);
}

#[tokio::test]
async fn test_cart_token_resumes_cart() {
    let (server, _) = setup().await;
    let token = server.store().create_cart();
    let key = server.store().seed_line(&token, 40, 2);

    let client =
        HttpCartClient::new(server.base_url(), Some(&SecretString::from(token.clone()))).unwrap();
    let cart = client.fetch().await.unwrap();

    assert_eq!(cart.token(), Some(token.as_str()));
    assert_eq!(cart.item_count(), 2);
    let line = cart.item(&LineItemKey::new(key)).unwrap();
    assert_eq!(line.product_title(), "Calm");
    assert_eq!(line.variant_label(), None);
    assert_eq!(line.price().display(), "$25.99");
    assert_eq!(cart.total_price().display(), "$51.98");
}

// =============================================================================
// Add
// =============================================================================

#[tokio::test]
async fn test_add_variant_json() {
    let (_server, client) = setup().await;

    let added = client
        .add(&AddPayload::Variant {
            variant_id: VariantId::new(39),
            quantity: 2,
        })
        .await
        .unwrap();

    assert_eq!(added.id(), "39");
    let key = added.key().cloned().unwrap();
    assert!(key.as_str().starts_with("39:"));

    let cart = client.fetch().await.unwrap();
    let line = cart.item(&key).unwrap();
    assert_eq!(line.quantity(), 2);
    assert_eq!(line.variant_id(), Some(VariantId::new(39)));
    assert_eq!(line.variant_label(), Some("60 capsules"));
    assert_eq!(
        line.thumbnail().as_deref(),
        Some("https://cdn.example.com/files/focus_128x128.jpg")
    );
}

#[tokio::test]
async fn test_add_form_with_properties() {
    let (_server, client) = setup().await;
    let plain = AddForm::new(VariantId::new(39));
    let engraved = AddForm::new(VariantId::new(39))
        .quantity(3)
        .property("Engraving", "MV")
        .selling_plan("690");

    let plain_key = client.add(&plain.into()).await.unwrap().key().cloned();
    let engraved_key = client.add(&engraved.into()).await.unwrap().key().cloned();

    assert_ne!(plain_key, engraved_key);
    let cart = client.fetch().await.unwrap();
    assert_eq!(cart.items().len(), 2);
    assert_eq!(cart.item_count(), 4);
    assert_eq!(cart.total_price().display(), "$79.96");
}

#[tokio::test]
async fn test_repeat_add_merges_line() {
    let (_server, client) = setup().await;

    client
        .add(&AddPayload::variant(VariantId::new(41)))
        .await
        .unwrap();
    client
        .add(&AddPayload::variant(VariantId::new(41)))
        .await
        .unwrap();

    let cart = client.fetch().await.unwrap();
    assert_eq!(cart.items().len(), 1);
    assert_eq!(cart.items()[0].quantity(), 2);
    assert_eq!(
        cart.items()[0].thumbnail().as_deref(),
        Some("https://cdn.example.com/files/sleep_128x128.png?v=3")
    );
}

#[tokio::test]
async fn test_add_unknown_variant_is_rejected() {
    let (_server, client) = setup().await;

    let err = client
        .add(&AddPayload::variant(VariantId::new(999)))
        .await
        .unwrap_err();

    assert!(matches!(
        &err,
        CartError::Rejected { status: 422, message } if message == "Cannot find variant"
    ));
    assert_eq!(err.kind(), "rejected");
}

// =============================================================================
// Change
// =============================================================================

#[tokio::test]
async fn test_change_sets_and_removes() {
    let (_server, client) = setup().await;
    let key = client
        .add(&AddPayload::variant(VariantId::new(39)))
        .await
        .unwrap()
        .key()
        .cloned()
        .unwrap();

    client
        .change(&LineChange {
            id: key.clone(),
            quantity: 5,
        })
        .await
        .unwrap();
    assert_eq!(client.fetch().await.unwrap().item_count(), 5);

    client
        .change(&LineChange {
            id: key.clone(),
            quantity: 0,
        })
        .await
        .unwrap();
    let cart = client.fetch().await.unwrap();
    assert!(cart.is_empty());
    assert!(cart.item(&key).is_none());
}

#[tokio::test]
async fn test_change_unknown_line_is_rejected() {
    let (_server, client) = setup().await;

    let err = client
        .change(&LineChange {
            id: LineItemKey::new("nope"),
            quantity: 1,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, CartError::Rejected { status: 400, .. }));
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_server_error_is_rejected() {
    let (server, client) = setup().await;
    server
        .store()
        .respond_next(StatusCode::SERVICE_UNAVAILABLE, "upstream timed out");

    let err = client.fetch().await.unwrap_err();

    assert!(matches!(
        &err,
        CartError::Rejected { status: 503, message } if message == "upstream timed out"
    ));
    // only the next request is affected
    assert!(client.fetch().await.is_ok());
}

#[tokio::test]
async fn test_non_json_success_is_malformed() {
    let (server, client) = setup().await;
    server.store().respond_next(StatusCode::OK, "<html>maintenance</html>");

    let err = client.fetch().await.unwrap_err();

    assert!(matches!(err, CartError::Malformed(DecodeError::Json(_))));
    assert_eq!(err.kind(), "malformed");
}

#[tokio::test]
async fn test_add_reply_without_id_is_malformed() {
    let (server, client) = setup().await;
    server
        .store()
        .respond_next(StatusCode::OK, r#"{"status":"ok"}"#);

    let err = client
        .add(&AddPayload::variant(VariantId::new(39)))
        .await
        .unwrap_err();

    assert!(matches!(err, CartError::Malformed(DecodeError::MissingItemId)));
}

#[tokio::test]
async fn test_inconsistent_snapshot_is_malformed() {
    let (server, client) = setup().await;
    server.store().respond_next(
        StatusCode::OK,
        r#"{"item_count":3,"total_price":100,"items":[{"key":"a","product_title":"A","price":100,"quantity":1}]}"#,
    );

    let err = client.fetch().await.unwrap_err();

    assert!(matches!(
        err,
        CartError::Malformed(DecodeError::CountMismatch {
            declared: 3,
            actual: 1
        })
    ));
}

#[tokio::test]
async fn test_closed_port_is_network_error() {
    init_tracing();
    let client = HttpCartClient::new(&closed_origin().await.unwrap(), None).unwrap();

    let err = client.fetch().await.unwrap_err();

    assert!(matches!(err, CartError::Network(_)));
    assert_eq!(err.kind(), "network");
}
