//! End-to-end tests: `CartController` over HTTP against the mock store.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use cart_drawer::dom::ids;
use cart_drawer::{
    AddTrigger, CartController, DrawerConfig, DrawerEvent, HttpCartClient, MemoryDocument,
    MemoryElement, QuantityChange, SyncPolicy,
};
use cart_drawer_core::{AddForm, AddPayload, LineItemKey, VariantId};
use cart_drawer_integration_tests::{MockServer, closed_origin, init_tracing};
use secrecy::SecretString;

type Drawer = CartController<HttpCartClient, MemoryElement, MemoryDocument>;

fn bind(config: &DrawerConfig) -> (Drawer, MemoryDocument) {
    let page = MemoryDocument::drawer();
    let client = HttpCartClient::from_config(config).unwrap();
    let drawer = CartController::from_config(client, &page, page.clone(), config);
    (drawer, page)
}

async fn setup() -> (MockServer, Drawer, MemoryDocument) {
    init_tracing();
    let server = MockServer::seeded().await.unwrap();
    let (drawer, page) = bind(&DrawerConfig::new(server.base_url().clone()));
    (server, drawer, page)
}

fn text(page: &MemoryDocument, id: &str) -> String {
    page.element(id).unwrap().text()
}

fn items_html(page: &MemoryDocument) -> String {
    page.element(ids::CART_ITEMS).unwrap().html()
}

// =============================================================================
// Refresh
// =============================================================================

#[tokio::test]
async fn test_refresh_empty_cart() {
    let (_server, drawer, page) = setup().await;

    drawer.refresh().await;

    assert_eq!(text(&page, ids::HEADER_CART_COUNT), "0");
    assert_eq!(text(&page, ids::CART_TOTAL), "$0.00");
    assert!(items_html(&page).contains("Your cart is empty"));
    assert!(items_html(&page).contains(r#"href="/collections/all""#));
    assert!(!drawer.is_open());
}

#[tokio::test]
async fn test_refresh_resumed_cart() {
    init_tracing();
    let server = MockServer::seeded().await.unwrap();
    let token = server.store().create_cart();
    let focus = server.store().seed_line(&token, 39, 2);
    let calm = server.store().seed_line(&token, 40, 1);

    let mut config = DrawerConfig::new(server.base_url().clone());
    config.cart_token = Some(SecretString::from(token));
    let (drawer, page) = bind(&config);

    drawer.refresh().await;

    assert_eq!(text(&page, ids::HEADER_CART_COUNT), "3");
    assert_eq!(text(&page, ids::CART_TOTAL), "$65.97");
    let html = items_html(&page);
    let focus_at = html.find(&format!(r#"data-line-item-key="{focus}""#)).unwrap();
    let calm_at = html.find(&format!(r#"data-line-item-key="{calm}""#)).unwrap();
    assert!(focus_at < calm_at);
    assert!(html.contains("focus_128x128.jpg"));
    assert!(html.contains(r#"<div class="cart-item-variant">60 capsules</div>"#));
    assert_eq!(html.matches("cart-item-variant").count(), 1);
}

// =============================================================================
// Add
// =============================================================================

#[tokio::test]
async fn test_add_opens_drawer_with_new_line() {
    let (server, drawer, page) = setup().await;

    let added = drawer
        .try_add_item(&AddForm::new(VariantId::new(39)).quantity(2).into())
        .await
        .unwrap();

    assert!(drawer.is_open());
    assert_eq!(page.body_overflow(), "hidden");
    assert!(page.element(ids::CART_SIDEBAR).unwrap().has_class("active"));
    assert_eq!(text(&page, ids::HEADER_CART_COUNT), "2");
    assert_eq!(text(&page, ids::CART_TOTAL), "$39.98");
    let key = added.key().unwrap();
    assert!(items_html(&page).contains(&format!(r#"data-key="{key}""#)));
    assert_eq!(
        server.store().requests(),
        vec!["POST /cart/add.js", "GET /cart.js"]
    );
}

#[tokio::test]
async fn test_failed_add_leaves_drawer_closed() {
    let (server, drawer, page) = setup().await;

    drawer
        .add_item(&AddPayload::variant(VariantId::new(999)))
        .await;

    assert!(!drawer.is_open());
    assert!(page.overflow_writes().is_empty());
    assert_eq!(text(&page, ids::HEADER_CART_COUNT), "");
    assert_eq!(server.store().requests(), vec!["POST /cart/add.js"]);
}

#[tokio::test]
async fn test_add_trigger_events() {
    let (server, drawer, page) = setup().await;

    drawer
        .dispatch(DrawerEvent::AddToCart(AddTrigger::ProductId("41".to_string())))
        .await;
    drawer.dispatch(DrawerEvent::KeyDown("Escape".to_string())).await;
    drawer
        .dispatch(DrawerEvent::MobileAddToCart(Some(
            AddForm::new(VariantId::new(41)).quantity(2),
        )))
        .await;

    assert!(drawer.is_open());
    assert_eq!(text(&page, ids::HEADER_CART_COUNT), "3");
    assert_eq!(page.overflow_writes(), vec!["hidden", "", "hidden"]);
    assert_eq!(server.store().cart_tokens().len(), 1);
}

// =============================================================================
// Quantity
// =============================================================================

#[tokio::test]
async fn test_row_clicks_step_and_remove() {
    let (server, drawer, page) = setup().await;
    let key = drawer
        .try_add_item(&AddPayload::variant(VariantId::new(39)))
        .await
        .unwrap()
        .key()
        .cloned()
        .unwrap();
    let click = |class: &str| DrawerEvent::ItemsClicked {
        classes: vec!["qty-btn".to_string(), class.to_string()],
        key: Some(key.to_string()),
    };

    drawer.dispatch(click("qty-increase")).await;
    assert_eq!(text(&page, ids::HEADER_CART_COUNT), "2");
    assert!(items_html(&page).contains(r#"<span class="qty-value">2</span>"#));

    drawer.dispatch(click("qty-decrease")).await;
    drawer.dispatch(click("qty-decrease")).await;

    assert_eq!(text(&page, ids::HEADER_CART_COUNT), "0");
    assert!(items_html(&page).contains("Your cart is empty"));
    let token = &server.store().cart_tokens()[0];
    assert!(server.store().lines(token).is_empty());
}

#[tokio::test]
async fn test_change_missing_line_sends_nothing() {
    let (server, drawer, _page) = setup().await;

    let change = drawer
        .try_change_quantity(&LineItemKey::new("39:gone"), 1)
        .await
        .unwrap();

    assert_eq!(change, QuantityChange::Missing);
    assert_eq!(server.store().requests(), vec!["GET /cart.js"]);
}

#[tokio::test]
async fn test_remove_item() {
    init_tracing();
    let server = MockServer::seeded().await.unwrap();
    let token = server.store().create_cart();
    let focus = server.store().seed_line(&token, 39, 1);
    let sleep = server.store().seed_line(&token, 41, 3);
    let mut config = DrawerConfig::new(server.base_url().clone());
    config.cart_token = Some(SecretString::from(token.clone()));
    let (drawer, page) = bind(&config);

    drawer.remove_item(&LineItemKey::new(sleep)).await;

    assert_eq!(server.store().lines(&token), vec![(focus, 1)]);
    assert_eq!(text(&page, ids::HEADER_CART_COUNT), "1");
    assert_eq!(text(&page, ids::CART_TOTAL), "$19.99");
    assert_eq!(
        server.store().requests(),
        vec!["POST /cart/change.js", "GET /cart.js"]
    );
}

#[tokio::test]
async fn test_concurrent_increases_both_apply() {
    let (server, drawer, page) = setup().await;
    assert_eq!(drawer.policy(), SyncPolicy::Serialized);
    let key = drawer
        .try_add_item(&AddPayload::variant(VariantId::new(40)))
        .await
        .unwrap()
        .key()
        .cloned()
        .unwrap();

    let (first, second, third) = tokio::join!(
        drawer.try_change_quantity(&key, 1),
        drawer.try_change_quantity(&key, 1),
        drawer.try_change_quantity(&key, 1),
    );
    first.unwrap();
    second.unwrap();
    third.unwrap();

    let token = &server.store().cart_tokens()[0];
    assert_eq!(server.store().lines(token), vec![(key.to_string(), 4)]);
    assert_eq!(text(&page, ids::HEADER_CART_COUNT), "4");
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_server_error_keeps_last_render() {
    let (server, drawer, page) = setup().await;
    drawer
        .add_item(&AddPayload::variant(VariantId::new(39)))
        .await;
    let before = items_html(&page);

    server
        .store()
        .respond_next(StatusCode::INTERNAL_SERVER_ERROR, "boom");
    drawer.refresh().await;

    assert_eq!(items_html(&page), before);
    assert_eq!(text(&page, ids::HEADER_CART_COUNT), "1");
}

#[tokio::test]
async fn test_unreachable_store_degrades_silently() {
    init_tracing();
    let config = DrawerConfig::new(closed_origin().await.unwrap());
    let (drawer, page) = bind(&config);

    drawer.refresh().await;
    drawer
        .add_item(&AddPayload::variant(VariantId::new(39)))
        .await;
    drawer.change_quantity(&LineItemKey::new("39:a"), 1).await;
    drawer.remove_item(&LineItemKey::new("39:a")).await;

    assert!(!drawer.is_open());
    assert_eq!(items_html(&page), "");
    assert!(drawer.try_refresh().await.is_err());
}
