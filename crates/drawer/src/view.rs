//! Drawer view models and templates.
//!
//! Rendering is a pure function of a [`CartSnapshot`]: the snapshot is
//! flattened into display strings here and the markup comes from askama
//! templates, which escape every server-provided string.

use askama::Template;
use cart_drawer_core::{CartSnapshot, LineItem};

/// Cart item display data for templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItemView {
    pub key: String,
    pub title: String,
    pub variant_title: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub image: Option<ImageView>,
}

/// Image display data for templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageView {
    pub url: String,
}

/// Cart display data for templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total: String,
    pub item_count: u32,
}

impl CartView {
    /// Create an empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: "$0.00".to_string(),
            item_count: 0,
        }
    }

    /// Text for the header count badge.
    #[must_use]
    pub fn count_label(&self) -> String {
        self.item_count.to_string()
    }
}

// =============================================================================
// Type Conversions
// =============================================================================

impl From<&CartSnapshot> for CartView {
    fn from(cart: &CartSnapshot) -> Self {
        Self {
            items: cart.items().iter().map(CartItemView::from).collect(),
            total: cart.total_price().display(),
            item_count: cart.item_count(),
        }
    }
}

impl From<&LineItem> for CartItemView {
    fn from(line: &LineItem) -> Self {
        Self {
            key: line.key().to_string(),
            title: line.product_title().to_string(),
            variant_title: line.variant_label().map(String::from),
            quantity: line.quantity(),
            price: line.price().display(),
            image: line.thumbnail().map(|url| ImageView { url }),
        }
    }
}

/// Line item list fragment rendered into the drawer.
#[derive(Template)]
#[template(path = "cart/items.html")]
pub struct CartItemsTemplate<'a> {
    pub cart: &'a CartView,
    pub continue_shopping_url: &'a str,
}

/// Render the line item list for a cart.
///
/// # Errors
///
/// Returns an error if the template fails to render.
pub fn render_items(cart: &CartView, continue_shopping_url: &str) -> askama::Result<String> {
    CartItemsTemplate {
        cart,
        continue_shopping_url,
    }
    .render()
}
