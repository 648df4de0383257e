//! Cart commands.
//!
//! Each command builds a drawer over an in-memory page, runs one controller
//! operation against the live store and prints what the drawer shows.
//! Commands use the controller's `try_` operations so failures reach the
//! exit code instead of only the log.

use std::io::{self, Write};

use cart_drawer::dom::ids;
use cart_drawer::{
    CartController, CartError, ConfigError, DrawerConfig, HttpCartClient, MemoryDocument,
    MemoryElement, QuantityChange, SyncPolicy,
};
use cart_drawer_core::{AddForm, AddPayload, LineItemKey, VariantId};
use thiserror::Error;

/// Errors that can occur while running a cart command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A cart operation failed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Writing output failed.
    #[error("Output error: {0}")]
    Io(#[from] io::Error),
}

/// Load configuration, applying command-line overrides.
///
/// # Errors
///
/// Returns `ConfigError` if the resulting configuration is missing or invalid.
pub fn load_config(
    base_url: Option<&str>,
    policy: Option<SyncPolicy>,
) -> Result<DrawerConfig, ConfigError> {
    dotenvy::dotenv().ok();

    let mut config = DrawerConfig::from_lookup(|key| match (key, base_url) {
        ("CART_BASE_URL", Some(url)) => Some(url.to_string()),
        _ => std::env::var(key).ok(),
    })?;
    if let Some(policy) = policy {
        config.sync_policy = policy;
    }
    Ok(config)
}

/// Parse a `name=value` line item property.
///
/// # Errors
///
/// Returns a message if there is no `=` or the name is empty.
pub fn parse_property(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected name=value, got '{raw}'")),
    }
}

/// Build the add payload for the `add` command.
#[must_use]
pub fn add_payload(
    variant: u64,
    quantity: u32,
    properties: &[(String, String)],
    selling_plan: Option<String>,
    json: bool,
) -> AddPayload {
    let variant_id = VariantId::new(variant);
    if json {
        return AddPayload::Variant {
            variant_id,
            quantity,
        };
    }

    let mut form = AddForm::new(variant_id).quantity(quantity);
    for (name, value) in properties {
        form = form.property(name, value.as_str());
    }
    if let Some(plan) = selling_plan {
        form = form.selling_plan(&plan);
    }
    AddPayload::Form(form)
}

/// A drawer bound to an in-memory page, talking to a live store.
pub struct Session {
    drawer: CartController<HttpCartClient, MemoryElement, MemoryDocument>,
    page: MemoryDocument,
}

impl Session {
    /// Connect to the store named by `config`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn connect(config: &DrawerConfig) -> Result<Self, CommandError> {
        let client = HttpCartClient::from_config(config)?;
        let page = MemoryDocument::drawer();
        let drawer = CartController::from_config(client, &page, page.clone(), config);

        tracing::debug!(
            base_url = %config.base_url,
            policy = %config.sync_policy,
            "Connected cart drawer"
        );
        Ok(Self { drawer, page })
    }

    /// Fetch and print the cart.
    pub async fn show(&self) -> Result<(), CommandError> {
        self.drawer.try_refresh().await?;
        self.print()
    }

    /// Add to the cart and print the opened drawer.
    pub async fn add(&self, payload: &AddPayload) -> Result<(), CommandError> {
        let item = self.drawer.try_add_item(payload).await?;
        tracing::info!(item_id = item.id(), "Added to cart");
        self.print()
    }

    /// Step a line's quantity by `delta` and print the cart.
    pub async fn step(&self, key: &str, delta: i64) -> Result<(), CommandError> {
        let key = LineItemKey::from(key);
        match self.drawer.try_change_quantity(&key, delta).await? {
            QuantityChange::Missing => {
                tracing::warn!(key = %key, "No line with this key in the cart");
                self.drawer.try_refresh().await?;
            }
            QuantityChange::Updated { quantity } => {
                tracing::info!(key = %key, quantity, "Quantity updated");
            }
            QuantityChange::Removed => tracing::info!(key = %key, "Line removed"),
        }
        self.print()
    }

    /// Remove a line and print the cart.
    pub async fn remove(&self, key: &str) -> Result<(), CommandError> {
        let key = LineItemKey::from(key);
        self.drawer.try_remove_item(&key).await?;
        tracing::info!(key = %key, "Line removed");
        self.print()
    }

    fn text_of(&self, id: &str) -> String {
        self.page.element(id).map(MemoryElement::text).unwrap_or_default()
    }

    fn print(&self) -> Result<(), CommandError> {
        let items = self
            .page
            .element(ids::CART_ITEMS)
            .map(MemoryElement::html)
            .unwrap_or_default();

        let mut out = io::stdout().lock();
        writeln!(
            out,
            "Drawer: {}",
            if self.drawer.is_open() { "open" } else { "closed" }
        )?;
        writeln!(out, "Items:  {}", self.text_of(ids::HEADER_CART_COUNT))?;
        writeln!(out, "Total:  {}", self.text_of(ids::CART_TOTAL))?;
        writeln!(out)?;
        writeln!(out, "{}", items.trim())?;
        Ok(())
    }
}
