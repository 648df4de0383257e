//! Cart snapshots decoded from the remote cart.
//!
//! A [`CartSnapshot`] is the only view of cart state the client ever holds.
//! It cannot be assembled by hand: the sole way in is [`CartSnapshot::from_json`]
//! (or [`CartSnapshot::from_value`]), which validates the server's reply
//! before anything downstream gets to trust it.

use std::collections::HashSet;

use serde::Deserialize;

use super::id::{LineItemKey, VariantId};
use super::image::thumbnail_url;
use super::money::Money;

/// Variant title the store reports for products without real variants.
pub const DEFAULT_VARIANT_TITLE: &str = "Default Title";

/// Errors that can occur when decoding a remote cart response.
#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    /// The body was not valid JSON or lacked a required field.
    #[error("invalid cart response: {0}")]
    Json(#[from] serde_json::Error),
    /// A line item had an empty key.
    #[error("line item key cannot be empty")]
    EmptyKey,
    /// A line item reported a quantity of zero.
    #[error("line item {key} has zero quantity")]
    ZeroQuantity {
        /// Key of the offending line.
        key: LineItemKey,
    },
    /// Two line items shared the same key.
    #[error("duplicate line item key {key}")]
    DuplicateKey {
        /// The repeated key.
        key: LineItemKey,
    },
    /// `item_count` disagreed with the line quantities.
    #[error("item_count {declared} does not match line quantities {actual}")]
    CountMismatch {
        /// Count reported by the server.
        declared: u64,
        /// Sum of the line quantities.
        actual: u64,
    },
    /// An add reply carried no usable item id.
    #[error("response has no item id")]
    MissingItemId,
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct WireCart {
    #[serde(default)]
    token: Option<String>,
    item_count: u32,
    total_price: u64,
    items: Vec<WireLineItem>,
}

#[derive(Debug, Deserialize)]
struct WireLineItem {
    key: String,
    #[serde(default)]
    id: Option<VariantId>,
    product_title: String,
    #[serde(default)]
    variant_title: Option<String>,
    price: u64,
    quantity: u32,
    #[serde(default)]
    image: Option<String>,
}

// =============================================================================
// Domain Types
// =============================================================================

/// A single line in the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    key: LineItemKey,
    variant_id: Option<VariantId>,
    product_title: String,
    variant_title: Option<String>,
    price: Money,
    quantity: u32,
    image: Option<String>,
}

impl LineItem {
    /// Opaque key identifying this line.
    #[must_use]
    pub const fn key(&self) -> &LineItemKey {
        &self.key
    }

    /// Variant id, when the server reported one.
    #[must_use]
    pub const fn variant_id(&self) -> Option<VariantId> {
        self.variant_id
    }

    #[must_use]
    pub fn product_title(&self) -> &str {
        &self.product_title
    }

    /// Raw variant title as sent by the server.
    #[must_use]
    pub fn variant_title(&self) -> Option<&str> {
        self.variant_title.as_deref()
    }

    /// Variant title to show, if any.
    ///
    /// Returns `None` for the "Default Title" placeholder and for blank titles.
    #[must_use]
    pub fn variant_label(&self) -> Option<&str> {
        self.variant_title
            .as_deref()
            .filter(|title| !title.is_empty() && *title != DEFAULT_VARIANT_TITLE)
    }

    /// Unit price.
    #[must_use]
    pub const fn price(&self) -> Money {
        self.price
    }

    /// Quantity; always at least 1.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// Thumbnail-sized image URL, if the line has an image.
    #[must_use]
    pub fn thumbnail(&self) -> Option<String> {
        self.image.as_deref().map(thumbnail_url)
    }
}

/// A point-in-time read of the remote cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSnapshot {
    token: Option<String>,
    item_count: u32,
    total_price: Money,
    items: Vec<LineItem>,
}

impl CartSnapshot {
    /// Decode and validate a cart from a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the body is not a well-formed cart, if a
    /// line has an empty key or zero quantity, if keys repeat, or if
    /// `item_count` does not equal the sum of line quantities.
    pub fn from_json(body: &str) -> Result<Self, DecodeError> {
        let wire: WireCart = serde_json::from_str(body)?;
        Self::validate(wire)
    }

    /// Decode and validate a cart from an already-parsed JSON value.
    ///
    /// # Errors
    ///
    /// Same as [`CartSnapshot::from_json`].
    pub fn from_value(value: serde_json::Value) -> Result<Self, DecodeError> {
        let wire: WireCart = serde_json::from_value(value)?;
        Self::validate(wire)
    }

    fn validate(wire: WireCart) -> Result<Self, DecodeError> {
        let mut seen = HashSet::with_capacity(wire.items.len());
        let mut items = Vec::with_capacity(wire.items.len());
        let mut actual: u64 = 0;

        for line in wire.items {
            if line.key.is_empty() {
                return Err(DecodeError::EmptyKey);
            }
            let key = LineItemKey::new(line.key);
            if line.quantity == 0 {
                return Err(DecodeError::ZeroQuantity { key });
            }
            if !seen.insert(key.clone()) {
                return Err(DecodeError::DuplicateKey { key });
            }
            actual += u64::from(line.quantity);

            items.push(LineItem {
                key,
                variant_id: line.id,
                product_title: line.product_title,
                variant_title: line.variant_title,
                price: Money::from_cents(line.price),
                quantity: line.quantity,
                image: line.image.filter(|url| !url.is_empty()),
            });
        }

        let declared = u64::from(wire.item_count);
        if declared != actual {
            return Err(DecodeError::CountMismatch { declared, actual });
        }

        Ok(Self {
            token: wire.token.filter(|t| !t.is_empty()),
            item_count: wire.item_count,
            total_price: Money::from_cents(wire.total_price),
            items,
        })
    }

    /// Cart token (session identifier), if the server sent one.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Total unit count across all lines.
    #[must_use]
    pub const fn item_count(&self) -> u32 {
        self.item_count
    }

    #[must_use]
    pub const fn total_price(&self) -> Money {
        self.total_price
    }

    /// Lines in server order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.item_count == 0
    }

    /// Find a line by key.
    #[must_use]
    pub fn item(&self, key: &LineItemKey) -> Option<&LineItem> {
        self.items.iter().find(|item| &item.key == key)
    }
}
