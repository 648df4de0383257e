//! UI events and the row command table.
//!
//! Page events are described as [`DrawerEvent`] values and handed to
//! [`CartController::dispatch`](crate::CartController::dispatch). Clicks inside
//! the item list are decoded through [`ROW_COMMANDS`], a table from control
//! class to [`ItemIntent`], so the markup and the behaviour only meet there.

use cart_drawer_core::{AddForm, AddPayload, LineItemKey, VariantId};

/// Key that closes the drawer from anywhere on the page.
pub const ESCAPE_KEY: &str = "Escape";

/// What a row control asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemIntent {
    Increase,
    Decrease,
    Remove,
}

impl ItemIntent {
    /// Quantity change for stepper intents; `None` for removal.
    #[must_use]
    pub const fn delta(self) -> Option<i64> {
        match self {
            Self::Increase => Some(1),
            Self::Decrease => Some(-1),
            Self::Remove => None,
        }
    }
}

/// Row control classes and the intent each one triggers.
pub const ROW_COMMANDS: [(&str, ItemIntent); 3] = [
    ("qty-increase", ItemIntent::Increase),
    ("qty-decrease", ItemIntent::Decrease),
    ("cart-item-remove", ItemIntent::Remove),
];

/// A decoded row command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemCommand {
    pub intent: ItemIntent,
    pub key: LineItemKey,
}

impl ItemCommand {
    /// Decode a click on the item list.
    ///
    /// The first class found in [`ROW_COMMANDS`] wins. Clicks on anything
    /// that is not a row control, or that carry no line key, decode to `None`.
    #[must_use]
    pub fn from_click<S: AsRef<str>>(classes: &[S], key: Option<&str>) -> Option<Self> {
        let intent = ROW_COMMANDS.iter().find_map(|(class, intent)| {
            classes
                .iter()
                .any(|c| c.as_ref() == *class)
                .then_some(*intent)
        })?;
        let key = key.filter(|k| !k.is_empty())?;

        Some(Self {
            intent,
            key: LineItemKey::from(key),
        })
    }
}

/// What an add-to-cart control submits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddTrigger {
    /// The control sits inside a product form.
    Form(AddForm),
    /// A standalone control carrying `data-product-id`.
    ProductId(String),
    /// Neither a form nor a product id.
    Detached,
}

impl AddTrigger {
    /// Payload to submit, if the trigger carries one.
    ///
    /// A product id that is not a valid variant id yields `None`.
    #[must_use]
    pub fn payload(&self) -> Option<AddPayload> {
        match self {
            Self::Form(form) => Some(AddPayload::Form(form.clone())),
            Self::ProductId(id) => id.parse::<VariantId>().ok().map(AddPayload::variant),
            Self::Detached => None,
        }
    }
}

/// A page event the drawer reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawerEvent {
    /// Header cart button clicked.
    ToggleClicked,
    /// Drawer close button clicked.
    CloseClicked,
    /// Backdrop clicked.
    OverlayClicked,
    /// A key pressed anywhere on the page.
    KeyDown(String),
    /// Click inside the item list.
    ItemsClicked {
        /// Classes of the clicked element.
        classes: Vec<String>,
        /// Its `data-key` attribute.
        key: Option<String>,
    },
    /// An add-to-cart control clicked.
    AddToCart(AddTrigger),
    /// The sticky mobile add-to-cart bar clicked; carries the page's product form.
    MobileAddToCart(Option<AddForm>),
}
