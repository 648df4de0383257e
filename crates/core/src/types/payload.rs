//! Add-to-cart payloads and the add endpoint's reply.

use serde::Serialize;
use serde_json::Value;

use super::id::{LineItemKey, VariantId};
use super::snapshot::DecodeError;

/// Form field carrying the variant id.
pub const FIELD_ID: &str = "id";
/// Form field carrying the quantity.
pub const FIELD_QUANTITY: &str = "quantity";
/// Form field carrying the subscription selling plan.
pub const FIELD_SELLING_PLAN: &str = "selling_plan";

/// Body of an add-to-cart request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddPayload {
    /// A product form submitted as `application/x-www-form-urlencoded`.
    Form(AddForm),
    /// A single variant submitted as JSON `{"id": .., "quantity": ..}`.
    Variant {
        /// Variant to add.
        variant_id: VariantId,
        /// Units to add.
        quantity: u32,
    },
}

impl AddPayload {
    /// Add one unit of a variant.
    #[must_use]
    pub const fn variant(variant_id: VariantId) -> Self {
        Self::Variant {
            variant_id,
            quantity: 1,
        }
    }
}

impl From<AddForm> for AddPayload {
    fn from(form: AddForm) -> Self {
        Self::Form(form)
    }
}

/// JSON body `{"id": <variant>, "quantity": <n>}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VariantLine {
    pub id: VariantId,
    pub quantity: u32,
}

/// JSON body for the change endpoint: `{"id": <line key>, "quantity": <n>}`.
///
/// A quantity of zero removes the line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineChange {
    pub id: LineItemKey,
    pub quantity: u32,
}

/// Fields of a product form, in submission order.
///
/// Mirrors what a browser would send for the product form: the variant id,
/// a quantity, any `properties[...]` line item properties and an optional
/// selling plan from the subscription toggle. Unknown fields pass through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddForm {
    fields: Vec<(String, String)>,
}

impl AddForm {
    /// Start a form for one unit of `variant_id`.
    #[must_use]
    pub fn new(variant_id: VariantId) -> Self {
        Self {
            fields: vec![
                (FIELD_ID.to_string(), variant_id.to_string()),
                (FIELD_QUANTITY.to_string(), "1".to_string()),
            ],
        }
    }

    /// Build a form from raw field pairs, as collected from markup.
    #[must_use]
    pub fn from_fields<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Set the quantity, replacing any existing value.
    #[must_use]
    pub fn quantity(self, quantity: u32) -> Self {
        self.set(FIELD_QUANTITY, quantity.to_string())
    }

    /// Attach a line item property (`properties[name]`).
    #[must_use]
    pub fn property(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields
            .push((format!("properties[{name}]"), value.into()));
        self
    }

    /// Subscribe via a selling plan, replacing any existing plan.
    ///
    /// An empty plan id means one-time purchase and removes the field.
    #[must_use]
    pub fn selling_plan(mut self, plan_id: &str) -> Self {
        if plan_id.is_empty() {
            self.fields.retain(|(k, _)| k != FIELD_SELLING_PLAN);
            self
        } else {
            self.set(FIELD_SELLING_PLAN, plan_id.to_string())
        }
    }

    fn set(mut self, name: &str, value: String) -> Self {
        match self.fields.iter_mut().find(|(k, _)| k == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name.to_string(), value)),
        }
        self
    }

    /// First value of a field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// All fields in submission order.
    #[must_use]
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

/// The add endpoint's reply, accepted only when it names the added item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedItem {
    id: String,
    key: Option<LineItemKey>,
}

impl AddedItem {
    /// Decode an add reply from a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Json`] for invalid JSON and
    /// [`DecodeError::MissingItemId`] when `id` is absent, null, zero or empty.
    pub fn from_json(body: &str) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_str(body)?;
        Self::from_value(&value)
    }

    /// Decode an add reply from a parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::MissingItemId`] when `id` is absent, null,
    /// zero or empty.
    pub fn from_value(value: &Value) -> Result<Self, DecodeError> {
        let id = match value.get("id") {
            Some(Value::Number(n)) if n.as_f64().is_some_and(|f| f != 0.0) => n.to_string(),
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            _ => return Err(DecodeError::MissingItemId),
        };

        let key = value
            .get("key")
            .and_then(Value::as_str)
            .filter(|k| !k.is_empty())
            .map(LineItemKey::from);

        Ok(Self { id, key })
    }

    /// Item id reported by the store.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Line key of the added item, when reported.
    #[must_use]
    pub const fn key(&self) -> Option<&LineItemKey> {
        self.key.as_ref()
    }
}
