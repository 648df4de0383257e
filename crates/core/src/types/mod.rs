//! Core types for the cart drawer.
//!
//! This module provides type-safe wrappers for the remote cart's data.

pub mod id;
pub mod image;
pub mod money;
pub mod payload;
pub mod snapshot;

pub use id::{LineItemKey, VariantId};
pub use image::{THUMBNAIL_SIZE, sized_image_url, thumbnail_url};
pub use money::{Money, format_money};
pub use payload::{AddForm, AddPayload, AddedItem, LineChange, VariantLine};
pub use snapshot::{CartSnapshot, DEFAULT_VARIANT_TITLE, DecodeError, LineItem};
