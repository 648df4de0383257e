//! Cart Drawer - keeps a slide-in cart drawer in step with a remote cart.
//!
//! The remote cart is the source of truth. Every mutation is followed by a
//! full re-fetch and a re-render; the drawer never computes quantities or
//! totals itself.
//!
//! # Modules
//!
//! - [`client`] - The [`CartApi`] seam and its HTTP implementation
//! - [`controller`] - [`CartController`]: open/close, mutations, refresh
//! - [`dispatch`] - Page events and the row command table
//! - [`dom`] - Element handles and an in-memory page
//! - [`view`] - View models and askama templates
//! - [`config`] - Environment configuration
//! - [`error`] - Error types
//!
//! # Example
//!
//! ```no_run
//! use cart_drawer::{CartController, DrawerConfig, HttpCartClient, MemoryDocument};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DrawerConfig::from_env()?;
//! let client = HttpCartClient::from_config(&config)?;
//! let page = MemoryDocument::drawer();
//! let drawer = CartController::from_config(client, &page, page.clone(), &config);
//!
//! drawer.refresh().await;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod client;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod dom;
pub mod error;
pub mod view;

pub use client::{CartApi, HttpCartClient};
pub use config::{ConfigError, DrawerConfig};
pub use controller::{CartController, QuantityChange, RefreshOutcome, SyncPolicy};
pub use dispatch::{AddTrigger, DrawerEvent, ItemCommand, ItemIntent};
pub use dom::{DrawerElements, Element, ElementSource, MemoryDocument, MemoryElement, Page};
pub use error::{CartError, Result};
