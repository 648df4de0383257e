//! Cart Drawer Core - Shared types library.
//!
//! This crate provides the types used across all cart drawer components:
//! - `cart-drawer` - Cart controller, HTTP client and drawer rendering
//! - `cart-drawer-cli` - Command-line front end for a live store
//! - `integration-tests` - Mock remote cart and end-to-end tests
//!
//! # Architecture
//!
//! The core crate contains only types and decoding - no I/O, no HTTP
//! clients, no rendering. Snapshots are validated here so nothing
//! downstream has to re-check the server's reply.
//!
//! # Modules
//!
//! - [`types`] - Line item keys, money, cart snapshots, add payloads and
//!   thumbnail URLs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
