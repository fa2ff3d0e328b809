//! Rocket Cart Core - Shared types library.
//!
//! This crate provides the types used across all Rocket Cart components:
//! - `rocket-cart` - Cart manager, inventory client, and persistent store
//! - `cli` - Command-line front end for inspecting and editing a cart
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Product IDs, prices, catalog/stock records, and the cart aggregate

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
