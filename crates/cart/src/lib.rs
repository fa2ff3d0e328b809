//! Rocket Cart - stock-validated shopping cart state.
//!
//! A [`CartManager`] owns the shopper's cart. Every add, remove, and
//! quantity change is validated against the inventory service, then written
//! through to persistent storage and published to readers in one step.
//! Failures go to a notification sink as user-visible messages and never
//! leave the cart half-changed.
//!
//! # Modules
//!
//! - [`config`] - Environment-driven configuration
//! - [`inventory`] - Point lookups against the catalog/stock service
//! - [`store`] - Persistent key-value storage for the cart
//! - [`notify`] - Notification sinks for user-visible errors
//! - [`mutation`] - Pure add/remove/update rules
//! - [`manager`] - The cart manager tying it together

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod inventory;
pub mod manager;
pub mod mutation;
pub mod notify;
pub mod store;

#[cfg(test)]
mod test_support;

pub use config::CartConfig;
pub use error::{CartError, CartErrorKind, Operation};
pub use inventory::{Inventory, InventoryClient, InventoryError, MemoryInventory};
pub use manager::CartManager;
pub use mutation::UpdateProductAmount;
pub use notify::{ChannelNotifier, Notification, Notifier, TracingNotifier};
pub use rocket_cart_core::{Cart, CartEntry, Price, ProductId, ProductRecord, StockRecord};
pub use store::{CartStorage, CartStore, FileStore, KeyValueStore, MemoryStore, StoreError};
