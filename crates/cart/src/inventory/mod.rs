//! Inventory and catalog lookups.
//!
//! # Architecture
//!
//! - The inventory service is source of truth for stock, the cart never
//!   assumes availability
//! - Every lookup is a point lookup by product id, never a full-list fetch
//!   filtered locally
//! - Product records may be cached (`moka`, configurable TTL); stock records
//!   are always fetched fresh
//!
//! # Example
//!
//! ```rust,ignore
//! use rocket_cart::inventory::{Inventory, InventoryClient};
//!
//! let client = InventoryClient::new(&config.inventory)?;
//!
//! let product = client.get_product(ProductId::new(1)).await?;
//! let stock = client.get_stock(ProductId::new(1)).await?;
//! ```

mod client;
mod memory;

pub use client::InventoryClient;
pub use memory::{Fixtures, MemoryInventory};

use async_trait::async_trait;
use rocket_cart_core::{ProductId, ProductRecord, StockRecord};
use thiserror::Error;

/// Errors that can occur when talking to the inventory service.
///
/// A product that doesn't exist is not an error: lookups return `Ok(None)`.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Service answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body could not be decoded.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Rate limited by the service.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Lookup did not finish within the configured timeout.
    #[error("Lookup timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Fixture data could not be loaded.
    #[error("Fixture error: {0}")]
    Fixtures(String),
}

/// Point lookups against the inventory/catalog service.
#[async_trait]
pub trait Inventory: Send + Sync {
    /// Catalog record for a product, `None` if the catalog has no such id.
    async fn get_product(&self, id: ProductId) -> Result<Option<ProductRecord>, InventoryError>;

    /// Stock record for a product, `None` if the product has no stock entry.
    async fn get_stock(&self, id: ProductId) -> Result<Option<StockRecord>, InventoryError>;

    /// Drop any cached catalog data so the next lookups hit the source.
    async fn refresh(&self) {}
}

#[async_trait]
impl<T: Inventory + ?Sized> Inventory for std::sync::Arc<T> {
    async fn get_product(&self, id: ProductId) -> Result<Option<ProductRecord>, InventoryError> {
        (**self).get_product(id).await
    }

    async fn get_stock(&self, id: ProductId) -> Result<Option<StockRecord>, InventoryError> {
        (**self).get_stock(id).await
    }

    async fn refresh(&self) {
        (**self).refresh().await;
    }
}
