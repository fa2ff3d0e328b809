//! In-memory inventory backed by fixture data.
//!
//! The fixture file uses the same shape a local json-server would serve:
//!
//! ```json
//! {
//!   "products": [{ "id": 1, "title": "Running shoe", "price": 179.9, "image": "..." }],
//!   "stock": [{ "id": 1, "amount": 3 }]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use rocket_cart_core::{ProductId, ProductRecord, StockRecord};
use serde::Deserialize;
use tokio::sync::RwLock;

use super::{Inventory, InventoryError};

/// Fixture file contents.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixtures {
    /// Catalog records.
    #[serde(default)]
    pub products: Vec<ProductRecord>,
    /// Stock records.
    #[serde(default)]
    pub stock: Vec<StockRecord>,
}

/// Inventory served from memory.
///
/// Stock can be changed at runtime with [`MemoryInventory::set_stock`] to
/// simulate other shoppers draining inventory.
#[derive(Debug, Default)]
pub struct MemoryInventory {
    products: RwLock<HashMap<ProductId, ProductRecord>>,
    stock: RwLock<HashMap<ProductId, StockRecord>>,
}

impl MemoryInventory {
    /// An inventory with no products.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from fixture data. Later duplicates win.
    #[must_use]
    pub fn from_fixtures(fixtures: Fixtures) -> Self {
        Self {
            products: RwLock::new(fixtures.products.into_iter().map(|p| (p.id, p)).collect()),
            stock: RwLock::new(fixtures.stock.into_iter().map(|s| (s.id, s)).collect()),
        }
    }

    /// Load fixture data from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be read or isn't valid fixture JSON.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, InventoryError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| InventoryError::Fixtures(format!("{}: {e}", path.display())))?;
        let fixtures: Fixtures = serde_json::from_str(&raw)?;
        Ok(Self::from_fixtures(fixtures))
    }

    /// Insert or replace a catalog record.
    pub async fn insert_product(&self, product: ProductRecord) {
        self.products.write().await.insert(product.id, product);
    }

    /// Set the available amount for a product.
    pub async fn set_stock(&self, id: ProductId, amount: u32) {
        self.stock
            .write()
            .await
            .insert(id, StockRecord::new(id, amount));
    }

    /// Remove the stock record so the product becomes non-purchasable.
    pub async fn remove_stock(&self, id: ProductId) {
        self.stock.write().await.remove(&id);
    }
}

#[async_trait]
impl Inventory for MemoryInventory {
    async fn get_product(&self, id: ProductId) -> Result<Option<ProductRecord>, InventoryError> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn get_stock(&self, id: ProductId) -> Result<Option<StockRecord>, InventoryError> {
        Ok(self.stock.read().await.get(&id).copied())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const FIXTURES: &str = r#"{
        "products": [
            { "id": 1, "title": "Running shoe", "price": 179.9, "image": "https://cdn.example.com/1.jpg" },
            { "id": 2, "title": "Trail shoe", "price": 139.9, "image": "https://cdn.example.com/2.jpg" }
        ],
        "stock": [
            { "id": 1, "amount": 3 }
        ]
    }"#;

    #[tokio::test]
    async fn test_lookups_from_fixtures() {
        let fixtures: Fixtures = serde_json::from_str(FIXTURES).unwrap();
        let inventory = MemoryInventory::from_fixtures(fixtures);

        let product = inventory.get_product(ProductId::new(2)).await.unwrap();
        assert_eq!(product.unwrap().name, "Trail shoe");

        let stock = inventory.get_stock(ProductId::new(1)).await.unwrap();
        assert_eq!(stock, Some(StockRecord::new(ProductId::new(1), 3)));

        // Product 2 is in the catalog but has no stock entry.
        assert!(inventory.get_stock(ProductId::new(2)).await.unwrap().is_none());
        assert!(inventory.get_product(ProductId::new(9)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_and_remove_stock() {
        let inventory = MemoryInventory::new();
        inventory.set_stock(ProductId::new(4), 2).await;
        assert_eq!(
            inventory.get_stock(ProductId::new(4)).await.unwrap().map(|s| s.amount),
            Some(2)
        );
        inventory.remove_stock(ProductId::new(4)).await;
        assert!(inventory.get_stock(ProductId::new(4)).await.unwrap().is_none());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.json");
        std::fs::write(&path, FIXTURES).unwrap();
        assert!(MemoryInventory::from_file(&path).is_ok());
        assert!(matches!(
            MemoryInventory::from_file(dir.path().join("missing.json")),
            Err(InventoryError::Fixtures(_))
        ));
    }
}
