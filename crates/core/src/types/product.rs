//! Catalog and stock records served by the inventory service.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id::ProductId;
use super::price::Price;

/// Catalog metadata for a single product.
///
/// Independent of stock and of any cart. The inventory service may send
/// extra display fields (badges, sizes, ...); they are kept verbatim in
/// `extra` so a cart line can render everything the catalog knew about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    /// Product identifier.
    pub id: ProductId,
    /// Display name.
    #[serde(alias = "title")]
    pub name: String,
    /// Unit price.
    pub price: Price,
    /// Product image URL.
    #[serde(alias = "image")]
    pub image_url: String,
    /// Other display fields, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProductRecord {
    /// Create a product record with no extra display fields.
    #[must_use]
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        price: Price,
        image_url: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            image_url: image_url.into(),
            extra: Map::new(),
        }
    }
}

/// Available quantity for a product at query time.
///
/// The inventory service owns this; the cart only reads it to validate a
/// mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockRecord {
    /// Product identifier.
    pub id: ProductId,
    /// Units available.
    pub amount: u32,
}

impl StockRecord {
    /// Create a stock record.
    #[must_use]
    pub const fn new(id: ProductId, amount: u32) -> Self {
        Self { id, amount }
    }

    /// Whether `requested` units can be served from this record.
    #[must_use]
    pub const fn covers(&self, requested: u32) -> bool {
        requested <= self.amount
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_accepts_catalog_field_names() {
        let json = r#"{
            "id": 1,
            "title": "Running shoe",
            "price": 179.9,
            "image": "https://cdn.example.com/1.jpg"
        }"#;
        let product: ProductRecord = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, ProductId::new(1));
        assert_eq!(product.name, "Running shoe");
        assert_eq!(product.price, Price::from_cents(17990));
        assert_eq!(product.image_url, "https://cdn.example.com/1.jpg");
        assert!(product.extra.is_empty());
    }

    #[test]
    fn test_product_keeps_extra_fields() {
        let json = r#"{
            "id": 2,
            "name": "Trail shoe",
            "price": 99,
            "imageUrl": "https://cdn.example.com/2.jpg",
            "brand": "Rocket",
            "sizes": [40, 41]
        }"#;
        let product: ProductRecord = serde_json::from_str(json).unwrap();
        assert_eq!(product.extra.get("brand"), Some(&Value::from("Rocket")));

        let out = serde_json::to_value(&product).unwrap();
        assert_eq!(out["imageUrl"], "https://cdn.example.com/2.jpg");
        assert_eq!(out["sizes"], serde_json::json!([40, 41]));
    }

    #[test]
    fn test_stock_covers() {
        let stock = StockRecord::new(ProductId::new(1), 3);
        assert!(stock.covers(3));
        assert!(!stock.covers(4));
        assert!(StockRecord::new(ProductId::new(1), 0).covers(0));
    }

    #[test]
    fn test_stock_rejects_negative_amount() {
        let result = serde_json::from_str::<StockRecord>(r#"{"id": 1, "amount": -1}"#);
        assert!(result.is_err());
    }
}
