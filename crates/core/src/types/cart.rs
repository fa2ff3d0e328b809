//! Cart aggregate and its entries.
//!
//! A [`Cart`] is an ordered list of [`CartEntry`] values. Insertion order is
//! the order products were first added; changing an amount keeps the
//! position, removing and re-adding moves the product to the end.
//!
//! The type enforces the structural invariants itself (one entry per product,
//! every amount at least 1), including when a cart is deserialized from
//! storage. Stock ceilings are not structural and are checked by whoever
//! mutates the cart.

use std::collections::BTreeMap;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;
use super::product::ProductRecord;

/// Errors raised when a list of entries would break cart invariants.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartDataError {
    /// The same product appears twice.
    #[error("duplicate cart entry for product {0}")]
    DuplicateEntry(ProductId),
    /// An entry has an amount of zero.
    #[error("cart entry for product {0} has zero amount")]
    ZeroAmount(ProductId),
}

/// One product line in the cart plus the requested quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartEntry {
    /// Catalog fields captured when the product was added.
    #[serde(flatten)]
    pub product: ProductRecord,
    amount: u32,
}

impl CartEntry {
    /// Create an entry for `product` with the given amount.
    #[must_use]
    pub fn new(mut product: ProductRecord, amount: NonZeroU32) -> Self {
        // A catalog field named `amount` would collide with ours on the wire.
        product.extra.remove("amount");
        Self {
            product,
            amount: amount.get(),
        }
    }

    /// Product identifier.
    #[must_use]
    pub const fn id(&self) -> ProductId {
        self.product.id
    }

    /// Requested quantity. Always at least 1.
    #[must_use]
    pub const fn amount(&self) -> u32 {
        self.amount
    }

    /// Unit price times amount.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price.times(self.amount)
    }
}

/// Ordered list of cart entries.
///
/// Serializes as a plain JSON array of entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CartEntry>", into = "Vec<CartEntry>")]
pub struct Cart {
    entries: Vec<CartEntry>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build a cart from entries, checking uniqueness and amounts.
    ///
    /// # Errors
    ///
    /// Returns [`CartDataError`] if a product appears twice or an entry has
    /// a zero amount.
    pub fn from_entries(entries: Vec<CartEntry>) -> Result<Self, CartDataError> {
        let mut seen = std::collections::HashSet::with_capacity(entries.len());
        for entry in &entries {
            if entry.amount == 0 {
                return Err(CartDataError::ZeroAmount(entry.id()));
            }
            if !seen.insert(entry.id()) {
                return Err(CartDataError::DuplicateEntry(entry.id()));
            }
        }
        Ok(Self { entries })
    }

    /// Entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    /// Look up the entry for a product.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartEntry> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    /// Whether the product has an entry.
    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.get(id).is_some()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cart has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all amounts.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.entries.iter().map(|e| u64::from(e.amount)).sum()
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.entries.iter().map(CartEntry::line_total).sum()
    }

    /// Amount per product.
    #[must_use]
    pub fn amounts(&self) -> BTreeMap<ProductId, u32> {
        self.entries.iter().map(|e| (e.id(), e.amount)).collect()
    }

    /// A copy of this cart with `entry` appended at the end.
    ///
    /// # Errors
    ///
    /// Returns [`CartDataError::DuplicateEntry`] if the product already has
    /// an entry.
    pub fn with_appended(&self, entry: CartEntry) -> Result<Self, CartDataError> {
        if self.contains(entry.id()) {
            return Err(CartDataError::DuplicateEntry(entry.id()));
        }
        let mut entries = self.entries.clone();
        entries.push(entry);
        Ok(Self { entries })
    }

    /// A copy of this cart with the product's amount replaced, keeping its
    /// position. `None` if the product has no entry.
    #[must_use]
    pub fn with_amount(&self, id: ProductId, amount: NonZeroU32) -> Option<Self> {
        let index = self.entries.iter().position(|e| e.id() == id)?;
        let mut entries = self.entries.clone();
        if let Some(entry) = entries.get_mut(index) {
            entry.amount = amount.get();
        }
        Some(Self { entries })
    }

    /// A copy of this cart without the product. `None` if the product has
    /// no entry.
    #[must_use]
    pub fn without(&self, id: ProductId) -> Option<Self> {
        if !self.contains(id) {
            return None;
        }
        let entries = self
            .entries
            .iter()
            .filter(|e| e.id() != id)
            .cloned()
            .collect();
        Some(Self { entries })
    }
}

impl TryFrom<Vec<CartEntry>> for Cart {
    type Error = CartDataError;

    fn try_from(entries: Vec<CartEntry>) -> Result<Self, Self::Error> {
        Self::from_entries(entries)
    }
}

impl From<Cart> for Vec<CartEntry> {
    fn from(cart: Cart) -> Self {
        cart.entries
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartEntry;
    type IntoIter = std::slice::Iter<'a, CartEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: i32) -> ProductRecord {
        ProductRecord::new(
            ProductId::new(id),
            format!("Shoe {id}"),
            Price::from_cents(10_000),
            format!("https://cdn.example.com/{id}.jpg"),
        )
    }

    fn entry(id: i32, amount: u32) -> CartEntry {
        CartEntry::new(product(id), NonZeroU32::new(amount).unwrap())
    }

    #[test]
    fn test_from_entries_rejects_duplicates() {
        let result = Cart::from_entries(vec![entry(1, 1), entry(1, 2)]);
        assert_eq!(result, Err(CartDataError::DuplicateEntry(ProductId::new(1))));
    }

    #[test]
    fn test_deserialize_rejects_zero_amount() {
        let json = r#"[{"id": 1, "name": "Shoe", "price": 10, "imageUrl": "x", "amount": 0}]"#;
        let err = serde_json::from_str::<Cart>(json).unwrap_err();
        assert!(err.to_string().contains("zero amount"));
    }

    #[test]
    fn test_serializes_as_array() {
        let cart = Cart::from_entries(vec![entry(1, 2)]).unwrap();
        let value = serde_json::to_value(&cart).unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["id"], 1);
        assert_eq!(value[0]["amount"], 2);
        assert_eq!(value[0]["name"], "Shoe 1");

        let back: Cart = serde_json::from_value(value).unwrap();
        assert_eq!(back, cart);
    }

    #[test]
    fn test_with_amount_keeps_position() {
        let cart = Cart::from_entries(vec![entry(1, 1), entry(2, 1), entry(3, 1)]).unwrap();
        let updated = cart
            .with_amount(ProductId::new(2), NonZeroU32::new(4).unwrap())
            .unwrap();
        let ids: Vec<i32> = updated.entries().iter().map(|e| e.id().as_i32()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(updated.get(ProductId::new(2)).unwrap().amount(), 4);
        // The original is untouched.
        assert_eq!(cart.get(ProductId::new(2)).unwrap().amount(), 1);
    }

    #[test]
    fn test_without_then_append_moves_to_end() {
        let cart = Cart::from_entries(vec![entry(1, 1), entry(2, 1)]).unwrap();
        let cart = cart.without(ProductId::new(1)).unwrap();
        let cart = cart.with_appended(entry(1, 1)).unwrap();
        let ids: Vec<i32> = cart.entries().iter().map(|e| e.id().as_i32()).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_missing_product_yields_none() {
        let cart = Cart::new();
        assert!(cart.without(ProductId::new(9)).is_none());
        assert!(
            cart.with_amount(ProductId::new(9), NonZeroU32::MIN)
                .is_none()
        );
    }

    #[test]
    fn test_totals() {
        let cart = Cart::from_entries(vec![entry(1, 2), entry(2, 3)]).unwrap();
        assert_eq!(cart.total_items(), 5);
        assert_eq!(cart.subtotal(), Price::from_cents(50_000));
        assert_eq!(cart.amounts().get(&ProductId::new(2)), Some(&3));
    }

    #[test]
    fn test_new_entry_drops_catalog_amount_field() {
        let mut record = product(5);
        record.extra.insert("amount".to_string(), 99.into());
        let entry = CartEntry::new(record, NonZeroU32::MIN);
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["amount"], 1);
    }
}
