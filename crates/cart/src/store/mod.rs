//! Persistent cart storage.
//!
//! Two layers:
//! - [`KeyValueStore`] - a string key-value medium (memory, a JSON file, ...)
//! - [`CartStore`] - loads and saves a whole [`Cart`]; [`CartStorage`] binds
//!   a key-value medium to one namespaced key and handles the JSON encoding
//!
//! Writes are synchronous from the cart manager's point of view, and a
//! failed write must leave the previously persisted cart intact.

mod file;

pub use file::FileStore;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rocket_cart_core::Cart;
use thiserror::Error;

/// Errors raised by persistent storage.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing medium failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored value is not a valid cart, or the cart could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backing file exists but is not a key-value document.
    #[error("Corrupt store: {0}")]
    Corrupt(String),

    /// A writer panicked while holding the store lock.
    #[error("Store lock poisoned")]
    Poisoned,
}

/// A string key-value medium, in the spirit of browser local storage.
pub trait KeyValueStore: Send + Sync {
    /// Value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium can't be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium can't be written; the previous value
    /// must still be readable afterwards.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete `key`. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium can't be written.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// Loads and saves the whole cart.
pub trait CartStore: Send + Sync {
    /// The last saved cart, `None` if nothing was ever saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium can't be read or holds an invalid cart.
    fn load(&self) -> Result<Option<Cart>, StoreError>;

    /// Replace the saved cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart couldn't be written.
    fn save(&self, cart: &Cart) -> Result<(), StoreError>;
}

/// A [`CartStore`] over a key-value medium and a fixed key.
#[derive(Debug, Clone)]
pub struct CartStorage<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> CartStorage<S> {
    /// Bind `store` to `key`.
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }
}

impl<S: KeyValueStore> CartStore for CartStorage<S> {
    fn load(&self) -> Result<Option<Cart>, StoreError> {
        self.store
            .get(&self.key)?
            .map(|raw| serde_json::from_str(&raw).map_err(StoreError::from))
            .transpose()
    }

    fn save(&self, cart: &Cart) -> Result<(), StoreError> {
        let raw = serde_json::to_string(cart)?;
        self.store.set(&self.key, &raw)
    }
}

/// Key-value store held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::num::NonZeroU32;

    use rocket_cart_core::{CartEntry, Price, ProductId, ProductRecord};

    use super::*;

    fn sample_cart() -> Cart {
        let product = ProductRecord::new(
            ProductId::new(1),
            "Running shoe",
            Price::from_cents(17990),
            "https://cdn.example.com/1.jpg",
        );
        Cart::from_entries(vec![CartEntry::new(product, NonZeroU32::new(2).unwrap())]).unwrap()
    }

    #[test]
    fn test_load_missing_key() {
        let storage = CartStorage::new(MemoryStore::new(), "@RocketShoes:cart");
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let storage = CartStorage::new(MemoryStore::new(), "@RocketShoes:cart");
        let cart = sample_cart();
        storage.save(&cart).unwrap();
        assert_eq!(storage.load().unwrap(), Some(cart));
    }

    #[test]
    fn test_payload_is_entry_array() {
        let store = Arc::new(MemoryStore::new());
        let storage = CartStorage::new(Arc::clone(&store), "cart");
        storage.save(&sample_cart()).unwrap();

        let raw = store.get("cart").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["id"], 1);
        assert_eq!(value[0]["amount"], 2);
    }

    #[test]
    fn test_invalid_payload_is_error() {
        let store = Arc::new(MemoryStore::new());
        store.set("cart", r#"{"not": "a list"}"#).unwrap();
        let storage = CartStorage::new(store, "cart");
        assert!(matches!(storage.load(), Err(StoreError::Serialization(_))));
    }

    #[test]
    fn test_keys_are_independent() {
        let store = Arc::new(MemoryStore::new());
        let a = CartStorage::new(Arc::clone(&store), "a");
        let b = CartStorage::new(Arc::clone(&store), "b");
        a.save(&sample_cart()).unwrap();
        assert!(b.load().unwrap().is_none());

        store.remove("a").unwrap();
        assert!(a.load().unwrap().is_none());
    }
}
