//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart
//! cart-cli show
//!
//! # Add one unit of product 1 (validated against the inventory service)
//! cart-cli add 1
//!
//! # Set product 1 to 3 units
//! cart-cli update 1 3
//!
//! # Remove product 1
//! cart-cli remove 1
//!
//! # Work offline against a fixture file instead of the service
//! cart-cli --fixtures server.json add 2
//! ```
//!
//! # Environment Variables
//!
//! See [`rocket_cart::config`] for the full list; the ones that matter most:
//! - `CART_API_URL` - Inventory service base URL
//! - `CART_STORE_PATH` - File the cart is persisted to

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use rocket_cart::{
    Cart, CartConfig, CartErrorKind, CartManager, CartStorage, FileStore, Inventory,
    InventoryClient, InventoryError, MemoryInventory, Notifier, StoreError, UpdateProductAmount,
};
use rocket_cart_core::ProductId;
use thiserror::Error;

/// Inventory chosen at runtime: the REST service or a fixture file.
pub type SharedInventory = Arc<dyn Inventory>;

/// Manager as wired by the CLI.
pub type Manager = CartManager<SharedInventory, CartStorage<FileStore>, StderrNotifier>;

/// Errors that can occur while running a cart command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Inventory client or fixtures could not be set up.
    #[error("Inventory setup failed: {0}")]
    Inventory(#[from] InventoryError),

    /// Stored cart could not be loaded.
    #[error("Cart storage error: {0}")]
    Store(#[from] StoreError),

    /// The cart rejected the operation (already reported to the user).
    #[error("Cart operation rejected: {0:?}")]
    Rejected(CartErrorKind),
}

/// Prints user-visible cart errors to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn report_error(&self, kind: CartErrorKind, message: &str) {
        tracing::debug!(kind = ?kind, "Reporting cart error");
        #[allow(clippy::print_stderr)]
        {
            eprintln!("error: {message}");
        }
    }
}

/// Open the cart described by `config`.
///
/// Uses the fixture file as inventory when given, the REST service otherwise.
///
/// # Errors
///
/// Returns an error if the inventory can't be set up or the stored cart
/// can't be loaded.
pub fn open(config: &CartConfig, fixtures: Option<&Path>) -> Result<Manager, CommandError> {
    let inventory: SharedInventory = match fixtures {
        Some(path) => {
            tracing::info!(path = %path.display(), "Using fixture inventory");
            Arc::new(MemoryInventory::from_file(path)?)
        }
        None => Arc::new(InventoryClient::new(&config.inventory)?),
    };

    let storage = CartStorage::new(FileStore::new(&config.store.path), config.store.key.clone());
    let manager = CartManager::new(inventory, storage, StderrNotifier)?
        .with_lookup_timeout(config.inventory.lookup_timeout);
    Ok(manager)
}

/// Add one unit of a product.
///
/// # Errors
///
/// Returns [`CommandError::Rejected`] if the cart rejected the change.
pub async fn add(manager: &Manager, id: ProductId) -> Result<(), CommandError> {
    manager
        .try_add_product(id)
        .await
        .map_err(|e| CommandError::Rejected(e.kind()))
}

/// Remove a product.
///
/// # Errors
///
/// Returns [`CommandError::Rejected`] if the cart rejected the change.
pub async fn remove(manager: &Manager, id: ProductId) -> Result<(), CommandError> {
    manager
        .try_remove_product(id)
        .await
        .map_err(|e| CommandError::Rejected(e.kind()))
}

/// Set a product's amount.
///
/// # Errors
///
/// Returns [`CommandError::Rejected`] if the cart rejected the change.
pub async fn update(manager: &Manager, id: ProductId, amount: i64) -> Result<(), CommandError> {
    manager
        .try_update_product_amount(UpdateProductAmount::new(id, amount))
        .await
        .map_err(|e| CommandError::Rejected(e.kind()))
}

/// Render the cart as a plain-text table.
#[must_use]
pub fn render(cart: &Cart) -> String {
    if cart.is_empty() {
        return "Cart is empty\n".to_string();
    }

    let name_width = cart
        .entries()
        .iter()
        .map(|e| e.product.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("PRODUCT".len());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<6} {:<name_width$} {:>6} {:>10} {:>10}",
        "ID", "PRODUCT", "AMOUNT", "PRICE", "TOTAL"
    );
    for entry in cart {
        let _ = writeln!(
            out,
            "{:<6} {:<name_width$} {:>6} {:>10} {:>10}",
            entry.id().to_string(),
            entry.product.name,
            entry.amount(),
            entry.product.price.format_usd(),
            entry.line_total().format_usd()
        );
    }
    let _ = writeln!(
        out,
        "{} item(s), subtotal {}",
        cart.total_items(),
        cart.subtotal().format_usd()
    );
    out
}
