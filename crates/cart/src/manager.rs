//! Cart manager: the one owner of cart state.
//!
//! # Architecture
//!
//! - Reads go through a `watch` channel, so [`CartManager::cart`] and
//!   subscribers never wait on a pending mutation
//! - Mutations pass a single-slot gate: at most one is in flight, later ones
//!   wait their turn instead of racing on a stale snapshot
//! - Each mutation snapshots the cart after taking the gate, performs its
//!   lookups, and computes the next cart purely from the snapshot and the
//!   lookup results (see [`crate::mutation`])
//! - Commits write the persistent store first and publish to memory only if
//!   the write succeeded, so memory and storage never diverge
//! - Every failure is reported to the notification sink exactly once and
//!   leaves the cart untouched
//!
//! # Example
//!
//! ```rust,ignore
//! let manager = CartManager::new(inventory, storage, TracingNotifier)?;
//!
//! manager.add_product(ProductId::new(1)).await;
//! manager.update_product_amount(UpdateProductAmount::new(ProductId::new(1), 3)).await;
//! manager.remove_product(ProductId::new(1)).await;
//!
//! let cart = manager.cart();
//! ```

use std::future::Future;
use std::time::Duration;

use rocket_cart_core::{Cart, ProductId};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, instrument};

use crate::error::{CartError, Operation, Result};
use crate::inventory::{Inventory, InventoryError};
use crate::mutation::{self, UpdateProductAmount};
use crate::notify::Notifier;
use crate::store::{CartStore, StoreError};

/// Default timeout for a single inventory lookup.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Owns the cart and funnels every change through stock validation and
/// write-through persistence.
///
/// Share it between tasks with an `Arc`.
pub struct CartManager<I, S, N> {
    inventory: I,
    store: S,
    notifier: N,
    state: watch::Sender<Cart>,
    gate: Mutex<()>,
    lookup_timeout: Duration,
}

impl<I, S, N> CartManager<I, S, N>
where
    I: Inventory,
    S: CartStore,
    N: Notifier,
{
    /// Create a manager, loading the last persisted cart (or starting empty).
    ///
    /// # Errors
    ///
    /// Returns an error if the store can't be read or holds an invalid cart.
    pub fn new(inventory: I, store: S, notifier: N) -> std::result::Result<Self, StoreError> {
        let cart = store.load()?.unwrap_or_default();
        info!(entries = cart.len(), "Cart loaded");

        let (state, _) = watch::channel(cart);
        Ok(Self {
            inventory,
            store,
            notifier,
            state,
            gate: Mutex::new(()),
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        })
    }

    /// Use a different per-lookup timeout.
    #[must_use]
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Current cart. No side effects.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.state.borrow().clone()
    }

    /// Receive every committed cart.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.state.subscribe()
    }

    /// The persistent store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The inventory source.
    pub const fn inventory(&self) -> &I {
        &self.inventory
    }

    /// Drop cached catalog data and re-fetch records for products in the
    /// cart. Lookup failures here are logged, not reported: nothing the
    /// shopper asked for failed.
    #[instrument(skip(self))]
    pub async fn refresh_inventory(&self) {
        self.inventory.refresh().await;

        for entry in &self.cart() {
            let id = entry.id();
            let fetched = tokio::time::timeout(self.lookup_timeout, self.inventory.get_product(id))
                .await
                .unwrap_or(Err(InventoryError::Timeout(self.lookup_timeout)));
            match fetched {
                Ok(Some(_)) => debug!(product_id = %id, "Product record refreshed"),
                Ok(None) => tracing::warn!(product_id = %id, "Cart product no longer in catalog"),
                Err(e) => tracing::warn!(product_id = %id, error = %e, "Product refresh failed"),
            }
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add one unit of a product. Failures are reported to the notifier.
    pub async fn add_product(&self, id: ProductId) {
        // Already reported.
        let _ = self.try_add_product(id).await;
    }

    /// Remove a product. Failures are reported to the notifier.
    pub async fn remove_product(&self, id: ProductId) {
        let _ = self.try_remove_product(id).await;
    }

    /// Set a product's amount. Failures are reported to the notifier.
    pub async fn update_product_amount(&self, request: UpdateProductAmount) {
        let _ = self.try_update_product_amount(request).await;
    }

    /// Add one unit of a product, also returning the failure.
    ///
    /// # Errors
    ///
    /// - [`CartError::ProductNotFound`] if catalog or stock has no record
    /// - [`CartError::OutOfStock`] if one more unit exceeds stock
    /// - [`CartError::Transport`] / [`CartError::Storage`] on system failures
    ///
    /// The error has already been reported to the notifier.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn try_add_product(&self, id: ProductId) -> Result<()> {
        let result = async {
            let _gate = self.gate.lock().await;
            let snapshot = self.cart();

            let (product, stock) = tokio::try_join!(
                self.lookup(Operation::Add, self.inventory.get_product(id)),
                self.lookup(Operation::Add, self.inventory.get_stock(id)),
            )?;

            let next = mutation::plan_add(&snapshot, id, product, stock)?;
            self.commit(Operation::Add, next)
        }
        .await;

        self.settle(Operation::Add, result)
    }

    /// Remove a product, also returning the failure.
    ///
    /// Only cart membership is checked; no lookups are made.
    ///
    /// # Errors
    ///
    /// - [`CartError::ProductNotInCart`] if the product has no entry
    /// - [`CartError::Storage`] if the store write failed
    ///
    /// The error has already been reported to the notifier.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn try_remove_product(&self, id: ProductId) -> Result<()> {
        let result = async {
            let _gate = self.gate.lock().await;
            let next = mutation::plan_remove(&self.cart(), id)?;
            self.commit(Operation::Remove, next)
        }
        .await;

        self.settle(Operation::Remove, result)
    }

    /// Set a product's amount, also returning the failure.
    ///
    /// # Errors
    ///
    /// - [`CartError::ProductNotInCart`] if the product has no entry
    /// - [`CartError::ProductNotFound`] if stock has no record
    /// - [`CartError::OutOfStock`] if the amount is outside `1..=stock`
    /// - [`CartError::Transport`] / [`CartError::Storage`] on system failures
    ///
    /// The error has already been reported to the notifier.
    #[instrument(skip(self), fields(product_id = %request.product_id, amount = request.amount))]
    pub async fn try_update_product_amount(&self, request: UpdateProductAmount) -> Result<()> {
        let result = async {
            let _gate = self.gate.lock().await;
            let snapshot = self.cart();

            // Membership first: no lookup for products that aren't in the cart.
            mutation::ensure_in_cart(&snapshot, request.product_id, Operation::UpdateAmount)?;

            let stock = self
                .lookup(
                    Operation::UpdateAmount,
                    self.inventory.get_stock(request.product_id),
                )
                .await?;

            let next = mutation::plan_update(&snapshot, request, stock)?;
            self.commit(Operation::UpdateAmount, next)
        }
        .await;

        self.settle(Operation::UpdateAmount, result)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Run an inventory lookup under the lookup timeout.
    async fn lookup<T>(
        &self,
        operation: Operation,
        lookup: impl Future<Output = std::result::Result<T, InventoryError>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.lookup_timeout, lookup).await {
            Ok(result) => result.map_err(|source| CartError::Transport { operation, source }),
            Err(_) => Err(CartError::Transport {
                operation,
                source: InventoryError::Timeout(self.lookup_timeout),
            }),
        }
    }

    /// Persist `next`, then publish it. Nothing is published if the write
    /// fails.
    fn commit(&self, operation: Operation, next: Cart) -> Result<()> {
        self.store
            .save(&next)
            .map_err(|source| CartError::Storage { operation, source })?;
        self.state.send_replace(next);
        Ok(())
    }

    /// Log the outcome and report a failure to the notifier.
    fn settle(&self, operation: Operation, result: Result<()>) -> Result<()> {
        match &result {
            Ok(()) => {
                let cart = self.state.borrow();
                info!(
                    %operation,
                    entries = cart.len(),
                    total_items = cart.total_items(),
                    "Cart updated"
                );
            }
            Err(e) => {
                e.record();
                self.notifier.report_error(e.kind(), e.user_message());
            }
        }
        result
    }
}
