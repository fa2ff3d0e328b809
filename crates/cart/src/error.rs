//! Cart error taxonomy with Sentry integration.
//!
//! Every failed cart operation becomes one [`CartError`]. The manager turns
//! it into a single user-visible message for the notification sink (see
//! [`CartError::user_message`]) and never exposes transport or storage
//! details there. Server-class failures are captured to Sentry before being
//! reported.

use core::fmt;

use rocket_cart_core::{CartDataError, ProductId};
use thiserror::Error;

use crate::inventory::InventoryError;
use crate::store::StoreError;

/// User-visible messages sent to the notification sink.
pub mod messages {
    /// Adding a product failed for any reason other than stock.
    pub const ADD_FAILED: &str = "error adding product";
    /// The requested amount is more than the stock allows.
    pub const OUT_OF_STOCK: &str = "requested quantity not in stock";
    /// Removing a product failed.
    pub const REMOVE_FAILED: &str = "error removing product";
    /// Changing a product's amount failed for any reason other than stock.
    pub const UPDATE_FAILED: &str = "error changing product quantity";
}

/// The cart operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `add_product`
    Add,
    /// `remove_product`
    Remove,
    /// `update_product_amount`
    UpdateAmount,
}

impl Operation {
    /// Generic failure message for this operation.
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::Add => messages::ADD_FAILED,
            Self::Remove => messages::REMOVE_FAILED,
            Self::UpdateAmount => messages::UPDATE_FAILED,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::UpdateAmount => "update amount",
        })
    }
}

/// Structured error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartErrorKind {
    /// Catalog or stock lookup returned nothing for the id.
    ProductNotFound,
    /// Requested amount exceeds stock, or stock is zero.
    OutOfStock,
    /// Operation referenced a product that isn't in the cart.
    ProductNotInCart,
    /// Inventory lookup failed (network, status, parse, timeout).
    TransportFailure,
    /// Persistent store read or write failed.
    StorageFailure,
    /// A cart invariant would have been broken.
    Internal,
}

/// A failed cart operation.
#[derive(Debug, Error)]
pub enum CartError {
    /// Catalog or stock has no record for the product.
    #[error("{operation}: product {id} not found in catalog or stock")]
    ProductNotFound { operation: Operation, id: ProductId },

    /// Requested amount is outside `1..=available`.
    #[error("requested {requested} of product {id}, {available} in stock")]
    OutOfStock {
        id: ProductId,
        requested: i64,
        available: u32,
    },

    /// Product has no cart entry.
    #[error("{operation}: product {id} is not in the cart")]
    ProductNotInCart { operation: Operation, id: ProductId },

    /// Inventory lookup failed.
    #[error("{operation}: inventory lookup failed: {source}")]
    Transport {
        operation: Operation,
        #[source]
        source: InventoryError,
    },

    /// Persistent store failed.
    #[error("{operation}: cart storage failed: {source}")]
    Storage {
        operation: Operation,
        #[source]
        source: StoreError,
    },

    /// Building the next cart broke an invariant.
    #[error("{operation}: {source}")]
    Invariant {
        operation: Operation,
        #[source]
        source: CartDataError,
    },
}

impl CartError {
    /// Structured kind of this error.
    #[must_use]
    pub const fn kind(&self) -> CartErrorKind {
        match self {
            Self::ProductNotFound { .. } => CartErrorKind::ProductNotFound,
            Self::OutOfStock { .. } => CartErrorKind::OutOfStock,
            Self::ProductNotInCart { .. } => CartErrorKind::ProductNotInCart,
            Self::Transport { .. } => CartErrorKind::TransportFailure,
            Self::Storage { .. } => CartErrorKind::StorageFailure,
            Self::Invariant { .. } => CartErrorKind::Internal,
        }
    }

    /// Message safe to show the shopper.
    ///
    /// Stock failures get their own message; everything else collapses into
    /// the failing operation's generic message.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::OutOfStock { .. } => messages::OUT_OF_STOCK,
            Self::ProductNotFound { operation, .. }
            | Self::ProductNotInCart { operation, .. }
            | Self::Transport { operation, .. }
            | Self::Storage { operation, .. }
            | Self::Invariant { operation, .. } => operation.failure_message(),
        }
    }

    /// Whether this is a system failure rather than a rejected request.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Storage { .. } | Self::Invariant { .. }
        )
    }

    /// Log the error, capturing system failures to Sentry.
    pub fn record(&self) {
        if self.is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                kind = ?self.kind(),
                sentry_event_id = %event_id,
                "Cart operation failed"
            );
        } else {
            tracing::warn!(error = %self, kind = ?self.kind(), "Cart operation rejected");
        }
    }
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;
