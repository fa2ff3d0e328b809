//! Cart mutation rules.
//!
//! Pure functions from a cart snapshot plus lookup results to the next cart.
//! They never touch the network, the store, or shared state, so each
//! mutation is decided entirely from the snapshot taken when it started.

use std::num::NonZeroU32;

use rocket_cart_core::{Cart, CartEntry, ProductId, ProductRecord, StockRecord};

use crate::error::{CartError, Operation, Result};

/// Request to set a product's amount.
///
/// `amount` is caller-supplied and may be zero, negative, or above stock;
/// such requests are rejected rather than clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateProductAmount {
    /// Product whose entry is updated.
    pub product_id: ProductId,
    /// New absolute amount.
    pub amount: i64,
}

impl UpdateProductAmount {
    /// Create an update request.
    #[must_use]
    pub const fn new(product_id: ProductId, amount: i64) -> Self {
        Self { product_id, amount }
    }
}

/// Fail with `ProductNotInCart` unless the product has an entry.
///
/// # Errors
///
/// Returns [`CartError::ProductNotInCart`] if `id` has no entry.
pub fn ensure_in_cart(cart: &Cart, id: ProductId, operation: Operation) -> Result<()> {
    if cart.contains(id) {
        Ok(())
    } else {
        Err(CartError::ProductNotInCart { operation, id })
    }
}

/// Next cart after adding one unit of `id`.
///
/// A product without a catalog record or without a stock record is not
/// purchasable. An existing entry is incremented by exactly one; a new
/// product is appended with amount 1.
///
/// # Errors
///
/// - [`CartError::ProductNotFound`] if either lookup came back empty
/// - [`CartError::OutOfStock`] if one more unit exceeds stock
pub fn plan_add(
    cart: &Cart,
    id: ProductId,
    product: Option<ProductRecord>,
    stock: Option<StockRecord>,
) -> Result<Cart> {
    let (Some(product), Some(stock)) = (product, stock) else {
        return Err(CartError::ProductNotFound {
            operation: Operation::Add,
            id,
        });
    };

    match cart.get(id) {
        Some(existing) => {
            let requested = existing.amount().checked_add(1);
            let amount = requested
                .filter(|&n| stock.covers(n))
                .and_then(NonZeroU32::new)
                .ok_or(CartError::OutOfStock {
                    id,
                    requested: i64::from(existing.amount()) + 1,
                    available: stock.amount,
                })?;
            cart.with_amount(id, amount)
                .ok_or(CartError::ProductNotInCart {
                    operation: Operation::Add,
                    id,
                })
        }
        None => {
            if !stock.covers(1) {
                return Err(CartError::OutOfStock {
                    id,
                    requested: 1,
                    available: stock.amount,
                });
            }
            cart.with_appended(CartEntry::new(product, NonZeroU32::MIN))
                .map_err(|source| CartError::Invariant {
                    operation: Operation::Add,
                    source,
                })
        }
    }
}

/// Next cart after removing `id`.
///
/// Only cart membership matters; whether the product is still sold is
/// irrelevant.
///
/// # Errors
///
/// Returns [`CartError::ProductNotInCart`] if `id` has no entry.
pub fn plan_remove(cart: &Cart, id: ProductId) -> Result<Cart> {
    cart.without(id).ok_or(CartError::ProductNotInCart {
        operation: Operation::Remove,
        id,
    })
}

/// Next cart after setting the amount of `request.product_id`.
///
/// The amount is absolute, not a delta, and must be within
/// `1..=stock.amount`. Setting zero is not a removal.
///
/// # Errors
///
/// - [`CartError::ProductNotInCart`] if the product has no entry
/// - [`CartError::ProductNotFound`] if the stock lookup came back empty
/// - [`CartError::OutOfStock`] if the amount is outside `1..=stock`
pub fn plan_update(
    cart: &Cart,
    request: UpdateProductAmount,
    stock: Option<StockRecord>,
) -> Result<Cart> {
    let UpdateProductAmount { product_id: id, amount } = request;
    ensure_in_cart(cart, id, Operation::UpdateAmount)?;

    let stock = stock.ok_or(CartError::ProductNotFound {
        operation: Operation::UpdateAmount,
        id,
    })?;

    let amount_ok = u32::try_from(amount)
        .ok()
        .filter(|&n| stock.covers(n))
        .and_then(NonZeroU32::new);
    let Some(amount_ok) = amount_ok else {
        return Err(CartError::OutOfStock {
            id,
            requested: amount,
            available: stock.amount,
        });
    };

    cart.with_amount(id, amount_ok)
        .ok_or(CartError::ProductNotInCart {
            operation: Operation::UpdateAmount,
            id,
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rocket_cart_core::Price;

    use super::*;
    use crate::error::CartErrorKind;

    fn product(id: i32) -> ProductRecord {
        ProductRecord::new(
            ProductId::new(id),
            format!("Shoe {id}"),
            Price::from_cents(17990),
            format!("https://cdn.example.com/{id}.jpg"),
        )
    }

    fn stock(id: i32, amount: u32) -> StockRecord {
        StockRecord::new(ProductId::new(id), amount)
    }

    fn cart_with(items: &[(i32, u32)]) -> Cart {
        Cart::from_entries(
            items
                .iter()
                .map(|&(id, amount)| CartEntry::new(product(id), NonZeroU32::new(amount).unwrap()))
                .collect(),
        )
        .unwrap()
    }

    fn amount_of(cart: &Cart, id: i32) -> Option<u32> {
        cart.get(ProductId::new(id)).map(CartEntry::amount)
    }

    #[test]
    fn test_add_new_product() {
        let cart = Cart::new();
        let next = plan_add(&cart, ProductId::new(1), Some(product(1)), Some(stock(1, 5))).unwrap();
        assert_eq!(next.len(), 1);
        assert_eq!(amount_of(&next, 1), Some(1));
        assert_eq!(next.entries()[0].product.name, "Shoe 1");
    }

    #[test]
    fn test_add_appends_at_end() {
        let cart = cart_with(&[(2, 1)]);
        let next = plan_add(&cart, ProductId::new(1), Some(product(1)), Some(stock(1, 5))).unwrap();
        let ids: Vec<i32> = next.entries().iter().map(|e| e.id().as_i32()).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_add_increments_existing() {
        let cart = cart_with(&[(1, 2), (2, 1)]);
        let next = plan_add(&cart, ProductId::new(1), Some(product(1)), Some(stock(1, 5))).unwrap();
        assert_eq!(amount_of(&next, 1), Some(3));
        assert_eq!(next.len(), 2);
    }

    #[test]
    fn test_add_at_stock_ceiling_is_out_of_stock() {
        let cart = cart_with(&[(1, 5)]);
        let err = plan_add(&cart, ProductId::new(1), Some(product(1)), Some(stock(1, 5))).unwrap_err();
        assert_eq!(err.kind(), CartErrorKind::OutOfStock);
        assert!(matches!(
            err,
            CartError::OutOfStock {
                requested: 6,
                available: 5,
                ..
            }
        ));
    }

    #[test]
    fn test_add_zero_stock_is_out_of_stock() {
        let err = plan_add(&Cart::new(), ProductId::new(1), Some(product(1)), Some(stock(1, 0)))
            .unwrap_err();
        assert_eq!(err.kind(), CartErrorKind::OutOfStock);
    }

    #[test]
    fn test_add_missing_stock_record_is_not_found() {
        let err = plan_add(&Cart::new(), ProductId::new(1), Some(product(1)), None).unwrap_err();
        assert_eq!(err.kind(), CartErrorKind::ProductNotFound);
        assert_eq!(err.user_message(), "error adding product");
    }

    #[test]
    fn test_add_missing_product_record_is_not_found() {
        let cart = cart_with(&[(1, 1)]);
        let err = plan_add(&cart, ProductId::new(1), None, Some(stock(1, 5))).unwrap_err();
        assert_eq!(err.kind(), CartErrorKind::ProductNotFound);
    }

    #[test]
    fn test_remove_existing() {
        let cart = cart_with(&[(1, 1), (2, 1), (3, 1)]);
        let next = plan_remove(&cart, ProductId::new(2)).unwrap();
        let ids: Vec<i32> = next.entries().iter().map(|e| e.id().as_i32()).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_remove_missing_is_not_in_cart() {
        let err = plan_remove(&Cart::new(), ProductId::new(99)).unwrap_err();
        assert_eq!(err.kind(), CartErrorKind::ProductNotInCart);
        assert_eq!(err.user_message(), "error removing product");
    }

    #[test]
    fn test_update_sets_absolute_amount() {
        let cart = cart_with(&[(1, 2), (2, 1)]);
        let request = UpdateProductAmount::new(ProductId::new(1), 4);
        let next = plan_update(&cart, request, Some(stock(1, 5))).unwrap();
        assert_eq!(amount_of(&next, 1), Some(4));
        assert_eq!(next.entries()[0].id(), ProductId::new(1));
    }

    #[test]
    fn test_update_can_decrease() {
        let cart = cart_with(&[(1, 4)]);
        let request = UpdateProductAmount::new(ProductId::new(1), 1);
        let next = plan_update(&cart, request, Some(stock(1, 5))).unwrap();
        assert_eq!(amount_of(&next, 1), Some(1));
    }

    #[test]
    fn test_update_rejects_zero_and_negative() {
        let cart = cart_with(&[(1, 2)]);
        for amount in [0, -1, i64::MIN] {
            let request = UpdateProductAmount::new(ProductId::new(1), amount);
            let err = plan_update(&cart, request, Some(stock(1, 5))).unwrap_err();
            assert_eq!(err.kind(), CartErrorKind::OutOfStock, "amount {amount}");
        }
    }

    #[test]
    fn test_update_rejects_above_stock() {
        let cart = cart_with(&[(1, 2)]);
        for amount in [6, i64::from(u32::MAX) + 1] {
            let request = UpdateProductAmount::new(ProductId::new(1), amount);
            let err = plan_update(&cart, request, Some(stock(1, 5))).unwrap_err();
            assert_eq!(err.user_message(), "requested quantity not in stock");
        }
    }

    #[test]
    fn test_update_missing_entry_is_not_in_cart() {
        let request = UpdateProductAmount::new(ProductId::new(7), 1);
        let err = plan_update(&Cart::new(), request, Some(stock(7, 5))).unwrap_err();
        assert_eq!(err.kind(), CartErrorKind::ProductNotInCart);
        assert_eq!(err.user_message(), "error changing product quantity");
    }

    #[test]
    fn test_update_missing_stock_record() {
        let cart = cart_with(&[(1, 2)]);
        let request = UpdateProductAmount::new(ProductId::new(1), 1);
        let err = plan_update(&cart, request, None).unwrap_err();
        assert_eq!(err.kind(), CartErrorKind::ProductNotFound);
        assert_eq!(err.user_message(), "error changing product quantity");
    }
}
