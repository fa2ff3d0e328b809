//! Core types for Rocket Cart.
//!
//! This module provides type-safe wrappers for the cart domain.

pub mod cart;
pub mod id;
pub mod price;
pub mod product;

pub use cart::{Cart, CartDataError, CartEntry};
pub use id::*;
pub use price::Price;
pub use product::{ProductRecord, StockRecord};
