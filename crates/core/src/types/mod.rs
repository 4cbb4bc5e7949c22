//! Core types for Souk.
//!
//! This module provides type-safe wrappers for common storefront concepts.

pub mod address;
pub mod cart;
pub mod email;
pub mod id;
pub mod price;

pub use address::{PaymentMethod, ShippingAddress, UnknownPaymentMethod};
pub use cart::{CartLine, Product, User, WishlistEntry, effective_price};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, round2};
