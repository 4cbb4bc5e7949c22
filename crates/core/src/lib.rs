//! Souk Core - Shared storefront types.
//!
//! This crate provides the types every Souk component agrees on:
//! - `souk-client` - REST client, cart and wishlist stores, checkout
//! - `souk-cli` - Terminal storefront built on the client
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no persistence. Cart summaries, checkout review and the order
//! payload all price through [`pricing::price_lines`] so they cannot drift.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, money, email, catalog, cart and checkout records
//! - [`pricing`] - Subtotal, tax, shipping and total for a set of cart lines

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod pricing;
pub mod types;

pub use pricing::{PriceBreakdown, PricingPolicy, price_lines};
pub use types::*;
