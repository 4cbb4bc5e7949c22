//! Souk storefront client library.
//!
//! Talks to the storefront REST API and keeps a local view of the
//! shopper's cart and wishlist consistent with it. Every write is followed
//! by a full refetch; local state is never patched in place.
//!
//! # Layout
//!
//! - [`api`] - `CommerceApi` seam and its `reqwest` implementation
//! - [`stores`] - Cart and wishlist stores
//! - [`storage`] / [`session`] / [`preferences`] - Durable client-side state
//! - [`checkout`] - Review and order payload built from the shared calculator
//! - [`state`] - The [`Storefront`] container wiring it all together

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod checkout;
pub mod config;
pub mod error;
pub mod preferences;
pub mod session;
pub mod state;
pub mod storage;
pub mod stores;

#[cfg(test)]
mod testing;

pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use state::Storefront;
