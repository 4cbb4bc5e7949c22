//! Command implementations.
//!
//! Each command writes its human-readable result to `out`; failures bubble
//! up as [`crate::error::CliError`].

pub mod account;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod prefs;
pub mod wishlist;

mod render;
