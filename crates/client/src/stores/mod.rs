//! Client-side views of the shopper's remote cart and wishlist.
//!
//! Both stores follow the same protocol: write to the remote resource, then
//! refetch it in full and replace local state. Local state is never patched
//! in place, so it can only ever lag the server, never disagree with it.

pub mod cart;
pub mod wishlist;

pub use cart::CartStore;
pub use wishlist::WishlistStore;
