//! Cache types for catalog responses.

use souk_core::{Product, ProductId};

use super::types::ProductQuery;

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    Products { page: Option<u32> },
}

impl CacheKey {
    /// Key for a listing, `None` for filtered queries which are never cached.
    pub fn listing(query: &ProductQuery) -> Option<Self> {
        query
            .is_default()
            .then_some(Self::Products { page: query.page })
    }
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Vec<Product>),
}
