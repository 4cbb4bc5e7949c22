//! Request and response types for the storefront REST API.
//!
//! The `Raw*` types mirror whatever the API happens to send (ids as `_id`
//! or `id`, products embedded or referenced by id, arrays bare or wrapped)
//! and never leave the `api` module; `conversions` turns them into the
//! fixed `souk_core` shapes.

use std::fmt;

use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use souk_core::{OrderId, PaymentMethod, Price, ProductId, ShippingAddress, User};

// =============================================================================
// Public request/response types
// =============================================================================

/// Catalog listing filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    /// Free-text search.
    pub search: Option<String>,
    /// Category name.
    pub category: Option<String>,
    /// 1-based page number.
    pub page: Option<u32>,
}

impl ProductQuery {
    /// Whether this is the unfiltered default listing.
    #[must_use]
    pub const fn is_default(&self) -> bool {
        self.search.is_none() && self.category.is_none()
    }

    pub(crate) fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(category) = &self.category {
            pairs.push(("category", category.clone()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        pairs
    }
}

/// Credentials issued by the auth endpoints.
#[derive(Clone)]
pub struct AuthGrant {
    pub token: SecretString,
    pub user: User,
}

impl fmt::Debug for AuthGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGrant")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

/// Which branch the wishlist toggle endpoint took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WishlistAction {
    Added,
    Removed,
}

/// The toggle endpoint's declared outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub action: WishlistAction,
    /// Message supplied by the API, if any.
    pub message: Option<String>,
}

impl ToggleOutcome {
    /// Text to show the shopper.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or(match self.action {
            WishlistAction::Added => "Added to wishlist",
            WishlistAction::Removed => "Removed from wishlist",
        })
    }
}

/// One line of an order payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product: ProductId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub qty: u32,
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub order_items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    #[serde(with = "rust_decimal::serde::float")]
    pub items_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub shipping_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
}

/// What the orders endpoint returns for a placed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReceipt {
    pub id: OrderId,
    pub total: Option<Price>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

// =============================================================================
// Outgoing bodies
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CartItemBody<'a> {
    pub product_id: &'a ProductId,
    pub quantity: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WishlistToggleBody<'a> {
    pub product_id: &'a ProductId,
}

#[derive(Serialize)]
pub(crate) struct LoginBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
pub(crate) struct RegisterBody<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

// =============================================================================
// Raw wire shapes
// =============================================================================

/// A list that may arrive bare or wrapped in an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Listing<T> {
    Bare(Vec<T>),
    Wrapped {
        #[serde(
            alias = "cart",
            alias = "cartItems",
            alias = "wishlist",
            alias = "products",
            alias = "data"
        )]
        items: Vec<T>,
    },
}

impl<T> Listing<T> {
    pub(crate) fn into_items(self) -> Vec<T> {
        match self {
            Self::Bare(items) | Self::Wrapped { items } => items,
        }
    }
}

/// A single product that may arrive wrapped as `{ "product": {...} }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ProductEnvelope {
    Wrapped { product: RawProduct },
    Bare(RawProduct),
}

/// An identifier that may be sent as a string or a number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawId {
    Text(String),
    Number(i64),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Number(n) => n.to_string(),
        }
    }
}

/// Prefer `id`, fall back to `_id`; blank ids count as missing.
pub(crate) fn pick_id(id: Option<RawId>, object_id: Option<RawId>) -> Option<String> {
    id.or(object_id)
        .map(RawId::into_string)
        .filter(|id| !id.trim().is_empty())
}

/// A product as the API sends it, every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawProduct {
    #[serde(default)]
    pub id: Option<RawId>,
    #[serde(default, rename = "_id")]
    pub object_id: Option<RawId>,
    #[serde(default, alias = "title")]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default, alias = "discount_price", alias = "salePrice")]
    pub discount_price: Option<Decimal>,
    #[serde(default, alias = "countInStock", alias = "stockAvailable")]
    pub stock: Option<i64>,
}

/// Reference to a product inside a cart or wishlist entry.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ProductRef {
    Id(RawId),
    Embedded(Box<RawProduct>),
}

/// A cart or wishlist entry.
///
/// The product may be embedded, referenced by id with a snapshot flattened
/// alongside, or (for wishlists) the entry may itself be the product.
/// `product` is `Some(None)` when the key is present but `null`.
#[derive(Debug, Deserialize)]
pub(crate) struct RawEntry {
    #[serde(
        default,
        alias = "productId",
        alias = "product_id",
        deserialize_with = "present"
    )]
    #[allow(clippy::option_option)]
    pub product: Option<Option<ProductRef>>,
    #[serde(default, alias = "qty")]
    pub quantity: Option<i64>,
    #[serde(flatten)]
    pub snapshot: RawProduct,
}

/// Keep a present-but-null field apart from a missing one.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Response of `POST /wishlist/toggle`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawToggle {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default, alias = "inWishlist")]
    pub added: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A user as returned by the auth endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawUser {
    #[serde(default)]
    pub id: Option<RawId>,
    #[serde(default, rename = "_id")]
    pub object_id: Option<RawId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub is_admin: Option<bool>,
}

/// Response of the auth endpoints; the user may be nested or inline.
#[derive(Debug, Deserialize)]
pub(crate) struct RawAuth {
    #[serde(alias = "accessToken")]
    pub token: String,
    #[serde(default)]
    pub user: Option<RawUser>,
    #[serde(flatten)]
    pub inline: RawUser,
}

/// Response of `POST /orders`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawOrder {
    #[serde(default)]
    pub id: Option<RawId>,
    #[serde(default, rename = "_id")]
    pub object_id: Option<RawId>,
    #[serde(default)]
    pub total_price: Option<Decimal>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub order: Option<Box<RawOrder>>,
}

/// Error body the API sends alongside non-success statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct RawErrorBody {
    #[serde(default, alias = "error")]
    pub message: Option<String>,
}
