//! Normalization from raw API payloads into `souk_core` types.
//!
//! Entries that cannot be tied to a product id are dropped with a warning
//! rather than surfacing half-built lines.

use rust_decimal::Decimal;
use souk_core::{
    CartLine, OrderId, Price, Product, ProductId, User, UserId, WishlistEntry, effective_price,
};
use tracing::warn;

use super::types::{
    AuthGrant, OrderReceipt, ProductRef, RawAuth, RawEntry, RawOrder, RawProduct, RawToggle,
    RawUser, ToggleOutcome, WishlistAction, pick_id,
};
use crate::error::ClientError;

/// Convert a possibly negative or missing stock count.
fn stock_count(stock: Option<i64>) -> u32 {
    stock.map_or(0, |s| u32::try_from(s.max(0)).unwrap_or(u32::MAX))
}

fn price(amount: Option<Decimal>) -> Price {
    Price::new(amount.unwrap_or(Decimal::ZERO))
}

fn discount(amount: Option<Decimal>) -> Option<Price> {
    amount.map(Price::new).filter(Price::is_positive)
}

impl RawProduct {
    /// Fill missing fields from `fallback`.
    fn or(self, fallback: Self) -> Self {
        Self {
            id: self.id.or(fallback.id),
            object_id: self.object_id.or(fallback.object_id),
            name: self.name.or(fallback.name),
            description: self.description.or(fallback.description),
            image: self.image.or(fallback.image),
            images: self.images.or(fallback.images),
            category: self.category.or(fallback.category),
            price: self.price.or(fallback.price),
            discount_price: self.discount_price.or(fallback.discount_price),
            stock: self.stock.or(fallback.stock),
        }
    }

    fn product_id(&self) -> Option<String> {
        pick_id(self.id.clone(), self.object_id.clone())
    }

    fn primary_image(&self) -> Option<String> {
        self.image.clone().or_else(|| {
            self.images
                .as_ref()
                .and_then(|images| images.first().cloned())
        })
    }
}

/// Resolve an entry into its product id and merged product snapshot.
///
/// `entry_is_product` lets a bare product object stand in for the entry
/// (wishlists are commonly sent as a plain product list). Cart entries
/// carry their own line `_id`, so they must name the product explicitly.
/// An explicit `"product": null` (a deleted product) never resolves.
fn resolve_entry(
    entry: RawEntry,
    entry_is_product: bool,
) -> Option<(ProductId, RawProduct, Option<i64>)> {
    let RawEntry {
        product,
        quantity,
        snapshot,
    } = entry;

    let (id, merged) = match product {
        Some(Some(ProductRef::Id(id))) => (pick_id(Some(id), None), snapshot),
        Some(Some(ProductRef::Embedded(embedded))) => {
            // The entry's own id names the line, not the product.
            let merged = embedded.or(RawProduct {
                id: None,
                object_id: None,
                ..snapshot
            });
            (merged.product_id(), merged)
        }
        Some(None) => (None, snapshot),
        None if entry_is_product => (snapshot.product_id(), snapshot),
        None => (None, snapshot),
    };

    Some((ProductId::new(id?), merged, quantity))
}

/// Convert a raw cart entry into a `CartLine`.
pub fn convert_cart_line(entry: RawEntry) -> Option<CartLine> {
    let Some((product_id, product, quantity)) = resolve_entry(entry, false) else {
        warn!("Dropping cart entry without a product reference");
        return None;
    };

    let quantity = match quantity.map(u32::try_from) {
        Some(Ok(q)) if q > 0 => q,
        _ => {
            warn!(%product_id, "Dropping cart entry with invalid quantity");
            return None;
        }
    };

    let image = product.primary_image();
    let line = CartLine {
        unit_price: effective_price(price(product.price), discount(product.discount_price)),
        stock_available: stock_count(product.stock),
        name: product.name.unwrap_or_default(),
        image,
        product_id,
        quantity,
    };
    if line.checked_line_total().is_none() {
        warn!(product_id = %line.product_id, "Dropping cart entry whose total overflows");
        return None;
    }
    Some(line)
}

/// Convert a raw wishlist entry into a `WishlistEntry`.
pub fn convert_wishlist_entry(entry: RawEntry) -> Option<WishlistEntry> {
    let Some((product_id, product, _)) = resolve_entry(entry, true) else {
        warn!("Dropping wishlist entry without a product reference");
        return None;
    };

    let image = product.primary_image();
    Some(WishlistEntry {
        product_id,
        name: product.name.unwrap_or_default(),
        image,
        price: price(product.price),
        discount_price: discount(product.discount_price),
        stock_available: stock_count(product.stock),
    })
}

/// Convert a catalog product.
pub fn convert_product(raw: RawProduct) -> Option<Product> {
    let Some(id) = raw.product_id() else {
        warn!("Dropping product without an id");
        return None;
    };

    let image = raw.primary_image();
    Some(Product {
        id: ProductId::new(id),
        name: raw.name.unwrap_or_default(),
        description: raw.description.unwrap_or_default(),
        image,
        category: raw.category,
        price: price(raw.price),
        discount_price: discount(raw.discount_price),
        stock: stock_count(raw.stock),
    })
}

/// Convert the toggle endpoint's response.
///
/// # Errors
///
/// Returns `ClientError::Parse` if the response does not say what happened.
pub fn convert_toggle(raw: RawToggle) -> Result<ToggleOutcome, ClientError> {
    let action = match (raw.action.as_deref().map(str::to_ascii_lowercase), raw.added) {
        (Some(action), _) if action == "added" || action == "add" => WishlistAction::Added,
        (Some(action), _) if action == "removed" || action == "remove" => WishlistAction::Removed,
        (None, Some(true)) => WishlistAction::Added,
        (None, Some(false)) => WishlistAction::Removed,
        (action, _) => {
            return Err(ClientError::Parse(format!(
                "wishlist toggle response has no recognizable action: {action:?}"
            )));
        }
    };

    Ok(ToggleOutcome {
        action,
        message: raw.message.filter(|m| !m.is_empty()),
    })
}

fn convert_user(raw: RawUser) -> Result<User, ClientError> {
    let id = pick_id(raw.id, raw.object_id)
        .ok_or_else(|| ClientError::Parse("auth response has no user id".to_string()))?;

    let role = raw
        .role
        .or_else(|| raw.is_admin.and_then(|admin| admin.then(|| "admin".to_string())));

    Ok(User {
        id: UserId::new(id),
        name: raw.name.unwrap_or_default(),
        email: raw.email.unwrap_or_default(),
        role,
    })
}

/// Convert a login/register response.
///
/// # Errors
///
/// Returns `ClientError::Parse` if no user id can be found.
pub fn convert_auth(raw: RawAuth) -> Result<AuthGrant, ClientError> {
    let user = convert_user(raw.user.unwrap_or(raw.inline))?;
    Ok(AuthGrant {
        token: raw.token.into(),
        user,
    })
}

/// Convert an order creation response.
///
/// # Errors
///
/// Returns `ClientError::Parse` if the response has no order id.
pub fn convert_order(raw: RawOrder) -> Result<OrderReceipt, ClientError> {
    let raw = match raw {
        RawOrder {
            order: Some(nested),
            ..
        } => *nested,
        flat => flat,
    };

    let id = pick_id(raw.id, raw.object_id)
        .ok_or_else(|| ClientError::Parse("order response has no id".to_string()))?;

    Ok(OrderReceipt {
        id: OrderId::new(id),
        total: raw.total_price.map(Price::new),
        created_at: raw
            .created_at
            .as_deref()
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&chrono::Utc)),
    })
}
