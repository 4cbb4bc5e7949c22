//! Catalog, cart and wishlist records in their normalized shape.
//!
//! These are the only shapes that leave the client's API boundary; loosely
//! typed wire payloads are converted into them in one place.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{ProductId, UserId};
use super::price::Price;

/// The price a shopper pays: the discount price when one is set, otherwise
/// the list price.
#[must_use]
pub fn effective_price(price: Price, discount_price: Option<Price>) -> Price {
    match discount_price {
        Some(discount) if discount.is_positive() => discount,
        _ => price,
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub category: Option<String>,
    pub price: Price,
    pub discount_price: Option<Price>,
    pub stock: u32,
}

impl Product {
    /// Price after any discount.
    #[must_use]
    pub fn effective_price(&self) -> Price {
        effective_price(self.price, self.discount_price)
    }

    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// One product-and-quantity entry in a shopper's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub image: Option<String>,
    /// Discounted price if present, else list price.
    pub unit_price: Price,
    pub stock_available: u32,
    pub quantity: u32,
}

impl CartLine {
    /// `unit_price × quantity`, unrounded, or `None` if it overflows.
    #[must_use]
    pub fn checked_line_total(&self) -> Option<Price> {
        self.unit_price
            .amount()
            .checked_mul(Decimal::from(self.quantity))
            .map(Price::new)
    }

    /// `unit_price × quantity`, unrounded and saturating.
    #[must_use]
    pub fn line_total(&self) -> Price {
        Price::new(
            self.unit_price
                .amount()
                .saturating_mul(Decimal::from(self.quantity)),
        )
    }

    /// Clamp a requested absolute quantity into `[1, stock_available]`.
    ///
    /// Returns `None` when nothing is in stock.
    #[must_use]
    pub fn clamp_quantity(&self, requested: u32) -> Option<u32> {
        (self.stock_available > 0).then(|| requested.clamp(1, self.stock_available))
    }
}

/// One product a shopper has marked for later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistEntry {
    pub product_id: ProductId,
    pub name: String,
    pub image: Option<String>,
    pub price: Price,
    pub discount_price: Option<Price>,
    pub stock_available: u32,
}

impl WishlistEntry {
    #[must_use]
    pub fn effective_price(&self) -> Price {
        effective_price(self.price, self.discount_price)
    }
}

/// The signed-in shopper as reported by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(stock: u32, quantity: u32) -> CartLine {
        CartLine {
            product_id: ProductId::new("p1"),
            name: "Mug".to_string(),
            image: None,
            unit_price: Price::from_cents(1250),
            stock_available: stock,
            quantity,
        }
    }

    #[test]
    fn test_effective_price_prefers_positive_discount() {
        let list = Price::from_cents(2000);
        assert_eq!(effective_price(list, Some(Price::from_cents(1500))), Price::from_cents(1500));
        assert_eq!(effective_price(list, Some(Price::ZERO)), list);
        assert_eq!(effective_price(list, None), list);
    }

    #[test]
    fn test_line_total() {
        assert_eq!(line(10, 3).line_total().amount(), Decimal::new(3750, 2));
        assert_eq!(line(10, 3).checked_line_total(), Some(line(10, 3).line_total()));
    }

    #[test]
    fn test_huge_line_total_does_not_panic() {
        let huge = CartLine {
            unit_price: Price::new(Decimal::MAX),
            ..line(10, u32::MAX)
        };
        assert_eq!(huge.checked_line_total(), None);
        assert_eq!(huge.line_total().amount(), Decimal::MAX);
    }

    #[test]
    fn test_clamp_quantity() {
        let l = line(5, 2);
        assert_eq!(l.clamp_quantity(0), Some(1));
        assert_eq!(l.clamp_quantity(3), Some(3));
        assert_eq!(l.clamp_quantity(99), Some(5));
        assert_eq!(line(0, 1).clamp_quantity(2), None);
    }
}
