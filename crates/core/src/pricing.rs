//! Price breakdown for a set of cart lines.
//!
//! The cart summary, checkout review and order payload all call
//! [`price_lines`] with the same [`PricingPolicy`], so the number a shopper
//! reviews is the number the orders endpoint receives.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CartLine, Price, round2};

/// Tax and shipping rules applied at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// Fraction of the subtotal charged as tax (0.14 = 14%).
    pub tax_rate: Decimal,
    /// Orders with a subtotal strictly above this ship free.
    pub free_shipping_threshold: Decimal,
    /// Shipping charged at or below the threshold.
    pub flat_shipping_fee: Decimal,
}

impl PricingPolicy {
    pub const DEFAULT_TAX_RATE: Decimal = Decimal::from_parts(14, 0, 0, false, 2);
    pub const DEFAULT_FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(100, 0, 0, false, 0);
    pub const DEFAULT_FLAT_SHIPPING_FEE: Decimal = Decimal::from_parts(10, 0, 0, false, 0);

    #[must_use]
    pub const fn new(
        tax_rate: Decimal,
        free_shipping_threshold: Decimal,
        flat_shipping_fee: Decimal,
    ) -> Self {
        Self {
            tax_rate,
            free_shipping_threshold,
            flat_shipping_fee,
        }
    }

    /// Shipping owed on a given subtotal.
    #[must_use]
    pub fn shipping_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal > self.free_shipping_threshold {
            Decimal::ZERO
        } else {
            self.flat_shipping_fee
        }
    }

    /// Price a set of lines under this policy.
    #[must_use]
    pub fn price(&self, lines: &[CartLine]) -> PriceBreakdown {
        price_lines(lines, self)
    }
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_TAX_RATE,
            Self::DEFAULT_FREE_SHIPPING_THRESHOLD,
            Self::DEFAULT_FLAT_SHIPPING_FEE,
        )
    }
}

/// Subtotal, tax, shipping and total for a cart.
///
/// `subtotal` is kept unrounded; `tax` and `total` are rounded to cents
/// because they are shown to the shopper and submitted with the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub subtotal: Price,
    pub tax: Price,
    pub shipping: Price,
    pub total: Price,
}

impl PriceBreakdown {
    /// True when the order qualifies for free shipping.
    #[must_use]
    pub fn ships_free(&self) -> bool {
        !self.shipping.is_positive()
    }
}

/// Compute the price breakdown for `lines`.
///
/// An empty cart still owes the flat shipping fee on paper; callers refuse
/// to place empty orders before this matters.
#[must_use]
pub fn price_lines(lines: &[CartLine], policy: &PricingPolicy) -> PriceBreakdown {
    // Line amounts come from the server; saturate rather than overflow.
    let subtotal = lines.iter().fold(Decimal::ZERO, |sum, line| {
        sum.saturating_add(line.line_total().amount())
    });
    let tax = round2(subtotal.saturating_mul(policy.tax_rate));
    let shipping = policy.shipping_for(subtotal);
    let total = round2(subtotal.saturating_add(tax).saturating_add(shipping));

    PriceBreakdown {
        subtotal: Price::new(subtotal),
        tax: Price::new(tax),
        shipping: Price::new(shipping),
        total: Price::new(total),
    }
}
