//! Checkout review and order payload.
//!
//! Both are built from the same [`PriceBreakdown`] the cart summary shows,
//! so the totals a shopper confirms are the totals the orders endpoint
//! receives.

use souk_core::{CartLine, PaymentMethod, PriceBreakdown, ShippingAddress, round2};

use crate::api::types::{OrderItem, OrderRequest};
use crate::error::{ClientError, Result};

/// Everything shown on the review step before placing an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutReview {
    pub lines: Vec<CartLine>,
    pub shipping_address: Option<ShippingAddress>,
    pub payment_method: Option<PaymentMethod>,
    pub breakdown: PriceBreakdown,
}

impl CheckoutReview {
    /// Whether an order could be placed from this review.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.to_order_request().is_ok()
    }

    /// Build the `POST /orders` body.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` if the cart is empty, no payment
    /// method is chosen, or the shipping address is missing or incomplete.
    pub fn to_order_request(&self) -> Result<OrderRequest> {
        if self.lines.is_empty() {
            return Err(ClientError::Validation("Your cart is empty".to_string()));
        }

        let address = self.shipping_address.as_ref().ok_or_else(|| {
            ClientError::Validation("Please enter a shipping address".to_string())
        })?;
        let missing = address.missing_fields();
        if !missing.is_empty() {
            return Err(ClientError::Validation(format!(
                "Shipping address is missing: {}",
                missing.join(", ")
            )));
        }

        let payment_method = self.payment_method.ok_or_else(|| {
            ClientError::Validation("Please choose a payment method".to_string())
        })?;

        Ok(OrderRequest {
            order_items: self
                .lines
                .iter()
                .map(|line| OrderItem {
                    product: line.product_id.clone(),
                    name: line.name.clone(),
                    image: line.image.clone(),
                    price: line.unit_price.amount(),
                    qty: line.quantity,
                })
                .collect(),
            shipping_address: address.clone(),
            payment_method,
            items_price: round2(self.breakdown.subtotal.amount()),
            tax_price: self.breakdown.tax.amount(),
            shipping_price: self.breakdown.shipping.amount(),
            total_price: self.breakdown.total.amount(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use souk_core::{Price, PricingPolicy, ProductId};

    use super::*;

    fn line(id: &str, cents: i64, quantity: u32) -> CartLine {
        CartLine {
            product_id: ProductId::new(id),
            name: format!("Item {id}"),
            image: None,
            unit_price: Price::from_cents(cents),
            stock_available: 10,
            quantity,
        }
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Ada Lovelace".to_string(),
            address: "12 St James's Square".to_string(),
            city: "London".to_string(),
            postal_code: "SW1Y 4JH".to_string(),
            country: "UK".to_string(),
            phone: None,
        }
    }

    fn review(lines: Vec<CartLine>) -> CheckoutReview {
        let breakdown = PricingPolicy::default().price(&lines);
        CheckoutReview {
            lines,
            shipping_address: Some(address()),
            payment_method: Some(PaymentMethod::PayPal),
            breakdown,
        }
    }

    #[test]
    fn test_order_request_matches_breakdown() {
        let review = review(vec![line("p1", 2000, 2), line("p2", 1500, 1)]);
        let order = review.to_order_request().unwrap();

        assert_eq!(order.order_items.len(), 2);
        assert_eq!(order.order_items[0].qty, 2);
        assert_eq!(order.items_price, Decimal::new(5500, 2));
        assert_eq!(order.tax_price, Decimal::new(770, 2));
        assert_eq!(order.shipping_price, Decimal::from(10));
        assert_eq!(order.total_price, Decimal::new(7270, 2));
        assert!(review.is_ready());
    }

    #[test]
    fn test_items_price_rounds_subtotal() {
        let mut odd = line("p1", 0, 1);
        odd.unit_price = Price::new(Decimal::new(3335, 3));
        let order = review(vec![odd]).to_order_request().unwrap();
        assert_eq!(order.items_price, Decimal::new(334, 2));
    }

    #[test]
    fn test_empty_cart_is_rejected() {
        let err = review(Vec::new()).to_order_request().unwrap_err();
        assert!(matches!(err, ClientError::Validation(ref m) if m == "Your cart is empty"));
    }

    #[test]
    fn test_missing_selections_are_rejected() {
        let mut no_address = review(vec![line("p1", 2000, 1)]);
        no_address.shipping_address = None;
        assert!(!no_address.is_ready());

        let mut no_payment = review(vec![line("p1", 2000, 1)]);
        no_payment.payment_method = None;
        assert!(matches!(
            no_payment.to_order_request(),
            Err(ClientError::Validation(_))
        ));

        let mut partial = review(vec![line("p1", 2000, 1)]);
        if let Some(address) = partial.shipping_address.as_mut() {
            address.city = "  ".to_string();
        }
        let err = partial.to_order_request().unwrap_err();
        assert!(matches!(err, ClientError::Validation(ref m) if m.contains("city")));
    }
}
