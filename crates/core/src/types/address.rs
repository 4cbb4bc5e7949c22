//! Checkout records persisted on the shopper's device.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Where an order ships to.
///
/// Saved wholesale at checkout and cleared on logout or when the cart is
/// emptied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ShippingAddress {
    /// Names of required fields that are blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("fullName", &self.full_name),
            ("address", &self.address),
            ("city", &self.city),
            ("postalCode", &self.postal_code),
            ("country", &self.country),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// The payment method chosen during checkout.
///
/// Capture itself happens in a third-party widget; only the selection is
/// recorded here and forwarded with the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    PayPal,
    Card,
    CashOnDelivery,
}

/// Error for an unrecognized payment method name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown payment method: {0}")]
pub struct UnknownPaymentMethod(pub String);

impl PaymentMethod {
    /// The wire name, as accepted by the orders endpoint.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PayPal => "PayPal",
            Self::Card => "Card",
            Self::CashOnDelivery => "CashOnDelivery",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownPaymentMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "paypal" => Ok(Self::PayPal),
            "card" | "creditcard" | "stripe" => Ok(Self::Card),
            "cashondelivery" | "cod" => Ok(Self::CashOnDelivery),
            _ => Err(UnknownPaymentMethod(s.to_string())),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
