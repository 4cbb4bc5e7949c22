//! Checkout commands.

use std::io::Write;

use clap::Args;
use souk_client::Storefront;
use souk_core::{PaymentMethod, ShippingAddress};

use super::render;
use crate::error::CliError;

#[derive(Args)]
pub struct AddressArgs {
    #[arg(long)]
    full_name: String,

    #[arg(long)]
    address: String,

    #[arg(long)]
    city: String,

    #[arg(long)]
    postal_code: String,

    #[arg(long)]
    country: String,

    #[arg(long)]
    phone: Option<String>,
}

impl From<AddressArgs> for ShippingAddress {
    fn from(args: AddressArgs) -> Self {
        Self {
            full_name: args.full_name,
            address: args.address,
            city: args.city,
            postal_code: args.postal_code,
            country: args.country,
            phone: args.phone,
        }
    }
}

pub async fn address(
    storefront: &Storefront,
    out: &mut impl Write,
    args: AddressArgs,
) -> Result<(), CliError> {
    storefront
        .cart()
        .save_shipping_address(args.into())
        .await?;
    writeln!(out, "Shipping address saved")?;
    Ok(())
}

pub async fn payment(
    storefront: &Storefront,
    out: &mut impl Write,
    method: PaymentMethod,
) -> Result<(), CliError> {
    storefront.cart().save_payment_method(method).await?;
    writeln!(out, "Payment method set to {method}")?;
    Ok(())
}

pub async fn review(storefront: &Storefront, out: &mut impl Write) -> Result<(), CliError> {
    let review = storefront.checkout_review().await;

    render::cart_lines(out, &review.lines)?;
    writeln!(out)?;

    match &review.shipping_address {
        Some(a) => writeln!(
            out,
            "Ship to: {}, {}, {} {}, {}",
            a.full_name, a.address, a.city, a.postal_code, a.country
        )?,
        None => writeln!(out, "Ship to: (not set)")?,
    }
    match review.payment_method {
        Some(method) => writeln!(out, "Payment: {method}")?,
        None => writeln!(out, "Payment: (not set)")?,
    }
    writeln!(out)?;
    render::breakdown(out, &review.breakdown, storefront.pricing())?;

    if let Err(e) = review.to_order_request() {
        writeln!(out)?;
        writeln!(out, "Not ready: {}", e.user_message())?;
    }
    Ok(())
}

pub async fn place(storefront: &Storefront, out: &mut impl Write) -> Result<(), CliError> {
    let receipt = storefront.place_order().await?;
    write!(out, "Order {} placed", receipt.id)?;
    if let Some(total) = receipt.total {
        write!(out, " ({total})")?;
    }
    writeln!(out)?;
    Ok(())
}
