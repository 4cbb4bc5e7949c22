//! Cart commands.

use std::io::Write;

use souk_client::Storefront;
use souk_core::ProductId;

use super::render;
use crate::error::CliError;

pub async fn show(storefront: &Storefront, out: &mut impl Write) -> Result<(), CliError> {
    let cart = storefront.cart();
    let lines = cart.lines().await;
    render::cart_lines(out, &lines)?;
    if !lines.is_empty() {
        writeln!(out)?;
        render::breakdown(out, &cart.summary().await, cart.pricing())?;
    }
    Ok(())
}

pub async fn add(
    storefront: &Storefront,
    out: &mut impl Write,
    product_id: &ProductId,
    quantity: u32,
) -> Result<(), CliError> {
    storefront.cart().add_to_cart(product_id, quantity).await?;
    writeln!(out, "Added to cart")?;
    show(storefront, out).await
}

pub async fn set(
    storefront: &Storefront,
    out: &mut impl Write,
    product_id: &ProductId,
    requested: u32,
) -> Result<(), CliError> {
    let quantity = storefront
        .cart()
        .update_quantity(product_id, requested)
        .await?;
    if quantity != requested {
        writeln!(out, "Quantity adjusted to {quantity}")?;
    }
    show(storefront, out).await
}

pub async fn remove(
    storefront: &Storefront,
    out: &mut impl Write,
    product_id: &ProductId,
) -> Result<(), CliError> {
    storefront.cart().remove_from_cart(product_id).await;
    show(storefront, out).await
}

pub async fn clear(storefront: &Storefront, out: &mut impl Write) -> Result<(), CliError> {
    storefront.cart().clear_cart().await?;
    writeln!(out, "Cart cleared")?;
    Ok(())
}
