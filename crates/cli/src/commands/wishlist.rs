//! Wishlist commands.

use std::io::Write;

use souk_client::Storefront;
use souk_core::ProductId;

use super::render;
use crate::error::CliError;

pub async fn show(storefront: &Storefront, out: &mut impl Write) -> Result<(), CliError> {
    let entries = storefront.wishlist().entries().await;
    if entries.is_empty() {
        writeln!(out, "Your wishlist is empty")?;
    }
    for entry in &entries {
        render::wishlist_entry(out, entry)?;
    }
    Ok(())
}

pub async fn toggle(
    storefront: &Storefront,
    out: &mut impl Write,
    product_id: &ProductId,
) -> Result<(), CliError> {
    let outcome = storefront.wishlist().toggle_wishlist(product_id).await?;
    writeln!(out, "{}", outcome.message())?;
    Ok(())
}
