//! Catalog browsing.

use std::io::Write;

use souk_client::Storefront;
use souk_client::api::types::ProductQuery;
use souk_core::ProductId;

use super::render;
use crate::error::CliError;

pub async fn list(
    storefront: &Storefront,
    out: &mut impl Write,
    search: Option<String>,
    category: Option<String>,
    page: Option<u32>,
) -> Result<(), CliError> {
    let query = ProductQuery {
        search,
        category,
        page,
    };
    let products = storefront.products(&query).await?;
    if products.is_empty() {
        writeln!(out, "No products found")?;
    }
    for product in &products {
        render::product_row(out, product)?;
    }
    Ok(())
}

pub async fn show(
    storefront: &Storefront,
    out: &mut impl Write,
    product_id: &ProductId,
) -> Result<(), CliError> {
    let product = storefront.product(product_id).await?;
    render::product_row(out, &product)?;
    if let Some(category) = &product.category {
        writeln!(out, "Category: {category}")?;
    }
    if !product.description.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", product.description)?;
    }
    if storefront.wishlist().is_in_wishlist(product_id).await {
        writeln!(out, "In your wishlist")?;
    }
    Ok(())
}
