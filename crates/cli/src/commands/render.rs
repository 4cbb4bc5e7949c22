//! Plain-text rendering shared by the commands.

use std::io::{self, Write};

use rust_decimal::Decimal;
use souk_core::{CartLine, PriceBreakdown, PricingPolicy, Product, WishlistEntry};

pub fn cart_lines(out: &mut impl Write, lines: &[CartLine]) -> io::Result<()> {
    if lines.is_empty() {
        return writeln!(out, "Your cart is empty");
    }
    for line in lines {
        writeln!(
            out,
            "{:<12} {:<32} {:>3} x {:>10} = {:>10}",
            line.product_id,
            line.name,
            line.quantity,
            line.unit_price.to_string(),
            line.line_total().rounded().to_string(),
        )?;
        if line.quantity >= line.stock_available {
            writeln!(out, "{:<12} only {} in stock", "", line.stock_available)?;
        }
    }
    Ok(())
}

pub fn breakdown(
    out: &mut impl Write,
    breakdown: &PriceBreakdown,
    policy: &PricingPolicy,
) -> io::Result<()> {
    let rate = (policy.tax_rate * Decimal::ONE_HUNDRED).normalize();
    writeln!(out, "{:<20} {:>10}", "Subtotal", breakdown.subtotal.rounded().to_string())?;
    writeln!(out, "{:<20} {:>10}", format!("Tax ({rate}%)"), breakdown.tax.to_string())?;
    if breakdown.ships_free() {
        writeln!(out, "{:<20} {:>10}", "Shipping", "FREE")?;
    } else {
        writeln!(out, "{:<20} {:>10}", "Shipping", breakdown.shipping.to_string())?;
    }
    writeln!(out, "{:<20} {:>10}", "Total", breakdown.total.to_string())
}

pub fn product_row(out: &mut impl Write, product: &Product) -> io::Result<()> {
    let price = match product.discount_price.filter(|d| d.is_positive()) {
        Some(discount) => format!("{discount} (was {})", product.price),
        None => product.price.to_string(),
    };
    let stock = if product.in_stock() {
        format!("{} in stock", product.stock)
    } else {
        "out of stock".to_string()
    };
    writeln!(out, "{:<12} {:<32} {:>20}  {stock}", product.id, product.name, price)
}

pub fn wishlist_entry(out: &mut impl Write, entry: &WishlistEntry) -> io::Result<()> {
    writeln!(
        out,
        "{:<12} {:<32} {:>10}",
        entry.product_id,
        entry.name,
        entry.effective_price().to_string()
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use souk_core::{Price, ProductId};

    use super::*;

    fn line(quantity: u32, stock: u32) -> CartLine {
        CartLine {
            product_id: ProductId::new("p1"),
            name: "Ceramic Mug".to_string(),
            image: None,
            unit_price: Price::from_cents(2000),
            stock_available: stock,
            quantity,
        }
    }

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
    {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_empty_cart() {
        assert_eq!(render(|out| cart_lines(out, &[])), "Your cart is empty\n");
    }

    #[test]
    fn test_cart_line_and_stock_warning() {
        let text = render(|out| cart_lines(out, &[line(2, 2)]));
        assert!(text.contains("Ceramic Mug"));
        assert!(text.contains("$40.00"));
        assert!(text.contains("only 2 in stock"));

        let text = render(|out| cart_lines(out, &[line(1, 9)]));
        assert!(!text.contains("in stock"));
    }

    #[test]
    fn test_breakdown_shows_rate_and_free_shipping() {
        let policy = PricingPolicy::default();
        let text = render(|out| breakdown(out, &policy.price(&[line(2, 9)]), &policy));
        assert!(text.contains("Tax (14%)"));
        assert!(text.contains("$10.00"));
        assert!(text.contains("$55.60"));

        let text = render(|out| breakdown(out, &policy.price(&[line(6, 9)]), &policy));
        assert!(text.contains("FREE"));
    }
}
