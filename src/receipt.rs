//! Receipt
//!
//! Terminal rendering of a cart: a table of lines followed by a totals summary.

use std::io;

use rusty_money::{Money, iso::{self, Currency}};
use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};
use thiserror::Error;

use crate::{cart::Cart, prices::Price, pricing::CartTotals};

/// Errors that can occur when rendering a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// Unknown ISO 4217 code.
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Amount too large to format.
    #[error("amount {0} is out of range")]
    AmountOutOfRange(Price),

    /// IO error
    #[error("IO error")]
    Io(#[from] io::Error),
}

/// Looks up an ISO 4217 currency, in any case.
///
/// # Errors
///
/// Returns [`ReceiptError::UnknownCurrency`] for unknown codes.
pub fn find_currency(code: &str) -> Result<&'static Currency, ReceiptError> {
    iso::find(&code.trim().to_uppercase())
        .ok_or_else(|| ReceiptError::UnknownCurrency(code.to_string()))
}

/// Formats a price as money in `currency`.
///
/// # Errors
///
/// Returns [`ReceiptError::AmountOutOfRange`] if the amount exceeds `i64::MAX`.
pub fn format_price(price: Price, currency: &'static Currency) -> Result<String, ReceiptError> {
    let minor = i64::try_from(price.minor_units())
        .map_err(|_err| ReceiptError::AmountOutOfRange(price))?;

    Ok(Money::from_minor(minor, currency).to_string())
}

/// Writes the cart table and summary to `out`.
///
/// # Errors
///
/// Returns a [`ReceiptError`] if an amount cannot be formatted or writing fails.
pub fn write_receipt(
    out: &mut impl io::Write,
    cart: &Cart,
    totals: &CartTotals,
    currency: &'static Currency,
) -> Result<(), ReceiptError> {
    if cart.is_empty() {
        writeln!(out, "Cart is empty")?;
    } else {
        write_lines_table(out, cart, currency)?;
    }

    write_summary(out, cart, totals, currency)
}

fn write_lines_table(
    out: &mut impl io::Write,
    cart: &Cart,
    currency: &'static Currency,
) -> Result<(), ReceiptError> {
    let mut builder = Builder::default();

    builder.push_record(["#", "Product", "Unit price", "Qty", "Line total"]);

    for (idx, item) in cart.items().iter().enumerate() {
        let unit_price = if item.is_discounted() {
            format!(
                "{} (was {})",
                format_price(item.effective_price(), currency)?,
                format_price(item.price, currency)?
            )
        } else {
            format_price(item.price, currency)?
        };

        builder.push_record([
            format!("{}", idx + 1),
            format!("{} [{}]", item.title, item.id),
            unit_price,
            item.quantity.to_string(),
            format_price(item.line_total(), currency)?,
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Columns::new(2..5), Alignment::right());

    writeln!(out, "{table}")?;

    Ok(())
}

fn write_summary(
    out: &mut impl io::Write,
    cart: &Cart,
    totals: &CartTotals,
    currency: &'static Currency,
) -> Result<(), ReceiptError> {
    let mut rows = vec![
        ("Items", totals.item_count.to_string()),
        ("Subtotal", format_price(totals.subtotal, currency)?),
    ];

    if !totals.savings.is_zero() {
        rows.push(("Savings", format_price(totals.savings, currency)?));
    }

    if let Some(code) = cart.promotion_code() {
        rows.push((
            "Promotion",
            format!("{code} -{}", format_price(totals.promotion_discount, currency)?),
        ));
    }

    if let Some(delivery) = cart.delivery() {
        rows.push((
            "Delivery",
            format!(
                "{}, {} {}",
                delivery.neighborhood,
                delivery.city,
                format_price(totals.delivery_fee, currency)?
            ),
        ));
    }

    rows.push(("Total", format_price(totals.total, currency)?));

    let label_width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);

    for (label, value) in rows {
        writeln!(out, " {label:<label_width$}  {value}")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        cart::CartAction,
        delivery::{DeliveryInfo, DeliveryTable},
        items::LineItem,
    };

    use super::*;

    #[test]
    fn finds_currency_case_insensitively() -> TestResult {
        assert_eq!(find_currency("usd")?, iso::USD);
        assert!(matches!(
            find_currency("XXZ"),
            Err(ReceiptError::UnknownCurrency(_))
        ));

        Ok(())
    }

    #[test]
    fn renders_lines_and_summary() -> TestResult {
        let cart = Cart::new()
            .dispatch(CartAction::AddItem {
                item: LineItem::new("A", "Apple", Price::new(1000))
                    .with_promo_price(Price::new(800)),
                quantity: 2,
            })
            .dispatch(CartAction::SetDelivery(Some(DeliveryInfo::new(
                "Central City",
                "Downtown",
            ))));
        let totals = CartTotals::compute(&cart, &DeliveryTable::default(), None);

        let mut out = Vec::new();
        write_receipt(&mut out, &cart, &totals, iso::USD)?;
        let text = String::from_utf8(out)?;

        assert!(text.contains("Apple [A]"), "missing product row: {text}");
        assert!(text.contains("Subtotal"), "missing subtotal: {text}");
        assert!(text.contains("Downtown, Central City"), "missing delivery: {text}");
        assert!(text.contains("Total"), "missing total: {text}");

        Ok(())
    }

    #[test]
    fn renders_empty_cart() -> TestResult {
        let cart = Cart::new();

        let mut out = Vec::new();
        write_receipt(&mut out, &cart, &CartTotals::default(), iso::USD)?;

        assert!(String::from_utf8(out)?.starts_with("Cart is empty"));

        Ok(())
    }
}
