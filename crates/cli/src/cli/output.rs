//! Terminal output helpers.

use std::error::Error;

use rusty_money::iso::Currency;
use serde::Serialize;
use storefront::{
    delivery::DeliveryInfo, items::LineItem, prices::Price, pricing::CartTotals,
    receipt::format_price,
};
use storefront_app::{notice::Notice, session::CartSession};

/// Serializable view of a cart.
#[derive(Debug, Serialize)]
pub(crate) struct CartView<'a> {
    items: &'a [LineItem],
    delivery: Option<&'a DeliveryInfo>,
    promotion_code: Option<&'a str>,
    error: Option<&'a str>,
    totals: CartTotals,
}

impl<'a> CartView<'a> {
    pub(crate) fn of(session: &'a CartSession) -> Self {
        let cart = session.cart();

        Self {
            items: cart.items(),
            delivery: cart.delivery(),
            promotion_code: cart.promotion_code(),
            error: cart.error(),
            totals: session.totals(),
        }
    }
}

pub(crate) fn notices(notices: &[Notice]) {
    for notice in notices {
        println!("{notice}");
    }
}

/// Formats `price`, falling back to minor units if it cannot be shown as money.
pub(crate) fn price(price: Price, currency: &'static Currency) -> String {
    format_price(price, currency).unwrap_or_else(|_error| price.to_string())
}

/// One-line cart summary printed after edits.
pub(crate) fn summary(session: &CartSession, currency: &'static Currency) {
    let totals = session.totals();

    println!(
        "cart: {} item(s), total {}",
        totals.item_count,
        price(totals.total, currency)
    );
}

pub(crate) fn json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|error| format!("failed to serialize output: {error}"))?;

    println!("{text}");

    Ok(())
}

/// An error and its sources joined into one line.
pub(crate) fn error_chain(error: &dyn Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();

    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    message
}
