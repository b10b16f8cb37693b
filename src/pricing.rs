//! Pricing
//!
//! Derived totals are pure functions of the cart snapshot. They are recomputed on every
//! read; carts hold tens of lines at most.

use serde::Serialize;

use crate::{
    cart::Cart, delivery::DeliveryTable, items::LineItem, prices::Price, promotions::Promotion,
};

/// Sum of effective price x quantity over every line.
pub fn subtotal(items: &[LineItem]) -> Price {
    items.iter().map(LineItem::line_total).sum()
}

/// Sum of quantities.
pub fn item_count(items: &[LineItem]) -> u64 {
    items.iter().map(|item| u64::from(item.quantity)).sum()
}

/// Amount saved by promotional prices across every line.
pub fn total_savings(items: &[LineItem]) -> Price {
    items.iter().map(LineItem::line_savings).sum()
}

/// `max(0, subtotal - discount + delivery_fee)`.
pub fn grand_total(subtotal: Price, discount: Price, delivery_fee: Price) -> Price {
    let total = i128::from(subtotal.minor_units()) - i128::from(discount.minor_units())
        + i128::from(delivery_fee.minor_units());

    if total <= 0 {
        return Price::ZERO;
    }

    Price::new(u64::try_from(total).unwrap_or(u64::MAX))
}

/// Every figure shown on a cart summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CartTotals {
    /// Sum of line totals at effective prices
    pub subtotal: Price,

    /// Units across all lines
    pub item_count: u64,

    /// Savings from promotional prices
    pub savings: Price,

    /// Flat delivery fee
    pub delivery_fee: Price,

    /// Discount from the applied promotion code
    pub promotion_discount: Price,

    /// Amount payable, never negative
    pub total: Price,
}

impl CartTotals {
    /// Computes totals for `cart`.
    ///
    /// `promotion` is the resolved definition of the cart's applied code; pass `None`
    /// when no code is applied or it could not be resolved.
    pub fn compute(cart: &Cart, delivery: &DeliveryTable, promotion: Option<&Promotion>) -> Self {
        let items = cart.items();
        let subtotal = subtotal(items);
        let delivery_fee = delivery.fee_or_zero(cart.delivery());

        let promotion_discount = match (cart.promotion_code(), promotion) {
            (Some(_), Some(promotion)) => promotion.discount_for(subtotal),
            _ => Price::ZERO,
        };

        Self {
            subtotal,
            item_count: item_count(items),
            savings: total_savings(items),
            delivery_fee,
            promotion_discount,
            total: grand_total(subtotal, promotion_discount, delivery_fee),
        }
    }

    /// Subtotal after the promotion discount, floored at zero.
    pub fn discounted_subtotal(&self) -> Price {
        self.subtotal.saturating_sub(self.promotion_discount)
    }
}
