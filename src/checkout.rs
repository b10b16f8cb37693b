//! Checkout
//!
//! Turns a cart and its totals into an order draft ready to hand to the order backend,
//! including loyalty points earned and influencer commission owed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cart::Cart,
    delivery::DeliveryInfo,
    prices::Price,
    pricing::CartTotals,
    promotions::{Promotion, percent_of},
};

/// Errors building an order draft.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    /// Nothing to order.
    #[error("cart is empty")]
    EmptyCart,

    /// No delivery selection.
    #[error("delivery city and neighborhood are required")]
    MissingDelivery,

    /// A customer field is missing or malformed.
    #[error("invalid customer {0}")]
    InvalidCustomer(&'static str),
}

/// Contact and shipping details of the buyer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    /// Full name
    pub name: String,

    /// Email address
    pub email: String,

    /// Phone number
    #[serde(default)]
    pub phone: String,

    /// Street address within the delivery neighborhood
    pub address: String,
}

impl CustomerDetails {
    /// Checks required fields.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidCustomer`] naming the offending field.
    pub fn validate(&self) -> Result<(), CheckoutError> {
        if self.name.trim().is_empty() {
            return Err(CheckoutError::InvalidCustomer("name"));
        }

        let email = self.email.trim();
        let well_formed = email
            .split_once('@')
            .is_some_and(|(user, domain)| !user.is_empty() && domain.contains('.'));

        if !well_formed {
            return Err(CheckoutError::InvalidCustomer("email"));
        }

        if self.address.trim().is_empty() {
            return Err(CheckoutError::InvalidCustomer("address"));
        }

        Ok(())
    }
}

/// Loyalty program earning rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyPolicy {
    /// Spend (in minor units, after discounts, before delivery) that earns one point
    pub spend_per_point: u64,
}

impl Default for LoyaltyPolicy {
    fn default() -> Self {
        Self {
            spend_per_point: 100,
        }
    }
}

impl LoyaltyPolicy {
    /// Points earned on `spend`. A zero rate earns nothing.
    pub fn points_for(&self, spend: Price) -> u64 {
        spend
            .minor_units()
            .checked_div(self.spend_per_point)
            .unwrap_or(0)
    }
}

/// Commission owed to an influencer for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InfluencerCommission {
    /// Influencer handle
    pub handle: String,

    /// Commission rate in percent points
    pub percent: Decimal,

    /// Amount owed
    pub amount: Price,
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    /// Product identifier
    pub product_id: String,

    /// Title at time of order
    pub title: String,

    /// Effective unit price at time of order
    pub unit_price: Price,

    /// Units ordered
    pub quantity: u32,

    /// `unit_price` x `quantity`
    pub line_total: Price,
}

/// Order ready to be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDraft {
    /// Buyer
    pub customer: CustomerDetails,

    /// Delivery selection
    pub delivery: DeliveryInfo,

    /// Ordered lines
    pub lines: Vec<OrderLine>,

    /// Totals at time of order
    pub totals: CartTotals,

    /// Redeemed promotion code
    pub promotion_code: Option<String>,

    /// Commission owed for the redeemed code
    pub influencer_commission: Option<InfluencerCommission>,

    /// Loyalty points earned
    pub loyalty_points: u64,
}

impl OrderDraft {
    /// Builds a draft from the cart.
    ///
    /// `promotion` must be the resolved definition of the cart's applied code.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if the cart is empty, has no delivery selection, or the
    /// customer details are incomplete.
    pub fn from_cart(
        cart: &Cart,
        totals: &CartTotals,
        promotion: Option<&Promotion>,
        customer: CustomerDetails,
        loyalty: LoyaltyPolicy,
    ) -> Result<Self, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let delivery = cart.delivery().cloned().ok_or(CheckoutError::MissingDelivery)?;

        customer.validate()?;

        let lines = cart
            .items()
            .iter()
            .map(|item| OrderLine {
                product_id: item.id.clone(),
                title: item.title.clone(),
                unit_price: item.effective_price(),
                quantity: item.quantity,
                line_total: item.line_total(),
            })
            .collect();

        let promotion = promotion.filter(|_| cart.promotion_code().is_some());
        let spend = totals.discounted_subtotal();

        let influencer_commission = promotion
            .and_then(|promotion| promotion.influencer.as_ref())
            .map(|influencer| InfluencerCommission {
                handle: influencer.handle.clone(),
                percent: influencer.commission_percent,
                amount: percent_of(influencer.commission_percent, spend),
            });

        Ok(Self {
            customer,
            delivery,
            lines,
            totals: *totals,
            promotion_code: promotion.map(|promotion| promotion.code.clone()),
            influencer_commission,
            loyalty_points: loyalty.points_for(spend),
        })
    }
}
