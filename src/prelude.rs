//! Storefront prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{Cart, CartAction},
    checkout::{CheckoutError, CustomerDetails, LoyaltyPolicy, OrderDraft},
    delivery::{DeliveryError, DeliveryInfo, DeliveryTable},
    items::{ItemError, ItemMetadata, LineItem},
    prices::Price,
    pricing::CartTotals,
    promotions::{
        DiscountKind, InfluencerAttribution, Promotion, PromotionBook, PromotionError,
        PromotionRejection,
    },
    receipt::{ReceiptError, write_receipt},
    sanitize::sanitize_items,
};
