//! Storefront
//!
//! Commerce core of a storefront: a cart state machine, derived totals, promotion codes,
//! delivery fees, persisted-record sanitizing and checkout.

pub mod cart;
pub mod checkout;
pub mod delivery;
pub mod items;
pub mod prelude;
pub mod prices;
pub mod pricing;
pub mod promotions;
pub mod receipt;
pub mod sanitize;
