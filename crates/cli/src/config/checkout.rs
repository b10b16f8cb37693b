//! Checkout Config

use clap::Args;

/// Checkout and display settings.
#[derive(Debug, Args)]
pub struct CheckoutConfig {
    /// ISO 4217 code used to display amounts
    #[arg(long, env = "STOREFRONT_CURRENCY", default_value = "USD")]
    pub currency: String,

    /// Spend in minor units that earns one loyalty point
    #[arg(long, env = "LOYALTY_SPEND_PER_POINT", default_value_t = 100_u64)]
    pub loyalty_spend_per_point: u64,
}
