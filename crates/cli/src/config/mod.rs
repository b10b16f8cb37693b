//! Command line configuration.
//!
//! Every option can also be set through its environment variable or a `.env` file.

use clap::Args;
use storefront::checkout::LoyaltyPolicy;
use storefront_app::context::AppSettings;

use crate::config::{
    catalog::CatalogConfig,
    checkout::CheckoutConfig,
    delivery::DeliveryConfig,
    observability::LoggingConfig,
    promotions::PromotionsConfig,
    storage::StorageConfig,
};

pub(crate) mod catalog;
pub(crate) mod checkout;
pub(crate) mod delivery;
pub(crate) mod observability;
pub(crate) mod promotions;
pub(crate) mod storage;

/// Storefront settings shared by every command.
#[derive(Debug, Args)]
pub struct Settings {
    /// Cart storage settings.
    #[command(flatten)]
    pub storage: StorageConfig,

    /// Product catalog settings.
    #[command(flatten)]
    pub catalog: CatalogConfig,

    /// Promotion validation settings.
    #[command(flatten)]
    pub promotions: PromotionsConfig,

    /// Delivery fee settings.
    #[command(flatten)]
    pub delivery: DeliveryConfig,

    /// Checkout and display settings.
    #[command(flatten)]
    pub checkout: CheckoutConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,
}

impl Settings {
    /// Settings for assembling the app context.
    #[must_use]
    pub fn app_settings(&self) -> AppSettings {
        AppSettings {
            data_dir: self.storage.data_dir(),
            catalog: self.catalog.client_config(),
            local_products: self.catalog.local_products_file.clone(),
            promotions: self.promotions.source(),
            delivery_table: self.delivery.delivery_table_file.clone(),
            loyalty: LoyaltyPolicy {
                spend_per_point: self.checkout.loyalty_spend_per_point,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{path::PathBuf, time::Duration};

    use clap::Parser;
    use storefront_app::context::PromotionSource;
    use testresult::TestResult;

    use super::*;

    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        settings: Settings,
    }

    #[test]
    fn maps_flags_to_app_settings() -> TestResult {
        let cli = TestCli::try_parse_from([
            "storefront",
            "--data-dir",
            "/tmp/cart",
            "--catalog-api-url",
            "https://api.example.com/",
            "--catalog-cooldown-ms",
            "250",
            "--promotions-file",
            "promos.yaml",
            "--loyalty-spend-per-point",
            "50",
        ])?;

        let settings = cli.settings.app_settings();

        assert_eq!(settings.data_dir, Some(PathBuf::from("/tmp/cart")));
        assert_eq!(
            settings.catalog.as_ref().map(|c| c.cooldown),
            Some(Duration::from_millis(250))
        );
        assert!(matches!(settings.promotions, PromotionSource::File(_)));
        assert_eq!(settings.loyalty.spend_per_point, 50);

        Ok(())
    }

    #[test]
    fn in_memory_disables_data_dir() -> TestResult {
        let cli = TestCli::try_parse_from(["storefront", "--in-memory"])?;

        assert_eq!(cli.settings.app_settings().data_dir, None);

        Ok(())
    }

    #[test]
    fn promotion_sources_are_exclusive() {
        let result = TestCli::try_parse_from([
            "storefront",
            "--promotions-file",
            "promos.yaml",
            "--promotions-api-url",
            "https://api.example.com",
        ]);

        assert!(result.is_err());
    }
}
