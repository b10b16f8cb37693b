//! Catalog Config

use std::{path::PathBuf, time::Duration};

use clap::Args;
use storefront_app::catalog::CatalogClientConfig;

/// Product catalog settings.
#[derive(Debug, Args)]
pub struct CatalogConfig {
    /// Base URL of the product API; local products only when unset
    #[arg(long, env = "CATALOG_API_URL")]
    pub catalog_api_url: Option<String>,

    /// Minimum gap between catalog requests in milliseconds
    #[arg(long, env = "CATALOG_COOLDOWN_MS", default_value_t = 1_000_u64)]
    pub catalog_cooldown_ms: u64,

    /// Catalog request timeout in seconds
    #[arg(long, env = "CATALOG_TIMEOUT_SECONDS", default_value_t = 10_u64)]
    pub catalog_timeout_seconds: u64,

    /// YAML list of products merged into catalog listings
    #[arg(long, env = "LOCAL_PRODUCTS_FILE")]
    pub local_products_file: Option<PathBuf>,
}

impl CatalogConfig {
    /// Client settings, when a catalog URL is configured.
    #[must_use]
    pub fn client_config(&self) -> Option<CatalogClientConfig> {
        self.catalog_api_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(|url| CatalogClientConfig {
                base_url: url.to_string(),
                cooldown: Duration::from_millis(self.catalog_cooldown_ms),
                timeout: Duration::from_secs(self.catalog_timeout_seconds),
            })
    }
}
