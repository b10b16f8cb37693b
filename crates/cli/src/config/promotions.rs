//! Promotions Config

use std::{path::PathBuf, time::Duration};

use clap::Args;
use storefront_app::context::PromotionSource;

/// Promotion validation settings.
#[derive(Debug, Args)]
pub struct PromotionsConfig {
    /// YAML promotion book
    #[arg(long, env = "PROMOTIONS_FILE", conflicts_with = "promotions_api_url")]
    pub promotions_file: Option<PathBuf>,

    /// Base URL of the promotion validation API
    #[arg(long, env = "PROMOTIONS_API_URL")]
    pub promotions_api_url: Option<String>,

    /// Promotion validation timeout in seconds
    #[arg(long, env = "PROMOTIONS_TIMEOUT_SECONDS", default_value_t = 10_u64)]
    pub promotions_timeout_seconds: u64,
}

impl PromotionsConfig {
    /// Where codes are validated.
    #[must_use]
    pub fn source(&self) -> PromotionSource {
        if let Some(path) = &self.promotions_file {
            return PromotionSource::File(path.clone());
        }

        match &self.promotions_api_url {
            Some(url) => PromotionSource::Remote {
                base_url: url.clone(),
                timeout: Duration::from_secs(self.promotions_timeout_seconds),
            },
            None => PromotionSource::None,
        }
    }
}
