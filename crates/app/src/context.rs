//! App Context

use std::{path::PathBuf, sync::Arc, time::Duration};

use storefront::{
    checkout::LoyaltyPolicy,
    delivery::{DeliveryError, DeliveryTable},
    promotions::{PromotionBook, PromotionError},
};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    catalog::{
        CatalogClient, CatalogClientConfig, CatalogError, CatalogService, CatalogSource,
        LocalCatalog,
    },
    persistence::CartPersistence,
    promotions::{LocalPromotions, PromotionLookup, PromotionLookupError, RemotePromotions},
    session::CartSession,
    storage::{FileStore, KeyValueStore, MemoryStore, StorageError},
};

/// Where promotion codes are validated.
#[derive(Debug, Clone, Default)]
pub enum PromotionSource {
    /// No promotions; every code is rejected.
    #[default]
    None,

    /// A YAML promotion book.
    File(PathBuf),

    /// The remote validation endpoint.
    Remote {
        /// Base URL
        base_url: String,

        /// Request timeout
        timeout: Duration,
    },
}

/// Everything needed to assemble an [`AppContext`].
#[derive(Debug, Clone, Default)]
pub struct AppSettings {
    /// Directory for the cart records; in-memory when unset.
    pub data_dir: Option<PathBuf>,

    /// Remote catalog; local products only when unset.
    pub catalog: Option<CatalogClientConfig>,

    /// YAML list of local products.
    pub local_products: Option<PathBuf>,

    /// Promotion validation.
    pub promotions: PromotionSource,

    /// YAML delivery fee table; the built-in table when unset.
    pub delivery_table: Option<PathBuf>,

    /// Loyalty earning rate.
    pub loyalty: LoyaltyPolicy,
}

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to open cart storage")]
    Storage(#[source] StorageError),

    #[error("failed to set up catalog")]
    Catalog(#[source] CatalogError),

    #[error("failed to load promotions")]
    Promotions(#[source] PromotionError),

    #[error("failed to set up promotion lookup")]
    PromotionLookup(#[source] PromotionLookupError),

    #[error("failed to load delivery table")]
    Delivery(#[source] DeliveryError),
}

#[derive(Clone)]
pub struct AppContext {
    pub store: Arc<dyn KeyValueStore>,
    pub catalog: Arc<CatalogService>,
    pub promotions: Arc<dyn PromotionLookup>,
    pub delivery: DeliveryTable,
    pub loyalty: LoyaltyPolicy,
}

impl AppContext {
    /// Build application context from settings.
    ///
    /// # Errors
    ///
    /// Returns an error when a data file cannot be read or a client cannot be built.
    pub fn from_settings(settings: AppSettings) -> Result<Self, AppInitError> {
        let store: Arc<dyn KeyValueStore> = match &settings.data_dir {
            Some(dir) => Arc::new(FileStore::open(dir).map_err(AppInitError::Storage)?),
            None => Arc::new(MemoryStore::new()),
        };

        let local = match &settings.local_products {
            Some(path) => LocalCatalog::load(path).map_err(AppInitError::Catalog)?,
            None => LocalCatalog::default(),
        };

        let source: Option<Arc<dyn CatalogSource>> = match settings.catalog {
            Some(config) => Some(Arc::new(
                CatalogClient::new(config).map_err(AppInitError::Catalog)?,
            )),
            None => None,
        };

        let promotions: Arc<dyn PromotionLookup> = match &settings.promotions {
            PromotionSource::None => Arc::new(LocalPromotions::default()),
            PromotionSource::File(path) => Arc::new(LocalPromotions::new(
                PromotionBook::load(path).map_err(AppInitError::Promotions)?,
            )),
            PromotionSource::Remote { base_url, timeout } => Arc::new(
                RemotePromotions::new(base_url, *timeout).map_err(AppInitError::PromotionLookup)?,
            ),
        };

        let delivery = match &settings.delivery_table {
            Some(path) => DeliveryTable::load(path).map_err(AppInitError::Delivery)?,
            None => DeliveryTable::default(),
        };

        info!(
            persistent = settings.data_dir.is_some(),
            remote_catalog = source.is_some(),
            local_products = local.products().len(),
            "app context ready"
        );

        Ok(Self {
            store,
            catalog: Arc::new(CatalogService::new(source, local)),
            promotions,
            delivery,
            loyalty: settings.loyalty,
        })
    }

    /// A cart session over this context, with an empty cart.
    pub fn session(&self) -> CartSession {
        debug!("opening cart session");

        CartSession::new(
            CartPersistence::new(Arc::clone(&self.store)),
            self.delivery.clone(),
            Arc::clone(&self.promotions),
            self.loyalty,
        )
    }
}
