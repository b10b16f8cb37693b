//! Product catalog.
//!
//! Listings come from the remote catalog API when it is reachable and fall back to
//! the last good response or to locally configured products when it is not.

use std::io;

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

mod client;
mod local;
mod query;
mod records;
mod service;

pub use client::{CatalogClient, CatalogClientConfig, DEFAULT_COOLDOWN, DEFAULT_TIMEOUT};
pub use local::LocalCatalog;
pub use query::{DEFAULT_PER_PAGE, ProductQuery, SortDirection};
pub use records::{
    CatalogProduct, Category, City, NamedEntry, ProductPage, first_image, to_catalog_product,
};
pub use service::{CatalogService, Listing, ListingOrigin};

/// Errors that can occur when reading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The catalog answered 429 Too Many Requests.
    #[error("catalog rate limit reached")]
    RateLimited,

    /// The catalog returned a non-2xx response.
    #[error("unexpected response from catalog: {0}")]
    UnexpectedResponse(String),

    /// Reading a local catalog file failed.
    #[error("failed to read local catalog")]
    Io(#[from] io::Error),

    /// A local catalog file is malformed.
    #[error("invalid local catalog: {0}")]
    Yaml(#[from] serde_norway::Error),
}

/// A source of catalog listings.
#[automock]
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// One page of products matching `query`.
    async fn products(&self, query: &ProductQuery) -> Result<ProductPage, CatalogError>;

    /// All categories.
    async fn categories(&self) -> Result<Vec<Category>, CatalogError>;

    /// All cities.
    async fn cities(&self) -> Result<Vec<City>, CatalogError>;
}
