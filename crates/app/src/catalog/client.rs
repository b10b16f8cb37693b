//! Catalog HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tokio::{
    sync::Mutex,
    time::{Instant, sleep},
};
use tracing::debug;

use crate::catalog::{
    CatalogError, CatalogSource,
    query::ProductQuery,
    records::{Category, City, ProductPage, RawProductPage},
};

/// Minimum gap between two catalog requests when none is configured.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(1000);

/// Request timeout when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for the catalog API.
#[derive(Debug, Clone)]
pub struct CatalogClientConfig {
    /// Base URL, e.g. `"https://api.example.com"`.
    pub base_url: String,

    /// Minimum gap between consecutive requests.
    pub cooldown: Duration,

    /// Per-request timeout.
    pub timeout: Duration,
}

impl CatalogClientConfig {
    /// Config for `base_url` with default cooldown and timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            cooldown: DEFAULT_COOLDOWN,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// HTTP client for the product catalog that spaces out its requests.
#[derive(Debug)]
pub struct CatalogClient {
    base_url: String,
    cooldown: Duration,
    http: Client,
    last_request: Mutex<Option<Instant>>,
}

impl CatalogClient {
    /// Create a client from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: CatalogClientConfig) -> Result<Self, CatalogError> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cooldown: config.cooldown,
            http,
            last_request: Mutex::new(None),
        })
    }

    /// Waits until the cooldown since the previous request has passed.
    ///
    /// The lock is held while sleeping so concurrent callers queue up behind each other.
    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();

            if elapsed < self.cooldown {
                let wait = self.cooldown.saturating_sub(elapsed);

                debug!(wait_ms = wait.as_millis(), "catalog cooldown");

                sleep(wait).await;
            }
        }

        *last = Some(Instant::now());
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<T, CatalogError> {
        self.throttle().await;

        let url = format!("{}{path}", self.base_url);

        let response = self.http.get(&url).query(query).send().await?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(CatalogError::RateLimited);
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();

            return Err(CatalogError::UnexpectedResponse(format!(
                "GET {path} failed with status {status}: {text}"
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl CatalogSource for CatalogClient {
    #[tracing::instrument(name = "catalog.client.products", skip(self), err)]
    async fn products(&self, query: &ProductQuery) -> Result<ProductPage, CatalogError> {
        let raw: RawProductPage = self.get_json("/products", &query.to_pairs()).await?;

        Ok(raw.into())
    }

    #[tracing::instrument(name = "catalog.client.categories", skip(self), err)]
    async fn categories(&self) -> Result<Vec<Category>, CatalogError> {
        self.get_json("/categories", &[]).await
    }

    #[tracing::instrument(name = "catalog.client.cities", skip(self), err)]
    async fn cities(&self) -> Result<Vec<City>, CatalogError> {
        self.get_json("/cities", &[]).await
    }
}
