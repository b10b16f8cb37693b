//! Catalog Service

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{
    catalog::{
        CatalogError, CatalogSource,
        local::LocalCatalog,
        query::ProductQuery,
        records::{Category, City, ProductPage},
    },
    notice::Notice,
};

const RATE_LIMITED_NOTICE: &str =
    "The catalog is busy right now, showing the last results we have.";
const UNAVAILABLE_NOTICE: &str =
    "The catalog could not be reached, showing the last results we have.";

/// Where a listing came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingOrigin {
    /// Fresh from the remote catalog
    Remote,

    /// The last good remote response for the same request
    Cached,

    /// Locally configured products only
    Local,
}

/// A listing with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing<T> {
    /// Listing data
    pub data: T,

    /// Where the data came from
    pub origin: ListingOrigin,

    /// Set when the remote catalog failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

impl<T> Listing<T> {
    fn remote(data: T) -> Self {
        Self {
            data,
            origin: ListingOrigin::Remote,
            notice: None,
        }
    }
}

#[derive(Debug, Default)]
struct LastGood {
    products: FxHashMap<String, ProductPage>,
    categories: Option<Vec<Category>>,
    cities: Option<Vec<City>>,
}

/// Catalog reads with local merging and fallback on remote failure.
pub struct CatalogService {
    source: Option<Arc<dyn CatalogSource>>,
    local: LocalCatalog,
    last_good: Mutex<LastGood>,
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService")
            .field("remote", &self.source.is_some())
            .field("local", &self.local.products().len())
            .finish_non_exhaustive()
    }
}

impl CatalogService {
    /// Service over an optional remote source and local products.
    #[must_use]
    pub fn new(source: Option<Arc<dyn CatalogSource>>, local: LocalCatalog) -> Self {
        Self {
            source,
            local,
            last_good: Mutex::new(LastGood::default()),
        }
    }

    /// One page of products.
    ///
    /// Local products replace remote ones with the same id, and local products matching
    /// the filters are appended to the first page. When the remote catalog fails, the last
    /// good page for the same query is returned, or the local products alone.
    #[tracing::instrument(name = "catalog.service.products", skip(self))]
    pub async fn products(&self, query: &ProductQuery) -> Listing<ProductPage> {
        let Some(source) = &self.source else {
            return Listing {
                data: self.local.page(query),
                origin: ListingOrigin::Local,
                notice: None,
            };
        };

        let key = query.cache_key();

        match source.products(query).await {
            Ok(page) => {
                let page = self.merge_local(page, query);

                self.last_good.lock().await.products.insert(key, page.clone());

                Listing::remote(page)
            }
            Err(error) => {
                let notice = fallback_notice(&error);
                let cached = self.last_good.lock().await.products.get(&key).cloned();

                match cached {
                    Some(page) => Listing {
                        data: page,
                        origin: ListingOrigin::Cached,
                        notice: Some(notice),
                    },
                    None => Listing {
                        data: self.local.page(query),
                        origin: ListingOrigin::Local,
                        notice: Some(notice),
                    },
                }
            }
        }
    }

    /// All categories, with the same fallback as [`Self::products`].
    #[tracing::instrument(name = "catalog.service.categories", skip(self))]
    pub async fn categories(&self) -> Listing<Vec<Category>> {
        let result = match &self.source {
            Some(source) => Some(source.categories().await),
            None => None,
        };

        let mut last_good = self.last_good.lock().await;

        fallback(
            result,
            &mut last_good.categories,
            || self.local.categories(),
        )
    }

    /// All cities, with the same fallback as [`Self::products`].
    #[tracing::instrument(name = "catalog.service.cities", skip(self))]
    pub async fn cities(&self) -> Listing<Vec<City>> {
        let result = match &self.source {
            Some(source) => Some(source.cities().await),
            None => None,
        };

        let mut last_good = self.last_good.lock().await;

        fallback(result, &mut last_good.cities, || self.local.cities())
    }

    /// Local products.
    pub fn local(&self) -> &LocalCatalog {
        &self.local
    }

    fn merge_local(&self, page: ProductPage, query: &ProductQuery) -> ProductPage {
        let mut data: Vec<_> = page
            .data
            .into_iter()
            .map(|product| self.local.get(&product.id).cloned().unwrap_or(product))
            .collect();

        let mut total = page.total;

        if query.page_or_first() == 1 {
            let extra: Vec<_> = self
                .local
                .matching(query)
                .into_iter()
                .filter(|local| !data.iter().any(|product| product.id == local.id))
                .cloned()
                .collect();

            if !extra.is_empty() {
                info!(count = extra.len(), "merged local products into listing");
            }

            total = total.saturating_add(u64::try_from(extra.len()).unwrap_or(u64::MAX));
            data.extend(extra);
        }

        ProductPage {
            data,
            total,
            ..page
        }
    }
}

fn fallback<T: Clone>(
    result: Option<Result<Vec<T>, CatalogError>>,
    last_good: &mut Option<Vec<T>>,
    local: impl FnOnce() -> Vec<T>,
) -> Listing<Vec<T>> {
    match result {
        None => Listing {
            data: local(),
            origin: ListingOrigin::Local,
            notice: None,
        },
        Some(Ok(data)) => {
            *last_good = Some(data.clone());

            Listing::remote(data)
        }
        Some(Err(error)) => {
            let notice = Some(fallback_notice(&error));

            match last_good {
                Some(data) => Listing {
                    data: data.clone(),
                    origin: ListingOrigin::Cached,
                    notice,
                },
                None => Listing {
                    data: local(),
                    origin: ListingOrigin::Local,
                    notice,
                },
            }
        }
    }
}

fn fallback_notice(error: &CatalogError) -> Notice {
    if matches!(error, CatalogError::RateLimited) {
        warn!("catalog rate limited, falling back");

        Notice::warning(RATE_LIMITED_NOTICE)
    } else {
        warn!(%error, "catalog request failed, falling back");

        Notice::warning(UNAVAILABLE_NOTICE)
    }
}

#[cfg(test)]
mod tests {
    use mockall::Sequence;
    use storefront::prices::Price;

    use crate::catalog::{MockCatalogSource, records::CatalogProduct};

    use super::*;

    fn product(id: &str, title: &str, price: u64) -> CatalogProduct {
        CatalogProduct {
            id: id.to_string(),
            title: title.to_string(),
            price: Price::new(price),
            promo_price: None,
            image: String::new(),
            category: "Pantry".to_string(),
            category_id: Some("1".to_string()),
            city: None,
            stock: 0,
            metadata: storefront::items::ItemMetadata::default(),
        }
    }

    fn remote_page() -> ProductPage {
        ProductPage {
            data: vec![product("1", "Rice", 1500), product("2", "Beans", 900)],
            current_page: 1,
            last_page: 1,
            total: 2,
            per_page: 20,
        }
    }

    fn local() -> LocalCatalog {
        LocalCatalog::new(vec![
            product("2", "Black beans (local)", 850),
            product("local-1", "Honey", 1200),
        ])
    }

    #[tokio::test]
    async fn merges_local_products_into_first_page() {
        let mut source = MockCatalogSource::new();

        source
            .expect_products()
            .times(1)
            .returning(|_| Ok(remote_page()));

        let service = CatalogService::new(Some(Arc::new(source)), local());

        let listing = service.products(&ProductQuery::default()).await;

        let titles: Vec<&str> = listing.data.data.iter().map(|p| p.title.as_str()).collect();

        assert_eq!(listing.origin, ListingOrigin::Remote);
        assert_eq!(titles, ["Rice", "Black beans (local)", "Honey"]);
        assert_eq!(listing.data.total, 3);
    }

    #[tokio::test]
    async fn later_pages_are_not_padded() {
        let mut source = MockCatalogSource::new();

        source.expect_products().returning(|_| {
            Ok(ProductPage {
                current_page: 2,
                ..remote_page()
            })
        });

        let service = CatalogService::new(Some(Arc::new(source)), local());

        let listing = service
            .products(&ProductQuery {
                page: Some(2),
                ..ProductQuery::default()
            })
            .await;

        assert_eq!(listing.data.data.len(), 2);
    }

    #[tokio::test]
    async fn rate_limit_serves_last_good_page() {
        let mut source = MockCatalogSource::new();
        let mut seq = Sequence::new();

        source
            .expect_products()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(remote_page()));

        source
            .expect_products()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(CatalogError::RateLimited));

        let service = CatalogService::new(Some(Arc::new(source)), LocalCatalog::default());
        let query = ProductQuery::default();

        let first = service.products(&query).await;
        let second = service.products(&query).await;

        assert_eq!(second.origin, ListingOrigin::Cached);
        assert_eq!(second.data, first.data);
        assert_eq!(
            second.notice.map(|notice| notice.message),
            Some(RATE_LIMITED_NOTICE.to_string())
        );
    }

    #[tokio::test]
    async fn failure_without_cache_serves_local_products() {
        let mut source = MockCatalogSource::new();

        source
            .expect_products()
            .returning(|_| Err(CatalogError::UnexpectedResponse("503".to_string())));

        let service = CatalogService::new(Some(Arc::new(source)), local());

        let listing = service.products(&ProductQuery::default()).await;

        assert_eq!(listing.origin, ListingOrigin::Local);
        assert_eq!(listing.data.data.len(), 2);
        assert!(listing.notice.is_some());
    }

    #[tokio::test]
    async fn without_remote_only_local_is_used() {
        let service = CatalogService::new(None, local());

        let listing = service.categories().await;

        assert_eq!(listing.origin, ListingOrigin::Local);
        assert_eq!(listing.data.len(), 1);
        assert!(listing.notice.is_none());
    }

    #[tokio::test]
    async fn cities_fall_back_to_cached_list() {
        let mut source = MockCatalogSource::new();
        let mut seq = Sequence::new();

        source
            .expect_cities()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| {
                Ok(vec![City {
                    id: "1".to_string(),
                    name: "Central City".to_string(),
                    products_count: None,
                }])
            });

        source
            .expect_cities()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(CatalogError::RateLimited));

        let service = CatalogService::new(Some(Arc::new(source)), LocalCatalog::default());

        service.cities().await;
        let listing = service.cities().await;

        assert_eq!(listing.origin, ListingOrigin::Cached);
        assert_eq!(listing.data.len(), 1);
    }
}
