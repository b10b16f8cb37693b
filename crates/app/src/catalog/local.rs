//! Locally configured products.

use std::{fs, path::Path};

use rustc_hash::FxHashMap;

use crate::catalog::{
    CatalogError,
    query::{ProductQuery, SortDirection},
    records::{CatalogProduct, NamedEntry, ProductPage},
};

/// Products defined in a local YAML file, merged into remote listings.
#[derive(Debug, Clone, Default)]
pub struct LocalCatalog {
    products: Vec<CatalogProduct>,
}

impl LocalCatalog {
    /// Catalog over `products`. Promotional prices that would not be charged are dropped.
    #[must_use]
    pub fn new(products: Vec<CatalogProduct>) -> Self {
        Self {
            products: products
                .into_iter()
                .map(CatalogProduct::with_valid_promo)
                .collect(),
        }
    }

    /// Parses a YAML list of products.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Yaml`] if the document is malformed.
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        Ok(Self::new(serde_norway::from_str(yaml)?))
    }

    /// Reads a YAML list of products from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        Self::from_yaml(&fs::read_to_string(path)?)
    }

    /// All local products.
    pub fn products(&self) -> &[CatalogProduct] {
        &self.products
    }

    /// Product with the given id.
    pub fn get(&self, id: &str) -> Option<&CatalogProduct> {
        self.products.iter().find(|product| product.id == id)
    }

    /// Products matching the filters of `query`, sorted as requested.
    pub fn matching(&self, query: &ProductQuery) -> Vec<&CatalogProduct> {
        let mut matching: Vec<&CatalogProduct> = self
            .products
            .iter()
            .filter(|product| matches(product, query))
            .collect();

        match query.sort.as_deref().map(str::trim) {
            Some("price") => matching.sort_by_key(|product| product.effective_price()),
            Some("name" | "title") => matching.sort_by_key(|product| product.title.to_lowercase()),
            _ => return matching,
        }

        if query.direction == Some(SortDirection::Desc) {
            matching.reverse();
        }

        matching
    }

    /// The requested page of matching products.
    pub fn page(&self, query: &ProductQuery) -> ProductPage {
        let matching = self.matching(query);
        let per_page = query.per_page_or_default();
        let current_page = query.page_or_first();
        let total = matching.len();
        let skip = usize::try_from(u64::from(current_page - 1) * u64::from(per_page))
            .unwrap_or(usize::MAX);

        let data = matching
            .into_iter()
            .skip(skip)
            .take(usize::try_from(per_page).unwrap_or(usize::MAX))
            .cloned()
            .collect();

        let total = u64::try_from(total).unwrap_or(u64::MAX);

        ProductPage {
            data,
            current_page,
            last_page: u32::try_from(total.div_ceil(u64::from(per_page)))
                .unwrap_or(u32::MAX)
                .max(1),
            total,
            per_page,
        }
    }

    /// Categories derived from local products, in first-seen order.
    pub fn categories(&self) -> Vec<NamedEntry> {
        entries(self.products.iter().map(|product| {
            (
                product.category_id.clone().unwrap_or_else(|| product.category.clone()),
                product.category.as_str(),
            )
        }))
    }

    /// Cities derived from local products, in first-seen order.
    pub fn cities(&self) -> Vec<NamedEntry> {
        entries(self.products.iter().filter_map(|product| {
            product.city.as_deref().map(|city| (city.to_string(), city))
        }))
    }
}

fn entries<'a>(pairs: impl Iterator<Item = (String, &'a str)>) -> Vec<NamedEntry> {
    let mut entries: Vec<NamedEntry> = Vec::new();
    let mut index: FxHashMap<String, usize> = FxHashMap::default();

    for (id, name) in pairs {
        if name.trim().is_empty() {
            continue;
        }

        if let Some(&position) = index.get(&id) {
            if let Some(entry) = entries.get_mut(position) {
                entry.products_count = entry.products_count.map(|count| count + 1);
            }
            continue;
        }

        index.insert(id.clone(), entries.len());
        entries.push(NamedEntry {
            id,
            name: name.to_string(),
            products_count: Some(1),
        });
    }

    entries
}

fn matches(product: &CatalogProduct, query: &ProductQuery) -> bool {
    let filter = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_lowercase)
    };

    let search = filter(&query.search)
        .is_none_or(|search| product.title.to_lowercase().contains(&search));

    let category = filter(&query.category).is_none_or(|category| {
        product.category_id.as_deref().map(str::to_lowercase) == Some(category.clone())
            || product.category.to_lowercase() == category
    });

    let city = filter(&query.city).is_none_or(|city| {
        product.city.as_deref().map(str::to_lowercase) == Some(city)
    });

    search && category && city
}

#[cfg(test)]
mod tests {
    use storefront::prices::Price;
    use testresult::TestResult;

    use super::*;

    const YAML: &str = r"
- id: local-1
  title: Sourdough loaf
  price: 650
  category: Bakery
  category_id: '2'
  city: Central City
- id: local-2
  title: Rye loaf
  price: 700
  promo_price: 500
  category: Bakery
  category_id: '2'
- id: local-3
  title: Olive oil
  price: 1800
  category: Pantry
  city: Central City
";

    #[test]
    fn filters_by_search_and_category() -> TestResult {
        let catalog = LocalCatalog::from_yaml(YAML)?;

        let query = ProductQuery {
            search: Some("LOAF".to_string()),
            category: Some("2".to_string()),
            ..ProductQuery::default()
        };

        let ids: Vec<&str> = catalog.matching(&query).iter().map(|p| p.id.as_str()).collect();

        assert_eq!(ids, ["local-1", "local-2"]);

        Ok(())
    }

    #[test]
    fn promos_that_would_not_be_charged_are_ignored() -> TestResult {
        let catalog = LocalCatalog::from_yaml(
            r"
- id: a
  title: Tea
  price: 400
  promo_price: 0
- id: b
  title: Jam
  price: 300
  promo_price: 900
",
        )?;

        let query = ProductQuery {
            sort: Some("price".to_string()),
            ..ProductQuery::default()
        };

        let listed: Vec<(&str, Price, Option<Price>)> = catalog
            .matching(&query)
            .iter()
            .map(|p| (p.id.as_str(), p.effective_price(), p.promo_price))
            .collect();

        assert_eq!(
            listed,
            [("b", Price::new(300), None), ("a", Price::new(400), None)]
        );

        Ok(())
    }

    #[test]
    fn sorts_by_effective_price_descending() -> TestResult {
        let catalog = LocalCatalog::from_yaml(YAML)?;

        let query = ProductQuery {
            sort: Some("price".to_string()),
            direction: Some(SortDirection::Desc),
            ..ProductQuery::default()
        };

        let prices: Vec<Price> = catalog
            .matching(&query)
            .iter()
            .map(|p| p.effective_price())
            .collect();

        assert_eq!(prices, [Price::new(1800), Price::new(650), Price::new(500)]);

        Ok(())
    }

    #[test]
    fn paginates() -> TestResult {
        let catalog = LocalCatalog::from_yaml(YAML)?;

        let page = catalog.page(&ProductQuery {
            page: Some(2),
            per_page: Some(2),
            ..ProductQuery::default()
        });

        assert_eq!(page.data.len(), 1);
        assert_eq!(page.total, 3);
        assert_eq!(page.last_page, 2);

        Ok(())
    }

    #[test]
    fn derives_categories_and_cities() -> TestResult {
        let catalog = LocalCatalog::from_yaml(YAML)?;

        let categories = catalog.categories();
        let cities = catalog.cities();

        assert_eq!(categories.len(), 2);
        assert_eq!(categories.first().and_then(|c| c.products_count), Some(2));
        assert_eq!(cities.len(), 1);

        Ok(())
    }
}
