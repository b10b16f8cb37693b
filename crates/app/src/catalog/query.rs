//! Product listing filters.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending
    #[default]
    Asc,

    /// Descending
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => f.write_str("asc"),
            Self::Desc => f.write_str("desc"),
        }
    }
}

/// Filters for a product listing request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    /// Free text search
    pub search: Option<String>,

    /// Category identifier
    pub category: Option<String>,

    /// City identifier
    pub city: Option<String>,

    /// Sort field, e.g. `price` or `name`
    pub sort: Option<String>,

    /// Sort direction
    pub direction: Option<SortDirection>,

    /// One-based page number
    pub page: Option<u32>,

    /// Page size
    pub per_page: Option<u32>,
}

/// Page size used when none is requested.
pub const DEFAULT_PER_PAGE: u32 = 20;

impl ProductQuery {
    /// Query parameters in wire order; absent and blank filters are omitted.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let text = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        [
            ("search", text(&self.search)),
            ("category", text(&self.category)),
            ("city", text(&self.city)),
            ("sort", text(&self.sort)),
            ("direction", self.direction.map(|d| d.to_string())),
            ("page", self.page.map(|p| p.to_string())),
            ("per_page", self.per_page.map(|p| p.to_string())),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|value| (name, value)))
        .collect()
    }

    /// Stable key identifying this query in caches.
    pub fn cache_key(&self) -> String {
        self.to_pairs()
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Requested page, defaulting to the first.
    pub fn page_or_first(&self) -> u32 {
        self.page.filter(|page| *page > 0).unwrap_or(1)
    }

    /// Requested page size, defaulting to [`DEFAULT_PER_PAGE`].
    pub fn per_page_or_default(&self) -> u32 {
        self.per_page
            .filter(|per_page| *per_page > 0)
            .unwrap_or(DEFAULT_PER_PAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omits_absent_and_blank_filters() {
        let query = ProductQuery {
            search: Some("  ".to_string()),
            category: Some("7".to_string()),
            page: Some(2),
            ..ProductQuery::default()
        };

        assert_eq!(
            query.to_pairs(),
            [("category", "7".to_string()), ("page", "2".to_string())]
        );
    }

    #[test]
    fn renders_every_filter_in_order() {
        let query = ProductQuery {
            search: Some("rice".to_string()),
            category: Some("3".to_string()),
            city: Some("1".to_string()),
            sort: Some("price".to_string()),
            direction: Some(SortDirection::Desc),
            page: Some(1),
            per_page: Some(12),
        };

        assert_eq!(
            query.cache_key(),
            "search=rice&category=3&city=1&sort=price&direction=desc&page=1&per_page=12"
        );
    }

    #[test]
    fn defaults_page_and_size() {
        let query = ProductQuery {
            page: Some(0),
            ..ProductQuery::default()
        };

        assert_eq!(query.page_or_first(), 1);
        assert_eq!(query.per_page_or_default(), DEFAULT_PER_PAGE);
    }
}
