//! Remote catalog records.
//!
//! The product API returns loosely shaped records: images may live in any of a dozen
//! fields, ids may be numbers or strings, and prices may arrive as strings. Everything is
//! normalized into [`CatalogProduct`] here.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use storefront::{
    items::{ItemMetadata, LineItem},
    prices::Price,
    sanitize::coerce_amount,
};

/// Product shape used by listing pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
    /// Product identifier
    pub id: String,

    /// Display title
    pub title: String,

    /// List price
    pub price: Price,

    /// Promotional price, only when below list price
    #[serde(default)]
    pub promo_price: Option<Price>,

    /// First available image
    #[serde(default)]
    pub image: String,

    /// Category name
    #[serde(default)]
    pub category: String,

    /// Category identifier
    #[serde(default)]
    pub category_id: Option<String>,

    /// City the product is sold in
    #[serde(default)]
    pub city: Option<String>,

    /// Units in stock; zero means unknown
    #[serde(default)]
    pub stock: u32,

    /// Badges and provenance
    #[serde(default)]
    pub metadata: ItemMetadata,
}

impl CatalogProduct {
    /// Builds a single-unit cart line for this product.
    pub fn to_line_item(&self) -> LineItem {
        LineItem {
            id: self.id.clone(),
            title: self.title.clone(),
            price: self.price,
            promo_price: self.promo_price,
            quantity: 1,
            image: self.image.clone(),
            category: self.category.clone(),
            stock: self.stock,
            metadata: self.metadata.clone(),
        }
    }

    /// Effective price per unit; the promotional price counts only when it is positive
    /// and below the list price.
    pub fn effective_price(&self) -> Price {
        match self.promo_price {
            Some(promo) if !promo.is_zero() && promo < self.price => promo,
            _ => self.price,
        }
    }

    /// Drops a promotional price that would not be charged.
    #[must_use]
    pub fn with_valid_promo(mut self) -> Self {
        self.promo_price = self
            .promo_price
            .filter(|promo| !promo.is_zero() && *promo < self.price);
        self
    }
}

/// Paginated product listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProductPage {
    /// Products on this page
    pub data: Vec<CatalogProduct>,

    /// One-based page number
    pub current_page: u32,

    /// Last page number
    pub last_page: u32,

    /// Products across all pages
    pub total: u64,

    /// Page size
    pub per_page: u32,
}

/// Wire form of a listing page before records are normalized.
#[derive(Debug, Deserialize)]
pub(crate) struct RawProductPage {
    #[serde(default)]
    data: Vec<Value>,
    #[serde(default = "first_page")]
    current_page: u32,
    #[serde(default = "first_page")]
    last_page: u32,
    #[serde(default)]
    total: u64,
    #[serde(default)]
    per_page: u32,
}

fn first_page() -> u32 {
    1
}

impl From<RawProductPage> for ProductPage {
    fn from(raw: RawProductPage) -> Self {
        let data: Vec<CatalogProduct> = raw.data.iter().filter_map(to_catalog_product).collect();

        Self {
            data,
            current_page: raw.current_page,
            last_page: raw.last_page.max(raw.current_page),
            total: raw.total,
            per_page: raw.per_page,
        }
    }
}

/// A category or city entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedEntry {
    /// Identifier
    #[serde(deserialize_with = "id_string")]
    pub id: String,

    /// Display name
    pub name: String,

    /// Number of products, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub products_count: Option<u64>,
}

/// Product category.
pub type Category = NamedEntry;

/// City served by the store.
pub type City = NamedEntry;

fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

const IMAGE_FIELDS: &[&str] = &[
    "image",
    "image_url",
    "imageUrl",
    "thumbnail",
    "thumbnail_url",
    "photo",
    "picture",
    "cover",
    "main_image",
    "images",
    "gallery",
    "media",
    "photos",
];

const PROMO_FIELDS: &[&str] = &[
    "promo_price",
    "promoPrice",
    "sale_price",
    "offer_price",
    "discount_price",
];

/// Normalizes one remote record; records without id, title or a positive price are dropped.
pub fn to_catalog_product(value: &Value) -> Option<CatalogProduct> {
    let record = value.as_object()?;

    let id = first(record, &["id", "product_id", "sku"]).and_then(id_text)?;
    let title = first(record, &["name", "title", "product_name"]).and_then(non_blank)?;
    let price = first(record, &["price", "regular_price", "list_price"])
        .and_then(coerce_amount)
        .filter(|price| !price.is_zero())?;

    let promo_price = PROMO_FIELDS
        .iter()
        .filter_map(|key| record.get(*key))
        .find_map(coerce_amount)
        .filter(|promo| !promo.is_zero() && *promo < price);

    let category = record.get("category");

    let metadata = ItemMetadata {
        featured: flag(record, &["featured", "is_featured"]),
        new_arrival: flag(record, &["is_new", "new"]),
        best_seller: flag(record, &["best_seller", "is_best_seller"]),
        free_shipping: flag(record, &["free_shipping"]),
        supplier: first(record, &["supplier", "vendor"]).and_then(name_of),
        location: first(record, &["city", "city_name", "location"]).and_then(name_of),
    };

    Some(CatalogProduct {
        id,
        title,
        price,
        promo_price,
        image: first_image(record).unwrap_or_default(),
        category: category
            .and_then(name_of)
            .or_else(|| record.get("category_name").and_then(name_of))
            .unwrap_or_default(),
        category_id: category
            .and_then(|c| c.get("id"))
            .or_else(|| record.get("category_id"))
            .and_then(id_text),
        city: metadata.location.clone(),
        stock: first(record, &["stock", "stock_quantity", "quantity"])
            .and_then(coerce_amount)
            .map_or(0, |stock| u32::try_from(stock.minor_units()).unwrap_or(u32::MAX)),
        metadata,
    })
}

/// First usable image URL across the known image fields.
pub fn first_image(record: &Map<String, Value>) -> Option<String> {
    IMAGE_FIELDS
        .iter()
        .filter_map(|key| record.get(*key))
        .find_map(image_url)
}

fn image_url(value: &Value) -> Option<String> {
    match value {
        Value::String(url) => non_blank(value).filter(|_| !url.is_empty()),
        Value::Object(object) => ["url", "src", "original", "path"]
            .iter()
            .filter_map(|key| object.get(*key))
            .find_map(image_url),
        Value::Array(values) => values.iter().find_map(image_url),
        _ => None,
    }
}

fn first<'a>(record: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find(|value| !value.is_null())
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(id) => Some(id.to_string()),
        _ => non_blank(value),
    }
}

fn non_blank(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn name_of(value: &Value) -> Option<String> {
    match value {
        Value::Object(object) => object.get("name").and_then(non_blank),
        _ => non_blank(value),
    }
}

fn flag(record: &Map<String, Value>, keys: &[&str]) -> bool {
    match first(record, keys) {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_u64().is_some_and(|n| n != 0),
        Some(Value::String(text)) => matches!(text.trim(), "1" | "true" | "yes"),
        _ => false,
    }
}
