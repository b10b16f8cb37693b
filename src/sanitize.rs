//! Sanitize
//!
//! Defensive pass over persisted cart records. Malformed entries are dropped, loosely
//! typed fields are coerced, and duplicate identifiers are merged.

use serde_json::{Map, Value};

use crate::{
    cart::merge_duplicates,
    items::{ItemMetadata, LineItem},
    prices::Price,
};

/// Sanitizes a persisted item array.
///
/// Anything other than an array yields an empty list. Entries without an identifier or
/// title, or with a non-positive price or quantity, are dropped.
pub fn sanitize_items(value: &Value) -> Vec<LineItem> {
    let Some(entries) = value.as_array() else {
        return Vec::new();
    };

    merge_duplicates(entries.iter().filter_map(sanitize_item).collect())
}

/// Sanitizes a single entry, returning `None` if it must be dropped.
pub fn sanitize_item(value: &Value) -> Option<LineItem> {
    let record = value.as_object()?;

    let id = coerce_id(record.get("id")?)?;
    let title = non_blank(record.get("title"))?;
    let price = coerce_amount(record.get("price")?).filter(|price| !price.is_zero())?;
    let quantity = coerce_quantity(record.get("quantity")?)?;

    let promo_price = first_field(record, &["promoPrice", "promo_price"])
        .and_then(coerce_amount)
        .filter(|promo| !promo.is_zero());

    let stock = record
        .get("stock")
        .and_then(coerce_number)
        .filter(|stock| *stock > 0.0)
        .map_or(0, |stock| clamp_u32(stock.trunc()));

    Some(LineItem {
        id,
        title,
        price,
        promo_price,
        quantity,
        image: text(record.get("image")),
        category: text(record.get("category")),
        stock,
        metadata: record
            .get("metadata")
            .and_then(Value::as_object)
            .map(sanitize_metadata)
            .unwrap_or_default(),
    })
}

fn sanitize_metadata(record: &Map<String, Value>) -> ItemMetadata {
    ItemMetadata {
        featured: flag(record, &["featured", "isFeatured"]),
        new_arrival: flag(record, &["newArrival", "isNew"]),
        best_seller: flag(record, &["bestSeller", "isBestSeller"]),
        free_shipping: flag(record, &["freeShipping"]),
        supplier: non_blank(record.get("supplier")),
        location: non_blank(record.get("location")),
    }
}

fn first_field<'a>(record: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| record.get(*key).filter(|v| !v.is_null()))
}

fn coerce_id(value: &Value) -> Option<String> {
    match value {
        Value::String(id) => Some(id.trim().to_string()).filter(|id| !id.is_empty()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    number.is_finite().then_some(number)
}

/// Parses an amount in minor units; fractional amounts are rounded.
pub fn coerce_amount(value: &Value) -> Option<Price> {
    if let Some(amount) = value.as_u64() {
        return Some(Price::new(amount));
    }

    let amount = coerce_number(value)?.round();

    if amount < 0.0 {
        return None;
    }

    Some(Price::new(clamp_u64(amount)))
}

fn coerce_quantity(value: &Value) -> Option<u32> {
    let quantity = coerce_number(value)?.trunc();

    (quantity >= 1.0).then(|| clamp_u32(quantity))
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "callers pass finite, non-negative, integral values; `as` saturates"
)]
fn clamp_u64(value: f64) -> u64 {
    value as u64
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "callers pass finite, non-negative, integral values; `as` saturates"
)]
fn clamp_u32(value: f64) -> u32 {
    value as u32
}

fn flag(record: &Map<String, Value>, keys: &[&str]) -> bool {
    match first_field(record, keys) {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(text)) => matches!(text.trim(), "true" | "1" | "yes"),
        _ => false,
    }
}

fn non_blank(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    }
}
