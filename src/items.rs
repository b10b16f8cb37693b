//! Items

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::prices::Price;

/// Reasons a line item cannot enter the cart.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ItemError {
    /// The product identifier is blank.
    #[error("item is missing an identifier")]
    MissingId,

    /// The product title is blank.
    #[error("item {0} is missing a title")]
    MissingTitle(String),

    /// The list price is zero.
    #[error("item {0} has no price")]
    MissingPrice(String),
}

/// Merchandising flags and provenance attached to a line item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemMetadata {
    /// Shown with a "featured" badge
    pub featured: bool,

    /// Shown with a "new" badge
    pub new_arrival: bool,

    /// Shown with a "best seller" badge
    pub best_seller: bool,

    /// Ships without a delivery charge
    pub free_shipping: bool,

    /// Supplier name, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,

    /// Location the item ships from, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// One product entry in the cart with a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Product identifier, unique within a cart
    pub id: String,

    /// Display title
    pub title: String,

    /// List price per unit
    pub price: Price,

    /// Promotional price per unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promo_price: Option<Price>,

    /// Units in the cart, at least one while present
    pub quantity: u32,

    /// Image URL
    #[serde(default)]
    pub image: String,

    /// Category name
    #[serde(default)]
    pub category: String,

    /// Stock hint; zero means unknown
    #[serde(default)]
    pub stock: u32,

    /// Badges and provenance
    #[serde(default)]
    pub metadata: ItemMetadata,
}

impl LineItem {
    /// Creates a line item with a single unit and no optional data.
    pub fn new(id: impl Into<String>, title: impl Into<String>, price: Price) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            price,
            promo_price: None,
            quantity: 1,
            image: String::new(),
            category: String::new(),
            stock: 0,
            metadata: ItemMetadata::default(),
        }
    }

    /// Sets the promotional price.
    #[must_use]
    pub fn with_promo_price(mut self, promo_price: Price) -> Self {
        self.promo_price = Some(promo_price);
        self
    }

    /// Sets the quantity.
    #[must_use]
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Sets the stock hint.
    #[must_use]
    pub fn with_stock(mut self, stock: u32) -> Self {
        self.stock = stock;
        self
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Strips surrounding whitespace from the identifier and title.
    ///
    /// Lines are matched by identifier, so items are trimmed before they enter a cart, the
    /// same way persisted records are trimmed when they are read back.
    #[must_use]
    pub fn trimmed(mut self) -> Self {
        let id = self.id.trim();

        if id.len() != self.id.len() {
            self.id = id.to_string();
        }

        let title = self.title.trim();

        if title.len() != self.title.len() {
            self.title = title.to_string();
        }

        self
    }

    /// Price actually charged per unit.
    ///
    /// The promotional price wins only when it is positive and below the list price.
    pub fn effective_price(&self) -> Price {
        match self.promo_price {
            Some(promo) if !promo.is_zero() && promo < self.price => promo,
            _ => self.price,
        }
    }

    /// Effective price multiplied by quantity.
    pub fn line_total(&self) -> Price {
        self.effective_price().times(self.quantity)
    }

    /// Amount saved on this line compared to list price.
    pub fn line_savings(&self) -> Price {
        self.price
            .saturating_sub(self.effective_price())
            .times(self.quantity)
    }

    /// Whether the promotional price is in effect.
    pub fn is_discounted(&self) -> bool {
        self.effective_price() < self.price
    }

    /// Checks the fields the cart relies on.
    ///
    /// # Errors
    ///
    /// Returns an [`ItemError`] naming the first missing field.
    pub fn validate(&self) -> Result<(), ItemError> {
        if self.id.trim().is_empty() {
            return Err(ItemError::MissingId);
        }

        if self.title.trim().is_empty() {
            return Err(ItemError::MissingTitle(self.id.clone()));
        }

        if self.price.is_zero() {
            return Err(ItemError::MissingPrice(self.id.clone()));
        }

        Ok(())
    }
}
