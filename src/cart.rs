//! Cart
//!
//! The cart is a single immutable snapshot. Every [`CartAction`] maps the current
//! snapshot to a complete new one through [`Cart::reduce`]; nothing is mutated in place.

use jiff::Timestamp;
use rustc_hash::FxHashMap;

use crate::{delivery::DeliveryInfo, items::LineItem};

/// The closed set of cart transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    /// Replace every line item, e.g. when restoring from storage.
    SetItems(Vec<LineItem>),

    /// Add `quantity` units of `item`, merging with an existing line.
    AddItem {
        /// Item to add
        item: LineItem,
        /// Units to add
        quantity: u32,
    },

    /// Remove the line with this product identifier.
    RemoveItem(String),

    /// Set a line's quantity; zero or below removes the line.
    UpdateQuantity {
        /// Product identifier
        id: String,
        /// New quantity
        quantity: i64,
    },

    /// Full reset: items, delivery and promotion.
    Clear,

    /// Replace the delivery selection.
    SetDelivery(Option<DeliveryInfo>),

    /// Attach a promotion code.
    ApplyPromotion(String),

    /// Detach the promotion code.
    RemovePromotion,

    /// Toggle the loading flag.
    SetLoading(bool),

    /// Record or clear the last error.
    SetError(Option<String>),
}

/// Cart snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    items: Vec<LineItem>,
    delivery: Option<DeliveryInfo>,
    promotion_code: Option<String>,
    loading: bool,
    error: Option<String>,
    updated_at: Timestamp,
}

impl Default for Cart {
    fn default() -> Self {
        Self::empty_at(Timestamp::UNIX_EPOCH)
    }
}

impl Cart {
    /// Creates an empty cart stamped with the current time.
    #[must_use]
    pub fn new() -> Self {
        Self::empty_at(Timestamp::now())
    }

    /// Creates an empty cart stamped with `now`.
    #[must_use]
    pub fn empty_at(now: Timestamp) -> Self {
        Self {
            items: Vec::new(),
            delivery: None,
            promotion_code: None,
            loading: false,
            error: None,
            updated_at: now,
        }
    }

    /// Applies `action` using the current time.
    #[must_use]
    pub fn dispatch(&self, action: CartAction) -> Cart {
        self.reduce(action, Timestamp::now())
    }

    /// Returns the snapshot that follows `action`.
    #[must_use]
    pub fn reduce(&self, action: CartAction, now: Timestamp) -> Cart {
        let mut next = self.clone();

        match action {
            CartAction::SetItems(items) => {
                next.items = merge_duplicates(items);
                next.error = None;
            }
            CartAction::AddItem { quantity: 0, .. } => {}
            CartAction::AddItem { item, quantity } => {
                let item = item.trimmed();

                if let Some(line) = next.items.iter_mut().find(|line| line.id == item.id) {
                    line.quantity = line.quantity.saturating_add(quantity);
                } else {
                    next.items.push(item.with_quantity(quantity));
                }
            }
            CartAction::RemoveItem(id) => {
                next.items.retain(|line| line.id != id);
            }
            CartAction::UpdateQuantity { id, quantity } => {
                if quantity <= 0 {
                    next.items.retain(|line| line.id != id);
                } else if let Some(line) = next.items.iter_mut().find(|line| line.id == id) {
                    line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
                }
            }
            CartAction::Clear => {
                next.items.clear();
                next.delivery = None;
                next.promotion_code = None;
            }
            CartAction::SetDelivery(delivery) => {
                next.delivery = delivery;
            }
            CartAction::ApplyPromotion(code) => {
                next.promotion_code = Some(code);
            }
            CartAction::RemovePromotion => {
                next.promotion_code = None;
            }
            CartAction::SetLoading(loading) => {
                next.loading = loading;
            }
            CartAction::SetError(error) => {
                next.error = error;
            }
        }

        next.updated_at = now;
        next
    }

    /// Line items in insertion order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Looks up a line by product identifier.
    pub fn item(&self, id: &str) -> Option<&LineItem> {
        self.items.iter().find(|line| line.id == id)
    }

    /// Delivery selection, if any.
    pub fn delivery(&self) -> Option<&DeliveryInfo> {
        self.delivery.as_ref()
    }

    /// Applied promotion code, if any.
    pub fn promotion_code(&self) -> Option<&str> {
        self.promotion_code.as_deref()
    }

    /// Whether an operation is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Last user-facing error.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// When the snapshot was produced.
    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Collapses lines sharing an identifier into the first occurrence, summing quantities.
pub(crate) fn merge_duplicates(items: Vec<LineItem>) -> Vec<LineItem> {
    let mut positions: FxHashMap<String, usize> = FxHashMap::default();
    let mut merged: Vec<LineItem> = Vec::with_capacity(items.len());

    for item in items {
        if let Some(line) = positions.get(&item.id).and_then(|&idx| merged.get_mut(idx)) {
            line.quantity = line.quantity.saturating_add(item.quantity);
            continue;
        }

        positions.insert(item.id.clone(), merged.len());
        merged.push(item);
    }

    merged
}
