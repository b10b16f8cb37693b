//! Cart persistence.
//!
//! Writes the cart through to a [`KeyValueStore`] after every change and restores it on
//! startup. Failures never surface to the caller: unreadable data is dropped and the key
//! cleared, and writes that keep failing are abandoned after a few attempts.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use storefront::{cart::Cart, delivery::DeliveryInfo, items::LineItem, sanitize::sanitize_items};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::storage::{KeyValueStore, StorageError};

/// Key holding the JSON array of line items.
pub const ITEMS_KEY: &str = "storefront.cart.items";

/// Key holding delivery selection and promotion code.
pub const CONTEXT_KEY: &str = "storefront.cart.context";

/// Key used by the previous storage format; deleted on load.
pub const LEGACY_KEY: &str = "cart";

/// Total write attempts before giving up.
pub const MAX_WRITE_ATTEMPTS: usize = 3;

/// Errors from a single persistence attempt.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Serializing or parsing the record failed.
    #[error("invalid cart record: {0}")]
    Json(#[from] serde_json::Error),

    /// The store refused the operation.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The record parsed but is not the expected shape.
    #[error("cart record has an unexpected shape")]
    UnexpectedShape,
}

/// Delivery selection and promotion code, persisted alongside the items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CartContext {
    /// Delivery selection
    pub delivery: Option<DeliveryInfo>,

    /// Applied promotion code
    pub promotion_code: Option<String>,
}

impl CartContext {
    /// Extracts the persisted context of a cart.
    pub fn of(cart: &Cart) -> Self {
        Self {
            delivery: cart.delivery().cloned(),
            promotion_code: cart.promotion_code().map(str::to_string),
        }
    }
}

/// What was restored from storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoredCart {
    /// Sanitized items
    pub items: Vec<LineItem>,

    /// Delivery and promotion
    pub context: CartContext,
}

/// Result of a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing changed since the last write.
    Unchanged,

    /// At least one record was written.
    Written,

    /// A record could not be written after every attempt.
    Failed,
}

/// Writes cart records through to a store with a dirty check.
#[derive(Clone)]
pub struct CartPersistence {
    store: Arc<dyn KeyValueStore>,
    last_items: Option<String>,
    last_context: Option<String>,
}

impl std::fmt::Debug for CartPersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartPersistence")
            .field("last_items", &self.last_items)
            .field("last_context", &self.last_context)
            .finish_non_exhaustive()
    }
}

impl CartPersistence {
    /// Creates a persistence adapter over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            last_items: None,
            last_context: None,
        }
    }

    /// Restores the cart, dropping anything unreadable.
    pub fn load(&mut self) -> RestoredCart {
        if let Err(error) = self.store.remove(LEGACY_KEY) {
            warn!(%error, key = LEGACY_KEY, "failed to remove legacy cart record");
        }

        let items = match self.read(ITEMS_KEY) {
            Ok(Some((raw, value))) if value.is_array() => {
                let items = sanitize_items(&value);
                self.last_items = Some(raw);
                items
            }
            Ok(Some(_)) => {
                self.discard(ITEMS_KEY, &PersistenceError::UnexpectedShape);
                Vec::new()
            }
            Ok(None) => Vec::new(),
            Err(error) => {
                self.discard(ITEMS_KEY, &error);
                Vec::new()
            }
        };

        let context = match self.read(CONTEXT_KEY) {
            Ok(Some((raw, value))) => match serde_json::from_value::<CartContext>(value) {
                Ok(context) => {
                    self.last_context = Some(raw);
                    context
                }
                Err(error) => {
                    self.discard(CONTEXT_KEY, &PersistenceError::from(error));
                    CartContext::default()
                }
            },
            Ok(None) => CartContext::default(),
            Err(error) => {
                self.discard(CONTEXT_KEY, &error);
                CartContext::default()
            }
        };

        debug!(items = items.len(), "restored cart");

        RestoredCart { items, context }
    }

    /// Writes whichever records changed since the last successful write.
    pub fn save(&mut self, cart: &Cart) -> SaveOutcome {
        let items = serde_json::to_string(cart.items());
        let context = serde_json::to_string(&CartContext::of(cart));

        let (items, context) = match (items, context) {
            (Ok(items), Ok(context)) => (items, context),
            (Err(error), _) | (_, Err(error)) => {
                error!(%error, "failed to serialize cart");
                return SaveOutcome::Failed;
            }
        };

        let store = Arc::clone(&self.store);
        let outcomes = [
            write_if_changed(store.as_ref(), ITEMS_KEY, items, &mut self.last_items),
            write_if_changed(store.as_ref(), CONTEXT_KEY, context, &mut self.last_context),
        ];

        if outcomes.contains(&SaveOutcome::Failed) {
            SaveOutcome::Failed
        } else if outcomes.contains(&SaveOutcome::Written) {
            SaveOutcome::Written
        } else {
            SaveOutcome::Unchanged
        }
    }

    fn read(&self, key: &str) -> Result<Option<(String, Value)>, PersistenceError> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };

        let value = serde_json::from_str(&raw)?;

        Ok(Some((raw, value)))
    }

    fn discard(&self, key: &str, reason: &PersistenceError) {
        warn!(key, %reason, "discarding unreadable cart record");

        if let Err(error) = self.store.remove(key) {
            warn!(key, %error, "failed to clear unreadable cart record");
        }
    }
}

fn write_if_changed(
    store: &dyn KeyValueStore,
    key: &str,
    serialized: String,
    last: &mut Option<String>,
) -> SaveOutcome {
    if last.as_deref() == Some(serialized.as_str()) {
        return SaveOutcome::Unchanged;
    }

    for attempt in 1..=MAX_WRITE_ATTEMPTS {
        match store.set(key, &serialized) {
            Ok(()) => {
                *last = Some(serialized);
                return SaveOutcome::Written;
            }
            Err(error) => {
                warn!(key, attempt, %error, "cart write failed");

                // Free the space held by the stale value before trying again.
                if let Err(error) = store.remove(key) {
                    warn!(key, %error, "failed to clear cart record");
                }
            }
        }
    }

    error!(key, attempts = MAX_WRITE_ATTEMPTS, "giving up on cart write");
    *last = None;

    SaveOutcome::Failed
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use storefront::{cart::CartAction, prices::Price};
    use testresult::TestResult;

    use crate::storage::MemoryStore;

    use super::*;

    /// Counts writes and optionally fails the first `failures` of them.
    #[derive(Debug, Default)]
    struct FlakyStore {
        inner: MemoryStore,
        writes: AtomicUsize,
        removes: AtomicUsize,
        failures: usize,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            let attempt = self.writes.fetch_add(1, Ordering::SeqCst);

            if attempt < self.failures {
                return Err(StorageError::QuotaExceeded {
                    needed: value.len(),
                    available: 0,
                });
            }

            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.removes.fetch_add(1, Ordering::SeqCst);
            self.inner.remove(key)
        }
    }

    fn cart() -> Cart {
        Cart::new().dispatch(CartAction::AddItem {
            item: LineItem::new("A", "Apple", Price::new(1000)),
            quantity: 2,
        })
    }

    #[test]
    fn round_trips_items_and_context() -> TestResult {
        let store = Arc::new(MemoryStore::new());
        let cart = cart()
            .dispatch(CartAction::SetDelivery(Some(DeliveryInfo::new("Central City", "Downtown"))))
            .dispatch(CartAction::ApplyPromotion("SAVE10".to_string()));

        let mut persistence = CartPersistence::new(store.clone());
        assert_eq!(persistence.save(&cart), SaveOutcome::Written);

        let restored = CartPersistence::new(store).load();

        assert_eq!(restored.items, cart.items());
        assert_eq!(restored.context, CartContext::of(&cart));

        Ok(())
    }

    #[test]
    fn skips_identical_writes() {
        let store = Arc::new(FlakyStore::default());
        let mut persistence = CartPersistence::new(store.clone());

        assert_eq!(persistence.save(&cart()), SaveOutcome::Written);
        assert_eq!(persistence.save(&cart()), SaveOutcome::Unchanged);
        assert_eq!(store.writes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn retries_and_clears_between_attempts() -> TestResult {
        let store = Arc::new(FlakyStore {
            failures: 2,
            ..FlakyStore::default()
        });
        let mut persistence = CartPersistence::new(store.clone());

        assert_eq!(persistence.save(&cart()), SaveOutcome::Written);
        assert_eq!(store.removes.load(Ordering::SeqCst), 2);
        assert!(store.get(ITEMS_KEY)?.is_some());

        Ok(())
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let store = Arc::new(FlakyStore {
            failures: usize::MAX,
            ..FlakyStore::default()
        });
        let mut persistence = CartPersistence::new(store.clone());

        assert_eq!(persistence.save(&cart()), SaveOutcome::Failed);
        assert_eq!(store.writes.load(Ordering::SeqCst), MAX_WRITE_ATTEMPTS * 2);

        // A failed write is retried on the next save rather than treated as clean.
        assert_eq!(persistence.save(&cart()), SaveOutcome::Failed);
    }

    #[test]
    fn corrupt_records_are_cleared() -> TestResult {
        let store = Arc::new(MemoryStore::new());
        store.set(ITEMS_KEY, "{not json")?;
        store.set(CONTEXT_KEY, "42")?;

        let restored = CartPersistence::new(store.clone()).load();

        assert!(restored.items.is_empty());
        assert_eq!(restored.context, CartContext::default());
        assert_eq!(store.get(ITEMS_KEY)?, None);
        assert_eq!(store.get(CONTEXT_KEY)?, None);

        Ok(())
    }

    #[test]
    fn non_array_items_are_cleared() -> TestResult {
        let store = Arc::new(MemoryStore::new());
        store.set(ITEMS_KEY, r#"{"id": "A"}"#)?;

        let restored = CartPersistence::new(store.clone()).load();

        assert!(restored.items.is_empty());
        assert_eq!(store.get(ITEMS_KEY)?, None);

        Ok(())
    }

    #[test]
    fn malformed_entries_are_sanitized_and_legacy_key_removed() -> TestResult {
        let store = Arc::new(MemoryStore::new());
        store.set(LEGACY_KEY, "old format")?;
        store.set(
            ITEMS_KEY,
            r#"[{"id": "A", "title": "Apple", "price": 100, "quantity": 1}, {"id": "B"}]"#,
        )?;

        let restored = CartPersistence::new(store.clone()).load();

        assert_eq!(restored.items.len(), 1);
        assert_eq!(store.get(LEGACY_KEY)?, None);

        Ok(())
    }
}
