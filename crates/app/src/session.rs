//! Cart session.
//!
//! Owns the current cart snapshot together with everything needed to change it: the
//! persistence adapter, the delivery table and the promotion lookup. Every change goes
//! through the reducer and is written through to storage straight after.

use std::sync::Arc;

use storefront::{
    cart::{Cart, CartAction},
    checkout::{CheckoutError, CustomerDetails, LoyaltyPolicy, OrderDraft},
    delivery::{DeliveryInfo, DeliveryTable},
    items::LineItem,
    pricing::CartTotals,
    promotions::{Promotion, normalize_code},
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    notice::Notice,
    persistence::{CartPersistence, SaveOutcome},
    promotions::{PromotionLookup, PromotionOutcome},
};

const SAVE_FAILED: &str = "Your cart could not be saved. Changes will be lost when you exit.";
const LOOKUP_FAILED: &str = "The promotion code could not be checked right now. Please try again.";

/// Errors returned by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Quantities below zero are rejected before they reach the cart.
    #[error("quantity cannot be negative: {0}")]
    NegativeQuantity(i64),

    /// The cart cannot be checked out.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),
}

/// The cart plus its collaborators.
pub struct CartSession {
    cart: Cart,
    persistence: CartPersistence,
    delivery: DeliveryTable,
    promotions: Arc<dyn PromotionLookup>,
    promotion: Option<Promotion>,
    loyalty: LoyaltyPolicy,
}

impl std::fmt::Debug for CartSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartSession")
            .field("cart", &self.cart)
            .field("promotion", &self.promotion)
            .finish_non_exhaustive()
    }
}

impl CartSession {
    /// Session with an empty cart. Call [`Self::load`] to restore the saved one.
    #[must_use]
    pub fn new(
        persistence: CartPersistence,
        delivery: DeliveryTable,
        promotions: Arc<dyn PromotionLookup>,
        loyalty: LoyaltyPolicy,
    ) -> Self {
        Self {
            cart: Cart::new(),
            persistence,
            delivery,
            promotions,
            promotion: None,
            loyalty,
        }
    }

    /// Current snapshot.
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Resolved definition of the applied code.
    pub fn promotion(&self) -> Option<&Promotion> {
        self.promotion.as_ref()
    }

    /// Delivery fee table.
    pub fn delivery_table(&self) -> &DeliveryTable {
        &self.delivery
    }

    /// Derived totals of the current snapshot.
    pub fn totals(&self) -> CartTotals {
        CartTotals::compute(&self.cart, &self.delivery, self.promotion.as_ref())
    }

    /// Restores the saved cart and re-validates its promotion code.
    pub async fn load(&mut self) -> Vec<Notice> {
        let restored = self.persistence.load();
        let mut notices = Vec::new();

        notices.extend(self.dispatch(CartAction::SetItems(restored.items)));
        if let Some(delivery) = &restored.context.delivery {
            notices.extend(self.unknown_delivery_notice(delivery));
        }

        notices.extend(self.dispatch(CartAction::SetDelivery(restored.context.delivery)));

        let Some(code) = restored.context.promotion_code else {
            return notices;
        };

        let subtotal = self.totals().subtotal;

        match self.promotions.validate(&code, subtotal).await {
            Ok(PromotionOutcome::Accepted { promotion, .. }) => {
                notices.extend(self.dispatch(CartAction::ApplyPromotion(promotion.code.clone())));
                self.promotion = Some(promotion);
            }
            Ok(PromotionOutcome::Rejected { message }) => {
                info!(%code, %message, "dropping saved promotion");

                notices.extend(self.dispatch(CartAction::RemovePromotion));
                notices.push(Notice::warning(format!(
                    "Promotion {code} was removed: {message}"
                )));
            }
            Err(error) => {
                warn!(%code, %error, "could not re-validate saved promotion");

                // Keep the code so it can be re-applied; without a definition it is worth nothing.
                notices.extend(self.dispatch(CartAction::ApplyPromotion(code)));
                notices.push(Notice::warning(LOOKUP_FAILED));
            }
        }

        notices
    }

    /// Adds `quantity` units of `item`.
    pub fn add_item(&mut self, item: LineItem, quantity: u32) -> Vec<Notice> {
        let item = item.trimmed();

        if let Err(error) = item.validate() {
            return self.fail(error.to_string());
        }

        if quantity == 0 {
            return self.fail("Quantity must be at least 1".to_string());
        }

        let in_cart = self.cart.item(&item.id).map_or(0, |line| line.quantity);

        if item.stock > 0 && in_cart.saturating_add(quantity) > item.stock {
            return self.fail(format!(
                "Only {} of {} in stock",
                item.stock, item.title
            ));
        }

        let title = item.title.clone();
        let mut notices = self.clear_error();

        notices.extend(self.dispatch(CartAction::AddItem { item, quantity }));
        notices.push(Notice::info(format!("Added {quantity} x {title}")));

        notices
    }

    /// Removes the line for `id`.
    pub fn remove_item(&mut self, id: &str) -> Vec<Notice> {
        let mut notices = self.dispatch(CartAction::RemoveItem(id.to_string()));

        notices.extend(self.check_promotion_minimum());

        notices
    }

    /// Sets the quantity of the line for `id`; zero removes it.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NegativeQuantity`] for quantities below zero.
    pub fn update_quantity(
        &mut self,
        id: &str,
        quantity: i64,
    ) -> Result<Vec<Notice>, SessionError> {
        if quantity < 0 {
            return Err(SessionError::NegativeQuantity(quantity));
        }

        let over_stock = self
            .cart
            .item(id)
            .filter(|line| line.stock > 0 && quantity > i64::from(line.stock))
            .map(|line| format!("Only {} of {} in stock", line.stock, line.title));

        if let Some(message) = over_stock {
            return Ok(self.fail(message));
        }

        let mut notices = self.clear_error();

        notices.extend(self.dispatch(CartAction::UpdateQuantity {
            id: id.to_string(),
            quantity,
        }));
        notices.extend(self.check_promotion_minimum());

        Ok(notices)
    }

    /// Empties the cart, its delivery selection and promotion.
    pub fn clear(&mut self) -> Vec<Notice> {
        self.promotion = None;

        self.dispatch(CartAction::Clear)
    }

    /// Selects a delivery destination; pairs missing from the table deliver for free.
    pub fn set_delivery(&mut self, delivery: DeliveryInfo) -> Vec<Notice> {
        let mut notices = Vec::new();

        notices.extend(self.unknown_delivery_notice(&delivery));

        notices.extend(self.dispatch(CartAction::SetDelivery(Some(delivery))));

        notices
    }

    /// Clears the delivery selection.
    pub fn clear_delivery(&mut self) -> Vec<Notice> {
        self.dispatch(CartAction::SetDelivery(None))
    }

    /// Validates `code` against the current subtotal and applies it when accepted.
    ///
    /// A rejected code or a failed lookup leaves the previously applied promotion in place.
    #[tracing::instrument(name = "session.apply_promotion", skip(self))]
    pub async fn apply_promotion(&mut self, code: &str) -> Vec<Notice> {
        let code = normalize_code(code);

        if code.is_empty() {
            return self.fail("Enter a promotion code".to_string());
        }

        let subtotal = self.totals().subtotal;
        let mut notices = self.dispatch(CartAction::SetLoading(true));

        let result = self.promotions.validate(&code, subtotal).await;

        notices.extend(self.dispatch(CartAction::SetLoading(false)));

        match result {
            Ok(PromotionOutcome::Accepted {
                promotion,
                discount,
            }) => {
                info!(code = %promotion.code, %discount, "promotion applied");

                notices.extend(self.clear_error());
                notices.extend(self.dispatch(CartAction::ApplyPromotion(promotion.code.clone())));
                notices.push(Notice::info(format!("Promotion {} applied", promotion.code)));

                self.promotion = Some(promotion);
            }
            Ok(PromotionOutcome::Rejected { message }) => {
                debug!(%code, %message, "promotion rejected");

                notices.extend(self.fail(message));
            }
            Err(error) => {
                warn!(%code, %error, "promotion lookup failed");

                notices.extend(self.fail(LOOKUP_FAILED.to_string()));
            }
        }

        notices
    }

    /// Detaches the applied promotion.
    pub fn remove_promotion(&mut self) -> Vec<Notice> {
        self.promotion = None;

        self.dispatch(CartAction::RemovePromotion)
    }

    /// Turns the cart into an order draft and empties it.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Checkout`] if the cart cannot be checked out.
    pub fn checkout(&mut self, customer: CustomerDetails) -> Result<OrderDraft, SessionError> {
        let totals = self.totals();

        let draft = OrderDraft::from_cart(
            &self.cart,
            &totals,
            self.promotion.as_ref(),
            customer,
            self.loyalty,
        )?;

        info!(
            lines = draft.lines.len(),
            total = %draft.totals.total,
            promotion = draft.promotion_code.as_deref(),
            "order drafted"
        );

        self.clear();

        Ok(draft)
    }

    fn dispatch(&mut self, action: CartAction) -> Vec<Notice> {
        self.cart = self.cart.dispatch(action);

        match self.persistence.save(&self.cart) {
            SaveOutcome::Failed => vec![Notice::warning(SAVE_FAILED)],
            SaveOutcome::Written | SaveOutcome::Unchanged => Vec::new(),
        }
    }

    fn unknown_delivery_notice(&self, delivery: &DeliveryInfo) -> Option<Notice> {
        if self.delivery.contains(delivery) {
            return None;
        }

        warn!(
            city = %delivery.city,
            neighborhood = %delivery.neighborhood,
            "unknown delivery destination"
        );

        Some(Notice::warning(format!(
            "No delivery fee is configured for {}, {}",
            delivery.neighborhood, delivery.city
        )))
    }

    fn fail(&mut self, message: String) -> Vec<Notice> {
        let mut notices = vec![Notice::error(message.clone())];

        notices.extend(self.dispatch(CartAction::SetError(Some(message))));

        notices
    }

    fn clear_error(&mut self) -> Vec<Notice> {
        if self.cart.error().is_none() {
            return Vec::new();
        }

        self.dispatch(CartAction::SetError(None))
    }

    /// Drops the promotion once the subtotal falls below its minimum.
    fn check_promotion_minimum(&mut self) -> Vec<Notice> {
        let Some(promotion) = &self.promotion else {
            return Vec::new();
        };

        let subtotal = self.totals().subtotal;

        if subtotal >= promotion.minimum_subtotal && !self.cart.is_empty() {
            return Vec::new();
        }

        let message = format!(
            "Promotion {} was removed: the cart no longer qualifies",
            promotion.code
        );

        let mut notices = self.remove_promotion();
        notices.push(Notice::warning(message));

        notices
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use storefront::prices::Price;
    use testresult::TestResult;

    use crate::{
        notice::NoticeLevel,
        persistence::CONTEXT_KEY,
        promotions::{LocalPromotions, MockPromotionLookup, PromotionLookupError},
        storage::{KeyValueStore, MemoryStore},
    };

    use super::*;

    fn apple() -> LineItem {
        LineItem::new("A", "Apple", Price::new(1000)).with_promo_price(Price::new(800))
    }

    fn banana() -> LineItem {
        LineItem::new("B", "Banana", Price::new(500))
    }

    fn accepting(code: &'static str) -> MockPromotionLookup {
        let mut lookup = MockPromotionLookup::new();

        lookup
            .expect_validate()
            .withf(move |candidate, _| candidate == code)
            .returning(|code, subtotal| {
                let promotion = Promotion::percentage(code, Decimal::from(10));
                let discount = promotion.discount_for(subtotal);

                Ok(PromotionOutcome::Accepted {
                    promotion,
                    discount,
                })
            });

        lookup
    }

    fn session(store: Arc<dyn KeyValueStore>, lookup: MockPromotionLookup) -> CartSession {
        CartSession::new(
            CartPersistence::new(store),
            DeliveryTable::default(),
            Arc::new(lookup),
            LoyaltyPolicy::default(),
        )
    }

    #[tokio::test]
    async fn restores_saved_cart_and_promotion() -> TestResult {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

        let mut first = session(Arc::clone(&store), accepting("SAVE10"));
        first.add_item(apple(), 2);
        first.add_item(banana(), 1);
        first.set_delivery(DeliveryInfo::new("Central City", "Downtown"));
        first.apply_promotion("save10").await;

        let mut second = session(store, accepting("SAVE10"));
        let notices = second.load().await;

        assert!(notices.is_empty(), "unexpected notices: {notices:?}");
        assert_eq!(second.cart().items(), first.cart().items());
        assert_eq!(second.cart().promotion_code(), Some("SAVE10"));
        assert_eq!(second.totals(), first.totals());
        assert_eq!(second.totals().total, Price::new(2100 - 210 + 800));

        Ok(())
    }

    #[tokio::test]
    async fn saved_promotion_is_dropped_when_no_longer_valid() -> TestResult {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store.set(CONTEXT_KEY, r#"{"promotionCode": "EXPIRED"}"#)?;

        let mut lookup = MockPromotionLookup::new();
        lookup.expect_validate().returning(|_, _| {
            Ok(PromotionOutcome::Rejected {
                message: "this promotion has expired".to_string(),
            })
        });

        let mut session = session(store, lookup);
        let notices = session.load().await;

        assert!(session.cart().promotion_code().is_none());
        assert_eq!(notices.first().map(|n| n.level), Some(NoticeLevel::Warning));

        Ok(())
    }

    #[tokio::test]
    async fn rejected_code_keeps_previous_promotion() {
        let mut lookup = accepting("SAVE10");
        lookup
            .expect_validate()
            .withf(|candidate, _| candidate == "BOGUS")
            .returning(|_, _| {
                Ok(PromotionOutcome::Rejected {
                    message: "promotion code not found".to_string(),
                })
            });

        let mut session = session(Arc::new(MemoryStore::new()), lookup);
        session.add_item(apple(), 2);
        session.apply_promotion("SAVE10").await;

        let notices = session.apply_promotion("bogus").await;

        assert_eq!(session.cart().promotion_code(), Some("SAVE10"));
        assert_eq!(session.cart().error(), Some("promotion code not found"));
        assert!(!session.cart().is_loading());
        assert_eq!(notices.first().map(|n| n.level), Some(NoticeLevel::Error));
    }

    #[tokio::test]
    async fn unknown_code_is_not_applied() {
        let mut session = CartSession::new(
            CartPersistence::new(Arc::new(MemoryStore::new())),
            DeliveryTable::default(),
            Arc::new(LocalPromotions::default()),
            LoyaltyPolicy::default(),
        );
        session.add_item(apple(), 2);

        let notices = session.apply_promotion("NOSUCHCODE").await;

        assert!(session.cart().promotion_code().is_none());
        assert!(session.promotion().is_none());
        assert_eq!(session.totals().promotion_discount, Price::ZERO);
        assert_eq!(session.cart().error(), Some("promotion code not found"));
        assert_eq!(notices.first().map(|n| n.level), Some(NoticeLevel::Error));
    }

    #[tokio::test]
    async fn lookup_failure_leaves_cart_unchanged() {
        let mut lookup = MockPromotionLookup::new();
        lookup.expect_validate().returning(|_, _| {
            Err(PromotionLookupError::UnexpectedResponse("503".to_string()))
        });

        let mut session = session(Arc::new(MemoryStore::new()), lookup);
        session.add_item(apple(), 1);

        session.apply_promotion("SAVE10").await;

        assert!(session.cart().promotion_code().is_none());
        assert_eq!(session.totals().promotion_discount, Price::ZERO);
        assert_eq!(session.cart().error(), Some(LOOKUP_FAILED));
    }

    #[tokio::test]
    async fn padded_identifiers_share_a_line_across_reloads() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

        let mut first = session(Arc::clone(&store), MockPromotionLookup::new());
        first.add_item(LineItem::new("A", "Apple", Price::new(1000)), 1);
        first.add_item(LineItem::new("A ", " Apple ", Price::new(1000)), 2);

        let mut second = session(store, MockPromotionLookup::new());
        second.load().await;

        assert_eq!(first.cart().len(), 1);
        assert_eq!(first.cart().item("A").map(|line| line.quantity), Some(3));
        assert_eq!(second.cart().items(), first.cart().items());
    }

    #[tokio::test]
    async fn restored_unknown_destination_warns() -> TestResult {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store.set(
            CONTEXT_KEY,
            r#"{"delivery": {"city": "Atlantis", "neighborhood": "Harbor"}}"#,
        )?;

        let mut session = session(store, MockPromotionLookup::new());
        let notices = session.load().await;

        assert_eq!(
            session.cart().delivery(),
            Some(&DeliveryInfo::new("Atlantis", "Harbor"))
        );
        assert_eq!(notices.first().map(|n| n.level), Some(NoticeLevel::Warning));
        assert_eq!(session.totals().delivery_fee, Price::ZERO);

        Ok(())
    }

    #[test]
    fn stock_limit_blocks_add() {
        let mut session = session(Arc::new(MemoryStore::new()), MockPromotionLookup::new());

        session.add_item(apple().with_stock(3), 2);
        let notices = session.add_item(apple().with_stock(3), 2);

        assert_eq!(session.cart().item("A").map(|line| line.quantity), Some(2));
        assert_eq!(session.cart().error(), Some("Only 3 of Apple in stock"));
        assert_eq!(notices.first().map(|n| n.level), Some(NoticeLevel::Error));
    }

    #[test]
    fn zero_quantity_and_invalid_items_are_rejected() {
        let mut session = session(Arc::new(MemoryStore::new()), MockPromotionLookup::new());

        session.add_item(apple(), 0);
        session.add_item(LineItem::new("", "Ghost", Price::new(100)), 1);

        assert!(session.cart().is_empty());
        assert!(session.cart().error().is_some());
    }

    #[test]
    fn successful_add_clears_previous_error() {
        let mut session = session(Arc::new(MemoryStore::new()), MockPromotionLookup::new());

        session.add_item(apple(), 0);
        session.add_item(apple(), 1);

        assert!(session.cart().error().is_none());
    }

    #[test]
    fn negative_quantity_is_an_error() {
        let mut session = session(Arc::new(MemoryStore::new()), MockPromotionLookup::new());
        session.add_item(apple(), 2);

        let result = session.update_quantity("A", -1);

        assert!(matches!(result, Err(SessionError::NegativeQuantity(-1))));
        assert_eq!(session.cart().item("A").map(|line| line.quantity), Some(2));
    }

    #[test]
    fn zero_quantity_update_removes_line() -> TestResult {
        let mut session = session(Arc::new(MemoryStore::new()), MockPromotionLookup::new());
        session.add_item(apple(), 2);

        session.update_quantity("A", 0)?;

        assert!(session.cart().is_empty());

        Ok(())
    }

    #[test]
    fn unknown_destination_warns_and_costs_nothing() {
        let mut session = session(Arc::new(MemoryStore::new()), MockPromotionLookup::new());
        session.add_item(banana(), 1);

        let notices = session.set_delivery(DeliveryInfo::new("Atlantis", "Harbor"));

        assert_eq!(notices.first().map(|n| n.level), Some(NoticeLevel::Warning));
        assert!(session.cart().delivery().is_some());
        assert_eq!(session.totals().delivery_fee, Price::ZERO);
    }

    #[tokio::test]
    async fn falling_below_minimum_drops_promotion() {
        let mut lookup = MockPromotionLookup::new();
        lookup.expect_validate().returning(|code, subtotal| {
            let promotion = Promotion {
                minimum_subtotal: Price::new(1500),
                ..Promotion::fixed_amount(code, Price::new(200))
            };

            Ok(PromotionOutcome::Accepted {
                discount: promotion.discount_for(subtotal),
                promotion,
            })
        });

        let mut session = session(Arc::new(MemoryStore::new()), lookup);
        session.add_item(apple(), 1);
        session.add_item(banana(), 2);
        session.apply_promotion("TWOOFF").await;

        session.remove_item("B");

        assert!(session.cart().promotion_code().is_none());
        assert!(session.promotion().is_none());
    }

    #[tokio::test]
    async fn checkout_drafts_order_and_clears_cart() -> TestResult {
        let mut session = session(Arc::new(MemoryStore::new()), accepting("SAVE10"));
        session.add_item(apple(), 2);
        session.add_item(banana(), 1);
        session.set_delivery(DeliveryInfo::new("Central City", "Downtown"));
        session.apply_promotion("SAVE10").await;

        let draft = session.checkout(CustomerDetails {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: String::new(),
            address: "1 Main St".to_string(),
        })?;

        assert_eq!(draft.totals.total, Price::new(2690));
        assert_eq!(draft.promotion_code.as_deref(), Some("SAVE10"));
        assert!(session.cart().is_empty());
        assert!(session.cart().promotion_code().is_none());

        Ok(())
    }

    #[test]
    fn checkout_without_delivery_fails() {
        let mut session = session(Arc::new(MemoryStore::new()), MockPromotionLookup::new());
        session.add_item(apple(), 1);

        let result = session.checkout(CustomerDetails {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: String::new(),
            address: "1 Main St".to_string(),
        });

        assert!(matches!(
            result,
            Err(SessionError::Checkout(CheckoutError::MissingDelivery))
        ));
        assert_eq!(session.cart().len(), 1);
    }
}
