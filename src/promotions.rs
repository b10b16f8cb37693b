//! Promotions
//!
//! A promotion is a code that, once validated, discounts the cart subtotal either by a
//! percentage (optionally capped) or by a flat amount.

use std::{fs, path::Path};

use jiff::Timestamp;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::prices::Price;

/// Errors loading promotion definitions.
#[derive(Debug, Error)]
pub enum PromotionError {
    /// IO error reading the promotions file
    #[error("failed to read promotions: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("failed to parse promotions: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Percentage outside 0..=100
    #[error("promotion {0} has a percentage outside 0-100")]
    InvalidPercent(String),

    /// Blank promotion code
    #[error("promotion code cannot be blank")]
    BlankCode,

    /// Two promotions share a code
    #[error("duplicate promotion code {0}")]
    DuplicateCode(String),
}

/// Why a promotion cannot be applied right now.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PromotionRejection {
    /// No promotion has this code.
    #[error("promotion code not found")]
    Unknown,

    /// The promotion is switched off.
    #[error("this promotion is not active")]
    Inactive,

    /// The promotion window has not opened yet.
    #[error("this promotion has not started yet")]
    NotStarted,

    /// The promotion window has closed.
    #[error("this promotion has expired")]
    Expired,

    /// Every redemption has been used.
    #[error("this promotion has reached its usage limit")]
    UsageLimitReached,

    /// Cart subtotal is below the required minimum.
    #[error("a minimum purchase of {minimum} is required")]
    BelowMinimum {
        /// Required subtotal
        minimum: Price,
    },
}

/// How the discount is computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiscountKind {
    /// Percentage of the subtotal, optionally capped.
    Percentage {
        /// Percent points, e.g. `10` for 10%
        percent: Decimal,

        /// Upper bound on the discount
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_amount: Option<Price>,
    },

    /// Flat amount off.
    FixedAmount {
        /// Amount off the subtotal
        amount: Price,
    },
}

/// Influencer credited for orders placed with a promotion code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfluencerAttribution {
    /// Influencer handle
    pub handle: String,

    /// Commission in percent points of the discounted subtotal
    pub commission_percent: Decimal,
}

/// Promotion definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    /// Redemption code
    pub code: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Discount rule
    pub discount: DiscountKind,

    /// Minimum subtotal required to redeem
    #[serde(default)]
    pub minimum_subtotal: Price,

    /// Start of the redemption window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<Timestamp>,

    /// End of the redemption window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<Timestamp>,

    /// Maximum redemptions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_limit: Option<u32>,

    /// Redemptions so far
    #[serde(default)]
    pub times_used: u32,

    /// Whether the promotion is switched on
    #[serde(default = "default_active")]
    pub active: bool,

    /// Influencer credited for the sale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub influencer: Option<InfluencerAttribution>,
}

fn default_active() -> bool {
    true
}

impl Promotion {
    /// Creates an active promotion with no restrictions.
    pub fn new(code: impl Into<String>, discount: DiscountKind) -> Self {
        Self {
            code: normalize_code(&code.into()),
            description: String::new(),
            discount,
            minimum_subtotal: Price::ZERO,
            starts_at: None,
            ends_at: None,
            usage_limit: None,
            times_used: 0,
            active: true,
            influencer: None,
        }
    }

    /// Percentage promotion without a cap.
    pub fn percentage(code: impl Into<String>, percent: Decimal) -> Self {
        Self::new(
            code,
            DiscountKind::Percentage {
                percent,
                max_amount: None,
            },
        )
    }

    /// Flat amount promotion.
    pub fn fixed_amount(code: impl Into<String>, amount: Price) -> Self {
        Self::new(code, DiscountKind::FixedAmount { amount })
    }

    /// Discount this promotion grants on `subtotal`, ignoring eligibility.
    pub fn discount_for(&self, subtotal: Price) -> Price {
        if subtotal.is_zero() {
            return Price::ZERO;
        }

        match &self.discount {
            DiscountKind::Percentage {
                percent,
                max_amount,
            } => {
                let discount = percent_of(*percent, subtotal);

                max_amount.map_or(discount, |cap| discount.min(cap))
            }
            DiscountKind::FixedAmount { amount } => *amount,
        }
    }

    /// Checks eligibility at `now` and returns the discount on `subtotal`.
    ///
    /// # Errors
    ///
    /// Returns the [`PromotionRejection`] describing the first failed condition.
    pub fn evaluate(&self, subtotal: Price, now: Timestamp) -> Result<Price, PromotionRejection> {
        if !self.active {
            return Err(PromotionRejection::Inactive);
        }

        if self.starts_at.is_some_and(|starts_at| now < starts_at) {
            return Err(PromotionRejection::NotStarted);
        }

        if self.ends_at.is_some_and(|ends_at| now > ends_at) {
            return Err(PromotionRejection::Expired);
        }

        if self
            .usage_limit
            .is_some_and(|limit| self.times_used >= limit)
        {
            return Err(PromotionRejection::UsageLimitReached);
        }

        if subtotal < self.minimum_subtotal {
            return Err(PromotionRejection::BelowMinimum {
                minimum: self.minimum_subtotal,
            });
        }

        Ok(self.discount_for(subtotal))
    }

    fn check(&self) -> Result<(), PromotionError> {
        if self.code.is_empty() {
            return Err(PromotionError::BlankCode);
        }

        let in_range = |percent: &Decimal| (Decimal::ZERO..=Decimal::ONE_HUNDRED).contains(percent);

        let percent_ok = match &self.discount {
            DiscountKind::Percentage { percent, .. } => in_range(percent),
            DiscountKind::FixedAmount { .. } => true,
        };

        let commission_ok = self
            .influencer
            .as_ref()
            .is_none_or(|influencer| in_range(&influencer.commission_percent));

        if !percent_ok || !commission_ok {
            return Err(PromotionError::InvalidPercent(self.code.clone()));
        }

        Ok(())
    }
}

/// Canonical form of a promotion code: trimmed and upper-cased.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// `percent` percent of `amount`, rounded half away from zero.
///
/// Negative or unrepresentable results yield zero.
pub fn percent_of(percent: Decimal, amount: Price) -> Price {
    let Some(applied) = Decimal::from(amount.minor_units()).checked_mul(percent) else {
        return Price::ZERO;
    };

    let Some(scaled) = applied.checked_div(Decimal::ONE_HUNDRED) else {
        return Price::ZERO;
    };

    scaled
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .map_or(Price::ZERO, Price::new)
}

/// In-memory promotion directory keyed by normalized code.
#[derive(Debug, Clone, Default)]
pub struct PromotionBook {
    promotions: FxHashMap<String, Promotion>,
}

impl PromotionBook {
    /// Builds a book, normalizing codes.
    ///
    /// # Errors
    ///
    /// Returns a [`PromotionError`] for blank or duplicate codes and out-of-range percentages.
    pub fn new(promotions: impl IntoIterator<Item = Promotion>) -> Result<Self, PromotionError> {
        let mut book = FxHashMap::default();

        for mut promotion in promotions {
            promotion.code = normalize_code(&promotion.code);
            promotion.check()?;

            if book.contains_key(&promotion.code) {
                return Err(PromotionError::DuplicateCode(promotion.code));
            }

            book.insert(promotion.code.clone(), promotion);
        }

        Ok(Self { promotions: book })
    }

    /// Parses a YAML sequence of promotions.
    ///
    /// # Errors
    ///
    /// Returns a [`PromotionError`] on malformed YAML or invalid definitions.
    pub fn from_yaml(yaml: &str) -> Result<Self, PromotionError> {
        let promotions: Vec<Promotion> = serde_norway::from_str(yaml)?;

        Self::new(promotions)
    }

    /// Reads a YAML promotions file.
    ///
    /// # Errors
    ///
    /// Returns a [`PromotionError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, PromotionError> {
        Self::from_yaml(&fs::read_to_string(path)?)
    }

    /// Finds a promotion by code, in any case.
    pub fn resolve(&self, code: &str) -> Option<&Promotion> {
        self.promotions.get(&normalize_code(code))
    }

    /// Resolves and evaluates a code.
    ///
    /// # Errors
    ///
    /// Returns [`PromotionRejection::Unknown`] for unknown codes, otherwise the
    /// promotion's own rejection.
    pub fn evaluate(
        &self,
        code: &str,
        subtotal: Price,
        now: Timestamp,
    ) -> Result<(&Promotion, Price), PromotionRejection> {
        let promotion = self.resolve(code).ok_or(PromotionRejection::Unknown)?;
        let discount = promotion.evaluate(subtotal, now)?;

        Ok((promotion, discount))
    }

    /// Number of promotions.
    pub fn len(&self) -> usize {
        self.promotions.len()
    }

    /// Check if the book is empty.
    pub fn is_empty(&self) -> bool {
        self.promotions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn percentage_discount_rounds_half_away_from_zero() {
        let promotion = Promotion::percentage("ten", Decimal::from(10));

        assert_eq!(promotion.discount_for(Price::new(2100)), Price::new(210));
        assert_eq!(promotion.discount_for(Price::new(15)), Price::new(2));
    }

    #[test]
    fn percentage_discount_respects_cap() {
        let promotion = Promotion::new(
            "capped",
            DiscountKind::Percentage {
                percent: Decimal::from(50),
                max_amount: Some(Price::new(300)),
            },
        );

        assert_eq!(promotion.discount_for(Price::new(2000)), Price::new(300));
        assert_eq!(promotion.discount_for(Price::new(400)), Price::new(200));
    }

    #[test]
    fn fixed_discount_is_flat() {
        let promotion = Promotion::fixed_amount("flat", Price::new(500));

        assert_eq!(promotion.discount_for(Price::new(2100)), Price::new(500));
        assert_eq!(promotion.discount_for(Price::ZERO), Price::ZERO);
    }

    #[test]
    fn evaluate_checks_window_limits_and_minimum() -> TestResult {
        let now = Timestamp::from_second(1_700_000_000)?;
        let mut promotion = Promotion::fixed_amount("flat", Price::new(100));

        promotion.active = false;
        assert_eq!(
            promotion.evaluate(Price::new(1000), now),
            Err(PromotionRejection::Inactive)
        );

        promotion.active = true;
        promotion.starts_at = Some(Timestamp::from_second(1_800_000_000)?);
        assert_eq!(
            promotion.evaluate(Price::new(1000), now),
            Err(PromotionRejection::NotStarted)
        );

        promotion.starts_at = None;
        promotion.ends_at = Some(Timestamp::from_second(1_600_000_000)?);
        assert_eq!(
            promotion.evaluate(Price::new(1000), now),
            Err(PromotionRejection::Expired)
        );

        promotion.ends_at = None;
        promotion.usage_limit = Some(3);
        promotion.times_used = 3;
        assert_eq!(
            promotion.evaluate(Price::new(1000), now),
            Err(PromotionRejection::UsageLimitReached)
        );

        promotion.usage_limit = None;
        promotion.minimum_subtotal = Price::new(5000);
        assert_eq!(
            promotion.evaluate(Price::new(1000), now),
            Err(PromotionRejection::BelowMinimum {
                minimum: Price::new(5000)
            })
        );

        promotion.minimum_subtotal = Price::ZERO;
        assert_eq!(promotion.evaluate(Price::new(1000), now), Ok(Price::new(100)));

        Ok(())
    }

    #[test]
    fn book_resolves_codes_in_any_case() -> TestResult {
        let book = PromotionBook::new([Promotion::percentage("Save10", Decimal::from(10))])?;

        assert!(book.resolve(" save10 ").is_some());
        assert_eq!(
            book.evaluate("nope", Price::new(100), Timestamp::now()).err(),
            Some(PromotionRejection::Unknown)
        );

        Ok(())
    }

    #[test]
    fn book_rejects_duplicates_and_bad_percentages() {
        let duplicate = PromotionBook::new([
            Promotion::percentage("A", Decimal::from(10)),
            Promotion::percentage("a", Decimal::from(20)),
        ]);
        let out_of_range = PromotionBook::new([Promotion::percentage("B", Decimal::from(150))]);

        assert!(matches!(duplicate, Err(PromotionError::DuplicateCode(code)) if code == "A"));
        assert!(matches!(out_of_range, Err(PromotionError::InvalidPercent(_))));
    }

    #[test]
    fn parses_yaml_book() -> TestResult {
        let yaml = r"
- code: welcome
  description: Welcome discount
  discount:
    type: percentage
    percent: 15
    max_amount: 2000
- code: ship
  discount:
    type: fixed_amount
    amount: 500
  minimum_subtotal: 3000
  influencer:
    handle: '@chef'
    commission_percent: 5
";

        let book = PromotionBook::from_yaml(yaml)?;

        assert_eq!(book.len(), 2);
        assert_eq!(
            book.resolve("WELCOME").map(|p| p.discount_for(Price::new(100_000))),
            Some(Price::new(2000))
        );
        assert_eq!(
            book.resolve("ship").and_then(|p| p.influencer.as_ref()).map(|i| i.handle.as_str()),
            Some("@chef")
        );

        Ok(())
    }
}
