//! Promotion lookups.
//!
//! Codes are validated against the current subtotal before the cart applies them. The
//! lookup is either a local promotion book or the remote validation endpoint.

use std::time::Duration;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use storefront::{
    prices::Price,
    promotions::{Promotion, PromotionBook, normalize_code},
};
use thiserror::Error;
use tracing::debug;

/// Result of validating a code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromotionOutcome {
    /// The code can be applied.
    Accepted {
        /// Resolved definition
        promotion: Promotion,

        /// Discount at the subtotal it was validated against
        discount: Price,
    },

    /// The code cannot be applied.
    Rejected {
        /// Reason shown to the user
        message: String,
    },
}

/// Errors that prevent a code from being validated at all.
#[derive(Debug, Error)]
pub enum PromotionLookupError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The validation endpoint returned a non-2xx response.
    #[error("unexpected response from promotions: {0}")]
    UnexpectedResponse(String),
}

/// Validates promotion codes.
#[automock]
#[async_trait]
pub trait PromotionLookup: Send + Sync {
    /// Checks whether `code` applies to a cart with `subtotal`.
    async fn validate(
        &self,
        code: &str,
        subtotal: Price,
    ) -> Result<PromotionOutcome, PromotionLookupError>;
}

/// Lookup over promotions defined in a local file.
#[derive(Debug, Clone, Default)]
pub struct LocalPromotions {
    book: PromotionBook,
}

impl LocalPromotions {
    /// Lookup over `book`.
    #[must_use]
    pub fn new(book: PromotionBook) -> Self {
        Self { book }
    }
}

#[async_trait]
impl PromotionLookup for LocalPromotions {
    async fn validate(
        &self,
        code: &str,
        subtotal: Price,
    ) -> Result<PromotionOutcome, PromotionLookupError> {
        let outcome = match self.book.evaluate(code, subtotal, Timestamp::now()) {
            Ok((promotion, discount)) => PromotionOutcome::Accepted {
                promotion: promotion.clone(),
                discount,
            },
            Err(rejection) => PromotionOutcome::Rejected {
                message: rejection.to_string(),
            },
        };

        Ok(outcome)
    }
}

/// Lookup against `GET {base}/promotions/validate`.
#[derive(Debug, Clone)]
pub struct RemotePromotions {
    base_url: String,
    http: Client,
}

impl RemotePromotions {
    /// Client for the validation endpoint under `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, PromotionLookupError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::builder().timeout(timeout).build()?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ValidateResponse {
    valid: bool,

    #[serde(default)]
    discount: Option<Price>,

    #[serde(default)]
    message: Option<String>,

    #[serde(default)]
    promotion: Option<Promotion>,
}

#[async_trait]
impl PromotionLookup for RemotePromotions {
    #[tracing::instrument(name = "promotions.remote.validate", skip(self), err)]
    async fn validate(
        &self,
        code: &str,
        subtotal: Price,
    ) -> Result<PromotionOutcome, PromotionLookupError> {
        let code = normalize_code(code);
        let subtotal_param = subtotal.minor_units().to_string();
        let url = format!("{}/promotions/validate", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[("code", code.as_str()), ("subtotal", subtotal_param.as_str())])
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(PromotionOutcome::Rejected {
                message: "promotion code not found".to_string(),
            });
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();

            return Err(PromotionLookupError::UnexpectedResponse(format!(
                "validate request failed with status {status}: {text}"
            )));
        }

        let parsed: ValidateResponse = response.json().await?;

        debug!(valid = parsed.valid, "promotion validated");

        if !parsed.valid {
            return Ok(PromotionOutcome::Rejected {
                message: parsed
                    .message
                    .unwrap_or_else(|| "invalid promotion code".to_string()),
            });
        }

        let discount = parsed.discount.unwrap_or_default();

        // Without a definition the reported amount becomes a flat discount.
        let promotion = parsed
            .promotion
            .unwrap_or_else(|| Promotion::fixed_amount(code.clone(), discount));

        let discount = parsed
            .discount
            .unwrap_or_else(|| promotion.discount_for(subtotal));

        Ok(PromotionOutcome::Accepted {
            promotion,
            discount,
        })
    }
}
