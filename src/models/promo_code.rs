use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::models::{CartItem, QuoteRequest};
use crate::services::promo::normalize_code;
use crate::utils::error::{AppError, AppResult};
use crate::utils::validation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DiscountKind {
    Percentage,
    Fixed,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PromoCode {
    pub id: Uuid,
    pub event_id: Uuid,
    pub code: String,
    #[sqlx(try_from = "String")]
    pub discount_kind: DiscountKind,
    pub discount_value: Decimal,
    pub max_uses: Option<i32>,
    pub uses: i32,
    /// Empty means the code applies to every ticket of the event.
    pub ticket_ids: Vec<Uuid>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromoCodeForm {
    pub code: String,
    pub discount_kind: DiscountKind,
    pub discount_value: Decimal,
    pub max_uses: Option<i32>,
    #[serde(default)]
    pub ticket_ids: Vec<Uuid>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl PromoCodeForm {
    pub fn validate(self) -> AppResult<Self> {
        let code = normalize_code(&self.code)?;
        validation::money("discount_value", self.discount_value)?;

        match self.discount_kind {
            DiscountKind::Percentage
                if self.discount_value <= Decimal::ZERO
                    || self.discount_value > Decimal::ONE_HUNDRED =>
            {
                return Err(AppError::validation(
                    "Percentage discounts must be greater than 0 and at most 100",
                ));
            }
            DiscountKind::Fixed if self.discount_value <= Decimal::ZERO => {
                return Err(AppError::validation(
                    "Fixed discounts must be greater than 0",
                ));
            }
            _ => {}
        }

        if let Some(max_uses) = self.max_uses {
            if max_uses < 1 {
                return Err(AppError::validation("max_uses must be at least 1"));
            }
        }
        validation::window("Promo code validity", self.valid_from, self.valid_until)?;

        Ok(Self {
            code,
            ticket_ids: validation::unique_ids("ticket_ids", &self.ticket_ids)?,
            ..self
        })
    }
}

/// Body of a promo code dry run: the code and the cart it would discount.
#[derive(Debug, Deserialize)]
pub struct PromoCheck {
    pub code: String,
    pub items: Vec<CartItem>,
}

impl PromoCheck {
    pub fn into_quote_request(self) -> AppResult<QuoteRequest> {
        Ok(QuoteRequest {
            promo_code: Some(normalize_code(&self.code)?),
            items: self.items,
        })
    }
}
