use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::error::{AppError, AppResult};
use crate::utils::validation;

/// One step of a tiered ("escalonado") price schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketStage {
    pub name: String,
    pub price: Decimal,
    /// Seats sold at this price before the next stage opens. `None` means no cap.
    pub quantity: Option<i32>,
    pub ends_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ticket {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub quantity: Option<i32>,
    pub sold: i32,
    pub min_per_order: i32,
    pub max_per_order: Option<i32>,
    pub sales_start: Option<DateTime<Utc>>,
    pub sales_end: Option<DateTime<Utc>>,
    pub stages: Json<Vec<TicketStage>>,
    /// Organizer-side marker for tickets kept off public sale pages. Every
    /// endpoint here is organizer-only, so listings still include them.
    pub hidden: bool,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "remaining", rename_all = "snake_case")]
pub enum Availability {
    Unlimited,
    Remaining(i32),
}

impl Availability {
    pub fn allows(&self, requested: i32) -> bool {
        match self {
            Availability::Unlimited => true,
            Availability::Remaining(n) => requested <= *n,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TicketForm {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub price: Decimal,
    pub quantity: Option<i32>,
    #[serde(default = "default_min_per_order")]
    pub min_per_order: i32,
    pub max_per_order: Option<i32>,
    pub sales_start: Option<DateTime<Utc>>,
    pub sales_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub stages: Vec<TicketStage>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub position: i32,
}

fn default_min_per_order() -> i32 {
    1
}

impl TicketForm {
    pub fn validate(self) -> AppResult<Self> {
        let price = validation::money("price", self.price)?;
        if let Some(quantity) = self.quantity {
            validation::non_negative("quantity", quantity)?;
        }
        if self.min_per_order < 1 {
            return Err(AppError::validation("min_per_order must be at least 1"));
        }
        if let Some(max) = self.max_per_order {
            if max < self.min_per_order {
                return Err(AppError::validation(
                    "max_per_order cannot be lower than min_per_order",
                ));
            }
        }
        validation::window("Ticket sales", self.sales_start, self.sales_end)?;

        let mut stages = Vec::with_capacity(self.stages.len());
        for stage in self.stages {
            validation::money("stage price", stage.price)?;
            if matches!(stage.quantity, Some(q) if q < 1) {
                return Err(AppError::validation("stage quantity must be positive"));
            }
            stages.push(TicketStage {
                name: validation::required("stage name", &stage.name)?,
                ..stage
            });
        }

        Ok(Self {
            name: validation::required("name", &self.name)?,
            description: validation::optional(self.description.as_deref()),
            price,
            stages,
            ..self
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn form() -> TicketForm {
        TicketForm {
            name: " General ".to_string(),
            description: None,
            price: Decimal::from(25),
            quantity: Some(100),
            min_per_order: 1,
            max_per_order: None,
            sales_start: None,
            sales_end: None,
            stages: vec![],
            hidden: false,
            position: 0,
        }
    }

    fn stage(price: &str) -> TicketStage {
        TicketStage {
            name: "Early".to_string(),
            price: Decimal::from_str(price).unwrap(),
            quantity: Some(10),
            ends_at: None,
        }
    }

    fn assert_rejected(form: TicketForm) {
        assert!(matches!(form.validate(), Err(AppError::ValidationError(_))));
    }

    #[test]
    fn test_valid_form_is_trimmed() {
        let mut f = form();
        f.stages = vec![stage("19.90")];
        let valid = f.validate().unwrap();
        assert_eq!(valid.name, "General");
        assert_eq!(valid.stages.len(), 1);
    }

    #[test]
    fn test_price_must_fit_money_column() {
        let mut f = form();
        f.price = Decimal::from_str("10000000000.00").unwrap();
        assert_rejected(f);

        let mut f = form();
        f.price = Decimal::from_str("12.345").unwrap();
        assert_rejected(f);

        let mut f = form();
        f.price = Decimal::from_str("-1").unwrap();
        assert_rejected(f);
    }

    #[test]
    fn test_stage_price_must_fit_money_column() {
        let mut f = form();
        f.stages = vec![stage("50000000000000000000000000000")];
        assert_rejected(f);

        let mut f = form();
        f.stages = vec![stage("9.999")];
        assert_rejected(f);
    }

    #[test]
    fn test_max_per_order_below_min_is_rejected() {
        let mut f = form();
        f.min_per_order = 4;
        f.max_per_order = Some(2);
        assert_rejected(f);
    }
}
