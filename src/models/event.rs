use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::utils::error::{AppError, AppResult};
use crate::utils::validation;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventStatus {
    #[default]
    Draft,
    Published,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    #[sqlx(try_from = "String")]
    pub status: EventStatus,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct EventForm {
    pub title: String,
    pub description: Option<String>,
    pub location: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl EventForm {
    pub fn validate(self) -> AppResult<Self> {
        validation::window("Event", Some(self.start_time), self.end_time)?;

        let currency = self.currency.trim().to_string();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(AppError::validation(
                "currency must be a 3-letter uppercase ISO code",
            ));
        }

        Ok(Self {
            title: validation::required("title", &self.title)?,
            description: validation::optional(self.description.as_deref()),
            location: validation::required("location", &self.location)?,
            currency,
            ..self
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct EventFilter {
    pub status: Option<EventStatus>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TicketSales {
    pub ticket_id: Uuid,
    pub name: String,
    pub sold: i32,
    /// `None` when the ticket has no quantity cap.
    pub remaining: Option<i32>,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventSummary {
    pub event_id: Uuid,
    pub tickets: Vec<TicketSales>,
    pub orders: i64,
    pub attendees: i64,
    pub checked_in: i64,
    pub revenue: Decimal,
}
