use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::utils::error::AppResult;
use crate::utils::validation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendeeStatus {
    Active,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Attendee {
    pub id: Uuid,
    pub event_id: Uuid,
    pub order_id: Uuid,
    pub ticket_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub code: String,
    #[sqlx(try_from = "String")]
    pub status: AttendeeStatus,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Attendee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn is_checked_in(&self) -> bool {
        self.checked_in_at.is_some()
    }
}

#[derive(Debug, Deserialize)]
pub struct AttendeeUpdate {
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl AttendeeUpdate {
    pub fn validate(self) -> AppResult<Self> {
        Ok(Self {
            first_name: validation::required("first_name", &self.first_name)?,
            last_name: self.last_name.trim().to_string(),
            email: validation::email("email", &self.email)?,
            phone: validation::optional(self.phone.as_deref()),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AttendeeFilter {
    pub ticket_id: Option<Uuid>,
    pub checked_in: Option<bool>,
    pub status: Option<AttendeeStatus>,
    pub search: Option<String>,
}

impl AttendeeFilter {
    /// `ILIKE` pattern for the search box, with wildcards in the input escaped.
    pub fn search_pattern(&self) -> Option<String> {
        let term = validation::optional(self.search.as_deref())?;
        let escaped = term
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        Some(format!("%{}%", escaped))
    }
}
