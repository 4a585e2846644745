use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::error::{AppError, AppResult};
use crate::utils::validation;

/// Tickets that on-site staff may check in through this list while it is active.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RegistrationList {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub ticket_ids: Vec<Uuid>,
    pub activates_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListWindow {
    Pending,
    Active,
    Expired,
}

#[derive(Debug, Serialize)]
pub struct RegistrationListView {
    #[serde(flatten)]
    pub list: RegistrationList,
    pub window: ListWindow,
}

#[derive(Debug, Deserialize)]
pub struct RegistrationListForm {
    pub name: String,
    pub ticket_ids: Vec<Uuid>,
    pub activates_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl RegistrationListForm {
    pub fn validate(self) -> AppResult<Self> {
        if self.ticket_ids.is_empty() {
            return Err(AppError::validation(
                "A registration list needs at least one ticket",
            ));
        }
        if let (Some(activates_at), Some(expires_at)) = (self.activates_at, self.expires_at) {
            if expires_at <= activates_at {
                return Err(AppError::validation(
                    "expires_at must be later than activates_at",
                ));
            }
        }
        Ok(Self {
            name: validation::required("name", &self.name)?,
            ticket_ids: validation::unique_ids("ticket_ids", &self.ticket_ids)?,
            ..self
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CodeCheckIn {
    pub code: String,
}
