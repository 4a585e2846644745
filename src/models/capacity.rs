use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::error::{AppError, AppResult};
use crate::utils::validation;

/// A named cap on combined sales across one or more ticket types.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CapacityAssignment {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub capacity: i32,
    pub ticket_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CapacityForm {
    pub name: String,
    pub capacity: i32,
    pub ticket_ids: Vec<Uuid>,
}

impl CapacityForm {
    pub fn validate(self) -> AppResult<Self> {
        if self.ticket_ids.is_empty() {
            return Err(AppError::validation(
                "A capacity assignment needs at least one ticket",
            ));
        }
        Ok(Self {
            name: validation::required("name", &self.name)?,
            capacity: validation::non_negative("capacity", self.capacity)?,
            ticket_ids: validation::unique_ids("ticket_ids", &self.ticket_ids)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapacityUsage {
    pub used: i64,
    pub remaining: i64,
}

#[derive(Debug, Serialize)]
pub struct CapacityView {
    #[serde(flatten)]
    pub assignment: CapacityAssignment,
    pub usage: CapacityUsage,
}
