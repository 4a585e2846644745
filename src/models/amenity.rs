use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::error::AppResult;
use crate::utils::validation;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Amenity {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// `None` means unlimited.
    pub quantity: Option<i32>,
    pub claimed: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Amenity {
    pub fn remaining(&self) -> Option<i32> {
        self.quantity.map(|q| (q - self.claimed).max(0))
    }
}

#[derive(Debug, Deserialize)]
pub struct AmenityForm {
    pub name: String,
    pub description: Option<String>,
    pub quantity: Option<i32>,
}

impl AmenityForm {
    pub fn validate(self) -> AppResult<Self> {
        if let Some(quantity) = self.quantity {
            validation::non_negative("quantity", quantity)?;
        }
        Ok(Self {
            name: validation::required("name", &self.name)?,
            description: validation::optional(self.description.as_deref()),
            quantity: self.quantity,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ClaimRequest {
    pub attendee_id: Uuid,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AmenityClaim {
    pub amenity_id: Uuid,
    pub attendee_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub claimed_at: DateTime<Utc>,
}
