use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::error::AppResult;
use crate::utils::validation;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Organizer {
    pub id: Uuid,
    pub name: String,
    pub contact_email: String,
    #[serde(skip_serializing)]
    pub api_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct NewOrganizer {
    pub name: String,
    pub contact_email: String,
}

impl NewOrganizer {
    pub fn validate(self) -> AppResult<Self> {
        Ok(Self {
            name: validation::required("name", &self.name)?,
            contact_email: validation::email("contact_email", &self.contact_email)?,
        })
    }
}

/// Registration response; the only place the API token is ever returned.
#[derive(Debug, Serialize)]
pub struct RegisteredOrganizer {
    #[serde(flatten)]
    pub organizer: Organizer,
    pub api_token: String,
}

impl From<Organizer> for RegisteredOrganizer {
    fn from(organizer: Organizer) -> Self {
        let api_token = organizer.api_token.clone();
        Self {
            organizer,
            api_token,
        }
    }
}
