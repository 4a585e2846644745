use chrono::{DateTime, Utc};
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
pub enum Audience {
    #[default]
    All,
    Tickets,
    CheckedIn,
    NotCheckedIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MessageStatus {
    Queued,
    Sending,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub event_id: Uuid,
    pub subject: String,
    pub body: String,
    #[sqlx(try_from = "String")]
    pub audience: Audience,
    pub ticket_ids: Vec<Uuid>,
    pub include_qr: bool,
    #[sqlx(try_from = "String")]
    pub status: MessageStatus,
    pub total: i32,
    pub sent: i32,
    pub failed: i32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct MessageForm {
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub audience: Audience,
    #[serde(default)]
    pub ticket_ids: Vec<Uuid>,
    #[serde(default)]
    pub include_qr: bool,
}

impl MessageForm {
    pub fn validate(self) -> AppResult<Self> {
        let ticket_ids = validation::unique_ids("ticket_ids", &self.ticket_ids)?;
        if self.audience == Audience::Tickets && ticket_ids.is_empty() {
            return Err(AppError::validation(
                "Select at least one ticket for a ticket audience",
            ));
        }
        Ok(Self {
            subject: validation::required("subject", &self.subject)?,
            body: validation::required("body", &self.body)?,
            ticket_ids,
            ..self
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_audience_needs_tickets() {
        let form = MessageForm {
            subject: "Doors open".to_string(),
            body: "See you".to_string(),
            audience: Audience::Tickets,
            ticket_ids: vec![],
            include_qr: false,
        };
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_blank_body_is_rejected() {
        let form = MessageForm {
            subject: "Doors open".to_string(),
            body: "  ".to_string(),
            audience: Audience::All,
            ticket_ids: vec![],
            include_qr: true,
        };
        assert!(form.validate().is_err());
    }
}
