use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::error::{AppError, AppResult};
use crate::utils::validation;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Raffle {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub prize: String,
    pub description: Option<String>,
    pub winner_count: i32,
    /// Empty means holders of any ticket may win.
    pub ticket_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct RaffleForm {
    pub name: String,
    pub prize: String,
    pub description: Option<String>,
    #[serde(default = "default_winner_count")]
    pub winner_count: i32,
    #[serde(default)]
    pub ticket_ids: Vec<Uuid>,
}

fn default_winner_count() -> i32 {
    1
}

impl RaffleForm {
    pub fn validate(self) -> AppResult<Self> {
        if self.winner_count < 1 {
            return Err(AppError::validation("winner_count must be at least 1"));
        }
        Ok(Self {
            name: validation::required("name", &self.name)?,
            prize: validation::required("prize", &self.prize)?,
            description: validation::optional(self.description.as_deref()),
            winner_count: self.winner_count,
            ticket_ids: validation::unique_ids("ticket_ids", &self.ticket_ids)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RaffleWinner {
    pub raffle_id: Uuid,
    pub attendee_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub code: String,
    pub drawn_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct RaffleDetail {
    #[serde(flatten)]
    pub raffle: Raffle,
    pub winners: Vec<RaffleWinner>,
    pub complete: bool,
}

impl RaffleDetail {
    pub fn new(raffle: Raffle, winners: Vec<RaffleWinner>) -> Self {
        let complete = winners.len() >= raffle.winner_count as usize;
        Self {
            raffle,
            winners,
            complete,
        }
    }
}
