use axum::response::Response;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Event, Organizer};
use crate::state::AppState;
use crate::storage;
use crate::utils::error::AppResult;
use crate::utils::response::success;

pub mod amenities;
pub mod attendees;
pub mod capacities;
pub mod events;
pub mod messages;
pub mod orders;
pub mod organizers;
pub mod promo_codes;
pub mod raffles;
pub mod registration_lists;
pub mod tickets;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "eventdesk-api",
    };

    success(payload, "Health check successful")
}

/// Resolves an event path segment, treating other organizers' events as missing.
async fn owned_event(state: &AppState, organizer: &Organizer, event_id: Uuid) -> AppResult<Event> {
    storage::events::find_owned(&state.pool, organizer.id, event_id).await
}
