use axum::extract::State;
use axum::response::Response;
use uuid::Uuid;

use super::owned_event;
use crate::auth::AuthOrganizer;
use crate::models::{AttendeeFilter, AttendeeUpdate};
use crate::state::AppState;
use crate::storage::attendees;
use crate::utils::error::AppResult;
use crate::utils::extract::{AppJson, AppPath, AppQuery};
use crate::utils::response::{empty_success, success};

pub async fn list(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath(event_id): AppPath<Uuid>,
    AppQuery(filter): AppQuery<AttendeeFilter>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let attendees = attendees::list(&state.pool, event.id, &filter).await?;
    Ok(success(attendees, "Attendees retrieved"))
}

pub async fn get(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath((event_id, attendee_id)): AppPath<(Uuid, Uuid)>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let attendee = attendees::find(&state.pool, event.id, attendee_id).await?;
    Ok(success(attendee, "Attendee retrieved"))
}

pub async fn update(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath((event_id, attendee_id)): AppPath<(Uuid, Uuid)>,
    AppJson(update): AppJson<AttendeeUpdate>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let update = update.validate()?;
    let attendee = attendees::update(&state.pool, event.id, attendee_id, &update).await?;
    Ok(success(attendee, "Attendee updated"))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath((event_id, attendee_id)): AppPath<(Uuid, Uuid)>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    attendees::delete(&state.pool, event.id, attendee_id).await?;
    Ok(empty_success("Attendee deleted"))
}

pub async fn check_in(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath((event_id, attendee_id)): AppPath<(Uuid, Uuid)>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let attendee = attendees::find(&state.pool, event.id, attendee_id).await?;
    let attendee = attendees::check_in(&state.pool, &attendee).await?;
    tracing::info!(%attendee_id, %event_id, "Attendee checked in");
    Ok(success(attendee, "Attendee checked in"))
}

pub async fn undo_check_in(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath((event_id, attendee_id)): AppPath<(Uuid, Uuid)>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let attendee = attendees::undo_check_in(&state.pool, event.id, attendee_id).await?;
    Ok(success(attendee, "Check-in undone"))
}
