use axum::extract::State;
use axum::response::Response;
use uuid::Uuid;

use crate::auth::AuthOrganizer;
use crate::models::{EventFilter, EventForm};
use crate::state::AppState;
use crate::storage::events;
use crate::utils::error::AppResult;
use crate::utils::extract::{AppJson, AppPath, AppQuery};
use crate::utils::response::{created, empty_success, success};

pub async fn list(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppQuery(filter): AppQuery<EventFilter>,
) -> AppResult<Response> {
    let events = events::list(&state.pool, organizer.id, &filter).await?;
    Ok(success(events, "Events retrieved"))
}

pub async fn create(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppJson(form): AppJson<EventForm>,
) -> AppResult<Response> {
    let form = form.validate()?;
    let event = events::create(&state.pool, organizer.id, &form).await?;
    tracing::info!(event_id = %event.id, organizer_id = %organizer.id, "Event created");
    Ok(created(event, "Event created"))
}

pub async fn get(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath(event_id): AppPath<Uuid>,
) -> AppResult<Response> {
    let event = events::find_owned(&state.pool, organizer.id, event_id).await?;
    Ok(success(event, "Event retrieved"))
}

pub async fn update(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath(event_id): AppPath<Uuid>,
    AppJson(form): AppJson<EventForm>,
) -> AppResult<Response> {
    let form = form.validate()?;
    let event = events::update(&state.pool, organizer.id, event_id, &form).await?;
    Ok(success(event, "Event updated"))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath(event_id): AppPath<Uuid>,
) -> AppResult<Response> {
    events::delete(&state.pool, organizer.id, event_id).await?;
    tracing::info!(%event_id, organizer_id = %organizer.id, "Event deleted");
    Ok(empty_success("Event deleted"))
}

/// Sales and attendance totals for the dashboard.
pub async fn summary(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath(event_id): AppPath<Uuid>,
) -> AppResult<Response> {
    let event = events::find_owned(&state.pool, organizer.id, event_id).await?;
    let summary = events::summary(&state.pool, event.id).await?;
    Ok(success(summary, "Event summary retrieved"))
}
