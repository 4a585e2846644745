use axum::extract::State;
use axum::response::Response;
use uuid::Uuid;

use super::owned_event;
use crate::auth::AuthOrganizer;
use crate::models::{CapacityAssignment, CapacityForm, CapacityView, Ticket};
use crate::services::capacity;
use crate::state::AppState;
use crate::storage::{capacities, tickets};
use crate::utils::error::AppResult;
use crate::utils::extract::{AppJson, AppPath};
use crate::utils::response::{created, empty_success, success};

fn view(assignment: CapacityAssignment, tickets: &[Ticket]) -> CapacityView {
    let usage = capacity::usage(&assignment, tickets);
    CapacityView { assignment, usage }
}

pub async fn list(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath(event_id): AppPath<Uuid>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let tickets = tickets::list(&state.pool, event.id).await?;
    let views: Vec<CapacityView> = capacities::list(&state.pool, event.id)
        .await?
        .into_iter()
        .map(|assignment| view(assignment, &tickets))
        .collect();
    Ok(success(views, "Capacity assignments retrieved"))
}

pub async fn create(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath(event_id): AppPath<Uuid>,
    AppJson(form): AppJson<CapacityForm>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let form = form.validate()?;
    let tickets = tickets::list(&state.pool, event.id).await?;
    capacity::ensure_known_tickets(&form.ticket_ids, &tickets)?;

    let assignment = capacities::create(&state.pool, event.id, &form).await?;
    Ok(created(view(assignment, &tickets), "Capacity assignment created"))
}

pub async fn get(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath((event_id, capacity_id)): AppPath<(Uuid, Uuid)>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let assignment = capacities::find(&state.pool, event.id, capacity_id).await?;
    let tickets = tickets::list(&state.pool, event.id).await?;
    Ok(success(view(assignment, &tickets), "Capacity assignment retrieved"))
}

pub async fn update(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath((event_id, capacity_id)): AppPath<(Uuid, Uuid)>,
    AppJson(form): AppJson<CapacityForm>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let form = form.validate()?;
    let tickets = tickets::list(&state.pool, event.id).await?;
    capacity::ensure_known_tickets(&form.ticket_ids, &tickets)?;

    let assignment = capacities::update(&state.pool, event.id, capacity_id, &form).await?;
    Ok(success(view(assignment, &tickets), "Capacity assignment updated"))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath((event_id, capacity_id)): AppPath<(Uuid, Uuid)>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    capacities::delete(&state.pool, event.id, capacity_id).await?;
    Ok(empty_success("Capacity assignment deleted"))
}
