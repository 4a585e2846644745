use axum::extract::State;
use axum::response::Response;
use uuid::Uuid;

use super::owned_event;
use crate::auth::AuthOrganizer;
use crate::models::TicketForm;
use crate::state::AppState;
use crate::storage::tickets;
use crate::utils::error::AppResult;
use crate::utils::extract::{AppJson, AppPath};
use crate::utils::response::{created, empty_success, success};

pub async fn list(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath(event_id): AppPath<Uuid>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let tickets = tickets::list(&state.pool, event.id).await?;
    Ok(success(tickets, "Tickets retrieved"))
}

pub async fn create(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath(event_id): AppPath<Uuid>,
    AppJson(form): AppJson<TicketForm>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let form = form.validate()?;
    let ticket = tickets::create(&state.pool, event.id, &form).await?;
    tracing::info!(ticket_id = %ticket.id, %event_id, "Ticket created");
    Ok(created(ticket, "Ticket created"))
}

pub async fn get(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath((event_id, ticket_id)): AppPath<(Uuid, Uuid)>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let ticket = tickets::find(&state.pool, event.id, ticket_id).await?;
    Ok(success(ticket, "Ticket retrieved"))
}

pub async fn update(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath((event_id, ticket_id)): AppPath<(Uuid, Uuid)>,
    AppJson(form): AppJson<TicketForm>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let form = form.validate()?;
    let ticket = tickets::update(&state.pool, event.id, ticket_id, &form).await?;
    Ok(success(ticket, "Ticket updated"))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath((event_id, ticket_id)): AppPath<(Uuid, Uuid)>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    tickets::delete(&state.pool, event.id, ticket_id).await?;
    Ok(empty_success("Ticket deleted"))
}
