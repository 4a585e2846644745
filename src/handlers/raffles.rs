use axum::extract::State;
use axum::response::Response;
use uuid::Uuid;

use super::owned_event;
use crate::auth::AuthOrganizer;
use crate::models::RaffleForm;
use crate::services::capacity::ensure_known_tickets;
use crate::state::AppState;
use crate::storage::{raffles, tickets};
use crate::utils::error::AppResult;
use crate::utils::extract::{AppJson, AppPath};
use crate::utils::response::{created, empty_success, success};

pub async fn list(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath(event_id): AppPath<Uuid>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let raffles = raffles::list(&state.pool, event.id).await?;
    Ok(success(raffles, "Raffles retrieved"))
}

pub async fn create(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath(event_id): AppPath<Uuid>,
    AppJson(form): AppJson<RaffleForm>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let form = form.validate()?;
    ensure_known_tickets(&form.ticket_ids, &tickets::list(&state.pool, event.id).await?)?;

    let raffle = raffles::create(&state.pool, event.id, &form).await?;
    Ok(created(raffle, "Raffle created"))
}

pub async fn get(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath((event_id, raffle_id)): AppPath<(Uuid, Uuid)>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let detail = raffles::find_detail(&state.pool, event.id, raffle_id).await?;
    Ok(success(detail, "Raffle retrieved"))
}

pub async fn update(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath((event_id, raffle_id)): AppPath<(Uuid, Uuid)>,
    AppJson(form): AppJson<RaffleForm>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let form = form.validate()?;
    ensure_known_tickets(&form.ticket_ids, &tickets::list(&state.pool, event.id).await?)?;

    let raffle = raffles::update(&state.pool, event.id, raffle_id, &form).await?;
    Ok(success(raffle, "Raffle updated"))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath((event_id, raffle_id)): AppPath<(Uuid, Uuid)>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    raffles::delete(&state.pool, event.id, raffle_id).await?;
    Ok(empty_success("Raffle deleted"))
}

pub async fn draw(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath((event_id, raffle_id)): AppPath<(Uuid, Uuid)>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let winner = raffles::draw(&state.pool, event.id, raffle_id).await?;
    Ok(created(winner, "Winner drawn"))
}

pub async fn winners(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath((event_id, raffle_id)): AppPath<(Uuid, Uuid)>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let detail = raffles::find_detail(&state.pool, event.id, raffle_id).await?;
    Ok(success(detail.winners, "Winners retrieved"))
}

pub async fn remove_winner(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath((event_id, raffle_id, attendee_id)): AppPath<(Uuid, Uuid, Uuid)>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let raffle = raffles::find(&state.pool, event.id, raffle_id).await?;
    raffles::remove_winner(&state.pool, raffle.id, attendee_id).await?;
    Ok(empty_success("Winner removed"))
}
