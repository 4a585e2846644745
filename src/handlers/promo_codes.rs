use axum::extract::State;
use axum::response::Response;
use uuid::Uuid;

use super::owned_event;
use crate::auth::AuthOrganizer;
use crate::models::{PromoCheck, PromoCodeForm};
use crate::services::capacity::ensure_known_tickets;
use crate::state::AppState;
use crate::storage::{orders, promo_codes, tickets};
use crate::utils::error::AppResult;
use crate::utils::extract::{AppJson, AppPath};
use crate::utils::response::{created, empty_success, success};

pub async fn list(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath(event_id): AppPath<Uuid>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let codes = promo_codes::list(&state.pool, event.id).await?;
    Ok(success(codes, "Promo codes retrieved"))
}

pub async fn create(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath(event_id): AppPath<Uuid>,
    AppJson(form): AppJson<PromoCodeForm>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let form = form.validate()?;
    ensure_known_tickets(&form.ticket_ids, &tickets::list(&state.pool, event.id).await?)?;

    let promo = promo_codes::create(&state.pool, event.id, &form).await?;
    tracing::info!(promo_id = %promo.id, code = %promo.code, %event_id, "Promo code created");
    Ok(created(promo, "Promo code created"))
}

pub async fn get(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath((event_id, promo_id)): AppPath<(Uuid, Uuid)>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let promo = promo_codes::find(&state.pool, event.id, promo_id).await?;
    Ok(success(promo, "Promo code retrieved"))
}

pub async fn update(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath((event_id, promo_id)): AppPath<(Uuid, Uuid)>,
    AppJson(form): AppJson<PromoCodeForm>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let form = form.validate()?;
    ensure_known_tickets(&form.ticket_ids, &tickets::list(&state.pool, event.id).await?)?;

    let promo = promo_codes::update(&state.pool, event.id, promo_id, &form).await?;
    Ok(success(promo, "Promo code updated"))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath((event_id, promo_id)): AppPath<(Uuid, Uuid)>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    promo_codes::delete(&state.pool, event.id, promo_id).await?;
    Ok(empty_success("Promo code deleted"))
}

/// Prices a cart with the code applied, without redeeming it.
pub async fn validate(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath(event_id): AppPath<Uuid>,
    AppJson(check): AppJson<PromoCheck>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let request = check.into_quote_request()?;
    let quote = orders::quote(&state.pool, event.id, &request).await?;
    Ok(success(quote, "Promo code is valid"))
}
