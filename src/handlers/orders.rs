use axum::extract::State;
use axum::response::Response;
use uuid::Uuid;

use super::owned_event;
use crate::auth::AuthOrganizer;
use crate::models::{NewOrder, OrderFilter, QuoteRequest};
use crate::state::AppState;
use crate::storage::orders;
use crate::utils::error::AppResult;
use crate::utils::extract::{AppJson, AppPath, AppQuery};
use crate::utils::response::{created, success};

pub async fn list(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath(event_id): AppPath<Uuid>,
    AppQuery(filter): AppQuery<OrderFilter>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let orders = orders::list(&state.pool, event.id, &filter).await?;
    Ok(success(orders, "Orders retrieved"))
}

pub async fn quote(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath(event_id): AppPath<Uuid>,
    AppJson(request): AppJson<QuoteRequest>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let quote = orders::quote(&state.pool, event.id, &request).await?;
    Ok(success(quote, "Quote calculated"))
}

pub async fn create(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath(event_id): AppPath<Uuid>,
    AppJson(new_order): AppJson<NewOrder>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let new_order = new_order.validate()?;
    let detail = orders::create(&state.pool, event.id, &new_order).await?;
    Ok(created(detail, "Order created"))
}

pub async fn get(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath((event_id, order_id)): AppPath<(Uuid, Uuid)>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let detail = orders::find_detail(&state.pool, event.id, order_id).await?;
    Ok(success(detail, "Order retrieved"))
}

pub async fn cancel(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath((event_id, order_id)): AppPath<(Uuid, Uuid)>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let order = orders::cancel(&state.pool, event.id, order_id).await?;
    Ok(success(order, "Order cancelled"))
}

pub async fn mark_paid(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath((event_id, order_id)): AppPath<(Uuid, Uuid)>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let order = orders::mark_paid(&state.pool, event.id, order_id).await?;
    Ok(success(order, "Order marked as paid"))
}
