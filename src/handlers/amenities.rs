use axum::extract::State;
use axum::response::Response;
use uuid::Uuid;

use super::owned_event;
use crate::auth::AuthOrganizer;
use crate::models::{AmenityForm, ClaimRequest};
use crate::state::AppState;
use crate::storage::amenities;
use crate::utils::error::AppResult;
use crate::utils::extract::{AppJson, AppPath};
use crate::utils::response::{created, empty_success, success};

pub async fn list(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath(event_id): AppPath<Uuid>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let amenities = amenities::list(&state.pool, event.id).await?;
    Ok(success(amenities, "Amenities retrieved"))
}

pub async fn create(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath(event_id): AppPath<Uuid>,
    AppJson(form): AppJson<AmenityForm>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let form = form.validate()?;
    let amenity = amenities::create(&state.pool, event.id, &form).await?;
    Ok(created(amenity, "Amenity created"))
}

pub async fn get(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath((event_id, amenity_id)): AppPath<(Uuid, Uuid)>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let amenity = amenities::find(&state.pool, event.id, amenity_id).await?;
    Ok(success(amenity, "Amenity retrieved"))
}

pub async fn update(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath((event_id, amenity_id)): AppPath<(Uuid, Uuid)>,
    AppJson(form): AppJson<AmenityForm>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let form = form.validate()?;
    let amenity = amenities::update(&state.pool, event.id, amenity_id, &form).await?;
    Ok(success(amenity, "Amenity updated"))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath((event_id, amenity_id)): AppPath<(Uuid, Uuid)>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    amenities::delete(&state.pool, event.id, amenity_id).await?;
    Ok(empty_success("Amenity deleted"))
}

pub async fn list_claims(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath((event_id, amenity_id)): AppPath<(Uuid, Uuid)>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let amenity = amenities::find(&state.pool, event.id, amenity_id).await?;
    let claims = amenities::list_claims(&state.pool, amenity.id).await?;
    Ok(success(claims, "Claims retrieved"))
}

pub async fn claim(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath((event_id, amenity_id)): AppPath<(Uuid, Uuid)>,
    AppJson(request): AppJson<ClaimRequest>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let amenity = amenities::find(&state.pool, event.id, amenity_id).await?;
    let claim = amenities::claim(&state.pool, &amenity, request.attendee_id).await?;
    Ok(created(claim, "Amenity claimed"))
}

pub async fn release(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath((event_id, amenity_id, attendee_id)): AppPath<(Uuid, Uuid, Uuid)>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let amenity = amenities::find(&state.pool, event.id, amenity_id).await?;
    amenities::release(&state.pool, amenity.id, attendee_id).await?;
    Ok(empty_success("Claim released"))
}
