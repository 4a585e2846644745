use axum::extract::State;
use axum::response::Response;

use crate::auth::AuthOrganizer;
use crate::models::{NewOrganizer, RegisteredOrganizer};
use crate::state::AppState;
use crate::storage::organizers;
use crate::utils::error::AppResult;
use crate::utils::extract::AppJson;
use crate::utils::response::{created, success};

pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<NewOrganizer>,
) -> AppResult<Response> {
    let payload = payload.validate()?;
    let organizer = organizers::create(&state.pool, &payload).await?;
    tracing::info!(organizer_id = %organizer.id, "Organizer registered");

    Ok(created(
        RegisteredOrganizer::from(organizer),
        "Organizer registered. Store the API token, it will not be shown again",
    ))
}

pub async fn me(AuthOrganizer(organizer): AuthOrganizer) -> AppResult<Response> {
    Ok(success(organizer, "Organizer retrieved"))
}
