use axum::extract::State;
use axum::response::Response;
use chrono::Utc;
use uuid::Uuid;

use super::owned_event;
use crate::auth::AuthOrganizer;
use crate::models::{CodeCheckIn, RegistrationList, RegistrationListForm, RegistrationListView};
use crate::services::capacity::ensure_known_tickets;
use crate::services::registration;
use crate::state::AppState;
use crate::storage::{attendees, registration_lists, tickets};
use crate::utils::error::AppResult;
use crate::utils::extract::{AppJson, AppPath};
use crate::utils::response::{created, empty_success, success};
use crate::utils::validation;

fn view(list: RegistrationList) -> RegistrationListView {
    let window = registration::window(&list, Utc::now());
    RegistrationListView { list, window }
}

pub async fn list(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath(event_id): AppPath<Uuid>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let lists: Vec<RegistrationListView> = registration_lists::list(&state.pool, event.id)
        .await?
        .into_iter()
        .map(view)
        .collect();
    Ok(success(lists, "Registration lists retrieved"))
}

pub async fn create(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath(event_id): AppPath<Uuid>,
    AppJson(form): AppJson<RegistrationListForm>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let form = form.validate()?;
    ensure_known_tickets(&form.ticket_ids, &tickets::list(&state.pool, event.id).await?)?;

    let list = registration_lists::create(&state.pool, event.id, &form).await?;
    Ok(created(view(list), "Registration list created"))
}

pub async fn get(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath((event_id, list_id)): AppPath<(Uuid, Uuid)>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let list = registration_lists::find(&state.pool, event.id, list_id).await?;
    Ok(success(view(list), "Registration list retrieved"))
}

pub async fn update(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath((event_id, list_id)): AppPath<(Uuid, Uuid)>,
    AppJson(form): AppJson<RegistrationListForm>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let form = form.validate()?;
    ensure_known_tickets(&form.ticket_ids, &tickets::list(&state.pool, event.id).await?)?;

    let list = registration_lists::update(&state.pool, event.id, list_id, &form).await?;
    Ok(success(view(list), "Registration list updated"))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath((event_id, list_id)): AppPath<(Uuid, Uuid)>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    registration_lists::delete(&state.pool, event.id, list_id).await?;
    Ok(empty_success("Registration list deleted"))
}

/// Door scan: checks in whoever holds `code` if this list admits them.
pub async fn check_in(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath((event_id, list_id)): AppPath<(Uuid, Uuid)>,
    AppJson(scan): AppJson<CodeCheckIn>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let code = validation::required("code", &scan.code)?;
    let list = registration_lists::find(&state.pool, event.id, list_id).await?;
    let now = Utc::now();
    registration::ensure_open(&list, now)?;

    let attendee = attendees::find_by_code(&state.pool, event.id, &code).await?;
    registration::ensure_admits(&list, &attendee, now)?;
    let attendee = attendees::check_in(&state.pool, &attendee).await?;

    tracing::info!(attendee_id = %attendee.id, %list_id, "Attendee checked in at the door");
    Ok(success(attendee, "Attendee checked in"))
}
