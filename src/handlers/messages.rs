use std::sync::Arc;

use axum::extract::State;
use axum::response::Response;
use sqlx::PgPool;
use uuid::Uuid;

use super::owned_event;
use crate::auth::AuthOrganizer;
use crate::mailer::Mailer;
use crate::models::{Audience, MessageForm, MessageStatus};
use crate::services::capacity::ensure_known_tickets;
use crate::services::messaging::{self, Campaign, Recipient};
use crate::state::AppState;
use crate::storage::messages::{self, MessageProgress};
use crate::storage::{attendees, tickets};
use crate::utils::error::{AppError, AppResult};
use crate::utils::extract::{AppJson, AppPath};
use crate::utils::response::{created, success};

pub async fn list(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath(event_id): AppPath<Uuid>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let messages = messages::list(&state.pool, event.id).await?;
    Ok(success(messages, "Messages retrieved"))
}

pub async fn get(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath((event_id, message_id)): AppPath<(Uuid, Uuid)>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let message = messages::find(&state.pool, event.id, message_id).await?;
    Ok(success(message, "Message retrieved"))
}

/// Queues a message and starts sending it in the background.
pub async fn create(
    State(state): State<AppState>,
    AuthOrganizer(organizer): AuthOrganizer,
    AppPath(event_id): AppPath<Uuid>,
    AppJson(form): AppJson<MessageForm>,
) -> AppResult<Response> {
    let event = owned_event(&state, &organizer, event_id).await?;
    let form = form.validate()?;
    if form.audience == Audience::Tickets {
        ensure_known_tickets(&form.ticket_ids, &tickets::list(&state.pool, event.id).await?)?;
    }

    let recipients =
        attendees::recipients(&state.pool, event.id, form.audience, &form.ticket_ids).await?;
    if recipients.is_empty() {
        return Err(AppError::validation(
            "No active attendees match this audience",
        ));
    }
    let total = i32::try_from(recipients.len())
        .map_err(|_| AppError::validation("Too many recipients for one message"))?;

    let message = messages::create(&state.pool, event.id, &form, total).await?;
    tracing::info!(message_id = %message.id, %event_id, total, "Message queued");

    let campaign = Campaign {
        subject: form.subject,
        body: form.body,
        include_qr: form.include_qr,
        event_title: event.title,
    };
    tokio::spawn(send_in_background(
        state.pool.clone(),
        state.mailer.clone(),
        message.id,
        campaign,
        recipients,
    ));

    Ok(created(message, "Message queued for delivery"))
}

async fn send_in_background(
    pool: PgPool,
    mailer: Arc<dyn Mailer>,
    message_id: Uuid,
    campaign: Campaign,
    recipients: Vec<Recipient>,
) {
    if let Err(e) = messages::set_status(&pool, message_id, MessageStatus::Sending).await {
        tracing::error!(%message_id, error = %e, "Could not mark message as sending");
    }

    let sink = MessageProgress::new(pool.clone(), message_id);
    let progress = messaging::deliver(&*mailer, &sink, &campaign, &recipients).await;

    match messages::finish(&pool, message_id, &progress).await {
        Ok(()) => tracing::info!(
            %message_id,
            sent = progress.sent,
            failed = progress.failed,
            status = %progress.final_status(),
            "Message delivery finished"
        ),
        Err(e) => tracing::error!(%message_id, error = %e, "Could not record message result"),
    }
}
