use axum::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Message, MessageForm, MessageStatus};
use crate::services::messaging::{Progress, ProgressSink};
use crate::utils::error::{AppError, AppResult};

/// Stores a message as `queued` for `total` recipients.
pub async fn create(
    pool: &PgPool,
    event_id: Uuid,
    form: &MessageForm,
    total: i32,
) -> AppResult<Message> {
    let message = sqlx::query_as::<_, Message>(
        "INSERT INTO messages
             (id, event_id, subject, body, audience, ticket_ids, include_qr, status, total)
         VALUES ($1, $2, $3, $4, $5, $6, $7, 'queued', $8)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(event_id)
    .bind(&form.subject)
    .bind(&form.body)
    .bind(form.audience.as_ref())
    .bind(&form.ticket_ids)
    .bind(form.include_qr)
    .bind(total)
    .fetch_one(pool)
    .await?;

    Ok(message)
}

pub async fn list(pool: &PgPool, event_id: Uuid) -> AppResult<Vec<Message>> {
    let messages = sqlx::query_as::<_, Message>(
        "SELECT * FROM messages WHERE event_id = $1 ORDER BY created_at DESC",
    )
    .bind(event_id)
    .fetch_all(pool)
    .await?;

    Ok(messages)
}

pub async fn find(pool: &PgPool, event_id: Uuid, message_id: Uuid) -> AppResult<Message> {
    sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = $1 AND event_id = $2")
        .bind(message_id)
        .bind(event_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Message", message_id))
}

pub async fn set_status(pool: &PgPool, message_id: Uuid, status: MessageStatus) -> AppResult<()> {
    sqlx::query("UPDATE messages SET status = $2, updated_at = now() WHERE id = $1")
        .bind(message_id)
        .bind(status.as_ref())
        .execute(pool)
        .await?;

    Ok(())
}

/// Writes the final tally and closes the message.
pub async fn finish(pool: &PgPool, message_id: Uuid, progress: &Progress) -> AppResult<()> {
    sqlx::query(
        "UPDATE messages
         SET status = $2, sent = $3, failed = $4, last_error = $5,
             completed_at = now(), updated_at = now()
         WHERE id = $1",
    )
    .bind(message_id)
    .bind(progress.final_status().as_ref())
    .bind(progress.sent)
    .bind(progress.failed)
    .bind(&progress.last_error)
    .execute(pool)
    .await?;

    Ok(())
}

/// Persists delivery counters on the message row after every attempt.
pub struct MessageProgress {
    pool: PgPool,
    message_id: Uuid,
}

impl MessageProgress {
    pub fn new(pool: PgPool, message_id: Uuid) -> Self {
        Self { pool, message_id }
    }
}

#[async_trait]
impl ProgressSink for MessageProgress {
    async fn record(&self, progress: &Progress) -> AppResult<()> {
        sqlx::query(
            "UPDATE messages SET sent = $2, failed = $3, last_error = $4, updated_at = now()
             WHERE id = $1",
        )
        .bind(self.message_id)
        .bind(progress.sent)
        .bind(progress.failed)
        .bind(&progress.last_error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
