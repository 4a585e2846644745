use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{RegistrationList, RegistrationListForm};
use crate::utils::error::{AppError, AppResult};

pub async fn list(pool: &PgPool, event_id: Uuid) -> AppResult<Vec<RegistrationList>> {
    let lists = sqlx::query_as::<_, RegistrationList>(
        "SELECT * FROM registration_lists WHERE event_id = $1 ORDER BY name",
    )
    .bind(event_id)
    .fetch_all(pool)
    .await?;

    Ok(lists)
}

pub async fn find(pool: &PgPool, event_id: Uuid, list_id: Uuid) -> AppResult<RegistrationList> {
    sqlx::query_as::<_, RegistrationList>(
        "SELECT * FROM registration_lists WHERE id = $1 AND event_id = $2",
    )
    .bind(list_id)
    .bind(event_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Registration list", list_id))
}

pub async fn create(
    pool: &PgPool,
    event_id: Uuid,
    form: &RegistrationListForm,
) -> AppResult<RegistrationList> {
    let list = sqlx::query_as::<_, RegistrationList>(
        "INSERT INTO registration_lists (id, event_id, name, ticket_ids, activates_at, expires_at)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(event_id)
    .bind(&form.name)
    .bind(&form.ticket_ids)
    .bind(form.activates_at)
    .bind(form.expires_at)
    .fetch_one(pool)
    .await?;

    Ok(list)
}

pub async fn update(
    pool: &PgPool,
    event_id: Uuid,
    list_id: Uuid,
    form: &RegistrationListForm,
) -> AppResult<RegistrationList> {
    sqlx::query_as::<_, RegistrationList>(
        "UPDATE registration_lists
         SET name = $3, ticket_ids = $4, activates_at = $5, expires_at = $6, updated_at = now()
         WHERE id = $1 AND event_id = $2
         RETURNING *",
    )
    .bind(list_id)
    .bind(event_id)
    .bind(&form.name)
    .bind(&form.ticket_ids)
    .bind(form.activates_at)
    .bind(form.expires_at)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Registration list", list_id))
}

pub async fn delete(pool: &PgPool, event_id: Uuid, list_id: Uuid) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM registration_lists WHERE id = $1 AND event_id = $2")
        .bind(list_id)
        .bind(event_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Registration list", list_id));
    }
    Ok(())
}
