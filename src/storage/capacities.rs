use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{CapacityAssignment, CapacityForm};
use crate::utils::error::{AppError, AppResult};

pub async fn list(pool: &PgPool, event_id: Uuid) -> AppResult<Vec<CapacityAssignment>> {
    let assignments = sqlx::query_as::<_, CapacityAssignment>(
        "SELECT * FROM capacity_assignments WHERE event_id = $1 ORDER BY name",
    )
    .bind(event_id)
    .fetch_all(pool)
    .await?;

    Ok(assignments)
}

/// Assignments that cover at least one of `ticket_ids`.
pub async fn list_touching(
    conn: &mut PgConnection,
    event_id: Uuid,
    ticket_ids: &[Uuid],
) -> AppResult<Vec<CapacityAssignment>> {
    let assignments = sqlx::query_as::<_, CapacityAssignment>(
        "SELECT * FROM capacity_assignments WHERE event_id = $1 AND ticket_ids && $2",
    )
    .bind(event_id)
    .bind(ticket_ids)
    .fetch_all(conn)
    .await?;

    Ok(assignments)
}

pub async fn find(pool: &PgPool, event_id: Uuid, capacity_id: Uuid) -> AppResult<CapacityAssignment> {
    sqlx::query_as::<_, CapacityAssignment>(
        "SELECT * FROM capacity_assignments WHERE id = $1 AND event_id = $2",
    )
    .bind(capacity_id)
    .bind(event_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Capacity assignment", capacity_id))
}

pub async fn create(
    pool: &PgPool,
    event_id: Uuid,
    form: &CapacityForm,
) -> AppResult<CapacityAssignment> {
    let assignment = sqlx::query_as::<_, CapacityAssignment>(
        "INSERT INTO capacity_assignments (id, event_id, name, capacity, ticket_ids)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(event_id)
    .bind(&form.name)
    .bind(form.capacity)
    .bind(&form.ticket_ids)
    .fetch_one(pool)
    .await?;

    Ok(assignment)
}

pub async fn update(
    pool: &PgPool,
    event_id: Uuid,
    capacity_id: Uuid,
    form: &CapacityForm,
) -> AppResult<CapacityAssignment> {
    sqlx::query_as::<_, CapacityAssignment>(
        "UPDATE capacity_assignments
         SET name = $3, capacity = $4, ticket_ids = $5, updated_at = now()
         WHERE id = $1 AND event_id = $2
         RETURNING *",
    )
    .bind(capacity_id)
    .bind(event_id)
    .bind(&form.name)
    .bind(form.capacity)
    .bind(&form.ticket_ids)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Capacity assignment", capacity_id))
}

pub async fn delete(pool: &PgPool, event_id: Uuid, capacity_id: Uuid) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM capacity_assignments WHERE id = $1 AND event_id = $2")
        .bind(capacity_id)
        .bind(event_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Capacity assignment", capacity_id));
    }
    Ok(())
}
