use std::collections::HashSet;

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{Raffle, RaffleDetail, RaffleForm, RaffleWinner};
use crate::services::raffle;
use crate::storage::attendees;
use crate::utils::error::{AppError, AppResult};

pub async fn list(pool: &PgPool, event_id: Uuid) -> AppResult<Vec<Raffle>> {
    let raffles = sqlx::query_as::<_, Raffle>(
        "SELECT * FROM raffles WHERE event_id = $1 ORDER BY created_at",
    )
    .bind(event_id)
    .fetch_all(pool)
    .await?;

    Ok(raffles)
}

pub async fn find(pool: &PgPool, event_id: Uuid, raffle_id: Uuid) -> AppResult<Raffle> {
    sqlx::query_as::<_, Raffle>("SELECT * FROM raffles WHERE id = $1 AND event_id = $2")
        .bind(raffle_id)
        .bind(event_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Raffle", raffle_id))
}

pub async fn find_detail(pool: &PgPool, event_id: Uuid, raffle_id: Uuid) -> AppResult<RaffleDetail> {
    let raffle = find(pool, event_id, raffle_id).await?;
    let winners = winners(&mut *pool.acquire().await?, raffle_id).await?;
    Ok(RaffleDetail::new(raffle, winners))
}

pub async fn create(pool: &PgPool, event_id: Uuid, form: &RaffleForm) -> AppResult<Raffle> {
    let raffle = sqlx::query_as::<_, Raffle>(
        "INSERT INTO raffles (id, event_id, name, prize, description, winner_count, ticket_ids)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(event_id)
    .bind(&form.name)
    .bind(&form.prize)
    .bind(&form.description)
    .bind(form.winner_count)
    .bind(&form.ticket_ids)
    .fetch_one(pool)
    .await?;

    Ok(raffle)
}

pub async fn update(
    pool: &PgPool,
    event_id: Uuid,
    raffle_id: Uuid,
    form: &RaffleForm,
) -> AppResult<Raffle> {
    sqlx::query_as::<_, Raffle>(
        "UPDATE raffles
         SET name = $3, prize = $4, description = $5, winner_count = $6, ticket_ids = $7,
             updated_at = now()
         WHERE id = $1 AND event_id = $2
         RETURNING *",
    )
    .bind(raffle_id)
    .bind(event_id)
    .bind(&form.name)
    .bind(&form.prize)
    .bind(&form.description)
    .bind(form.winner_count)
    .bind(&form.ticket_ids)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Raffle", raffle_id))
}

pub async fn delete(pool: &PgPool, event_id: Uuid, raffle_id: Uuid) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM raffles WHERE id = $1 AND event_id = $2")
        .bind(raffle_id)
        .bind(event_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Raffle", raffle_id));
    }
    Ok(())
}

pub async fn winners(conn: &mut PgConnection, raffle_id: Uuid) -> AppResult<Vec<RaffleWinner>> {
    let winners = sqlx::query_as::<_, RaffleWinner>(
        "SELECT w.raffle_id, w.attendee_id, a.first_name, a.last_name, a.email, a.code, w.drawn_at
         FROM raffle_winners w
         JOIN attendees a ON a.id = w.attendee_id
         WHERE w.raffle_id = $1
         ORDER BY w.drawn_at",
    )
    .bind(raffle_id)
    .fetch_all(conn)
    .await?;

    Ok(winners)
}

/// Draws one more winner.
///
/// The raffle row is locked for the duration so two concurrent draws cannot
/// both take the last slot or pick the same attendee.
pub async fn draw(pool: &PgPool, event_id: Uuid, raffle_id: Uuid) -> AppResult<RaffleWinner> {
    let mut tx = pool.begin().await?;

    let locked = sqlx::query_as::<_, Raffle>(
        "SELECT * FROM raffles WHERE id = $1 AND event_id = $2 FOR UPDATE",
    )
    .bind(raffle_id)
    .bind(event_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Raffle", raffle_id))?;

    let previous: HashSet<Uuid> = winners(&mut tx, raffle_id)
        .await?
        .into_iter()
        .map(|w| w.attendee_id)
        .collect();
    let pool_members = attendees::list_checked_in(&mut tx, event_id).await?;

    let picked = {
        let mut rng = rand::thread_rng();
        raffle::draw(&locked, &pool_members, &previous, &mut rng)?.clone()
    };

    let drawn_at = sqlx::query_scalar::<_, chrono::DateTime<chrono::Utc>>(
        "INSERT INTO raffle_winners (raffle_id, attendee_id) VALUES ($1, $2) RETURNING drawn_at",
    )
    .bind(raffle_id)
    .bind(picked.id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    tracing::info!(%raffle_id, attendee_id = %picked.id, "Raffle winner drawn");

    Ok(RaffleWinner {
        raffle_id,
        attendee_id: picked.id,
        first_name: picked.first_name,
        last_name: picked.last_name,
        email: picked.email,
        code: picked.code,
        drawn_at,
    })
}

/// Voids a win so the slot can be drawn again.
pub async fn remove_winner(pool: &PgPool, raffle_id: Uuid, attendee_id: Uuid) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM raffle_winners WHERE raffle_id = $1 AND attendee_id = $2")
        .bind(raffle_id)
        .bind(attendee_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "Attendee {} is not a winner of this raffle",
            attendee_id
        )));
    }
    Ok(())
}
