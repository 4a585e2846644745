use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{Ticket, TicketForm};
use crate::utils::error::{AppError, AppResult};

/// Lists an event's tickets in display order.
pub async fn list(pool: &PgPool, event_id: Uuid) -> AppResult<Vec<Ticket>> {
    let tickets = sqlx::query_as::<_, Ticket>(
        "SELECT * FROM tickets WHERE event_id = $1 ORDER BY position, name",
    )
    .bind(event_id)
    .fetch_all(pool)
    .await?;

    Ok(tickets)
}

pub async fn find(pool: &PgPool, event_id: Uuid, ticket_id: Uuid) -> AppResult<Ticket> {
    sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE id = $1 AND event_id = $2")
        .bind(ticket_id)
        .bind(event_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Ticket", ticket_id))
}

/// Loads the given tickets, optionally locking them for the rest of the
/// caller's transaction.
///
/// Rows come back in id order, which is also the lock order, so concurrent
/// checkouts cannot deadlock.
pub async fn fetch_many(
    conn: &mut PgConnection,
    event_id: Uuid,
    ids: &[Uuid],
    lock: bool,
) -> AppResult<Vec<Ticket>> {
    let sql = if lock {
        "SELECT * FROM tickets WHERE event_id = $1 AND id = ANY($2) ORDER BY id FOR UPDATE"
    } else {
        "SELECT * FROM tickets WHERE event_id = $1 AND id = ANY($2) ORDER BY id"
    };

    let tickets = sqlx::query_as::<_, Ticket>(sql)
        .bind(event_id)
        .bind(ids)
        .fetch_all(conn)
        .await?;

    Ok(tickets)
}

/// Moves `sold` by `delta` (negative to release seats).
pub async fn adjust_sold(conn: &mut PgConnection, ticket_id: Uuid, delta: i32) -> AppResult<()> {
    sqlx::query(
        "UPDATE tickets SET sold = GREATEST(sold + $2, 0), updated_at = now() WHERE id = $1",
    )
    .bind(ticket_id)
    .bind(delta)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn create(pool: &PgPool, event_id: Uuid, form: &TicketForm) -> AppResult<Ticket> {
    let ticket = sqlx::query_as::<_, Ticket>(
        "INSERT INTO tickets
             (id, event_id, name, description, price, quantity, min_per_order, max_per_order,
              sales_start, sales_end, stages, hidden, position)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(event_id)
    .bind(&form.name)
    .bind(&form.description)
    .bind(form.price)
    .bind(form.quantity)
    .bind(form.min_per_order)
    .bind(form.max_per_order)
    .bind(form.sales_start)
    .bind(form.sales_end)
    .bind(Json(&form.stages))
    .bind(form.hidden)
    .bind(form.position)
    .fetch_one(pool)
    .await?;

    Ok(ticket)
}

/// Replaces a ticket's settings. Refuses to cap quantity below what is sold.
pub async fn update(
    pool: &PgPool,
    event_id: Uuid,
    ticket_id: Uuid,
    form: &TicketForm,
) -> AppResult<Ticket> {
    let updated = sqlx::query_as::<_, Ticket>(
        "UPDATE tickets
         SET name = $3, description = $4, price = $5, quantity = $6, min_per_order = $7,
             max_per_order = $8, sales_start = $9, sales_end = $10, stages = $11,
             hidden = $12, position = $13, updated_at = now()
         WHERE id = $1 AND event_id = $2 AND ($6::INTEGER IS NULL OR $6 >= sold)
         RETURNING *",
    )
    .bind(ticket_id)
    .bind(event_id)
    .bind(&form.name)
    .bind(&form.description)
    .bind(form.price)
    .bind(form.quantity)
    .bind(form.min_per_order)
    .bind(form.max_per_order)
    .bind(form.sales_start)
    .bind(form.sales_end)
    .bind(Json(&form.stages))
    .bind(form.hidden)
    .bind(form.position)
    .fetch_optional(pool)
    .await?;

    match updated {
        Some(ticket) => Ok(ticket),
        None => {
            let current = find(pool, event_id, ticket_id).await?;
            Err(AppError::validation(format!(
                "quantity cannot be lower than the {} already sold",
                current.sold
            )))
        }
    }
}

/// Deletes a ticket that has never been sold and drops it from the capacity
/// assignments and registration lists that name it.
///
/// Promo codes and raffles keep the stale id: an empty list there means
/// "every ticket", and a missing ticket can never match a cart or attendee.
pub async fn delete(pool: &PgPool, event_id: Uuid, ticket_id: Uuid) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query("DELETE FROM tickets WHERE id = $1 AND event_id = $2 AND sold = 0")
        .bind(ticket_id)
        .bind(event_id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        drop(tx);
        let current = find(pool, event_id, ticket_id).await?;
        return Err(AppError::Conflict(format!(
            "'{}' has {} sold seat(s) and cannot be deleted",
            current.name, current.sold
        )));
    }

    for table in ["capacity_assignments", "registration_lists"] {
        sqlx::query(&format!(
            "UPDATE {table} SET ticket_ids = array_remove(ticket_ids, $1), updated_at = now()
             WHERE event_id = $2 AND $1 = ANY(ticket_ids)"
        ))
        .bind(ticket_id)
        .bind(event_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}
