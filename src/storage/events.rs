use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Event, EventFilter, EventForm, EventSummary, TicketSales};
use crate::utils::error::{AppError, AppResult};

pub async fn create(pool: &PgPool, organizer_id: Uuid, form: &EventForm) -> AppResult<Event> {
    let event = sqlx::query_as::<_, Event>(
        "INSERT INTO events
             (id, organizer_id, title, description, location, start_time, end_time, status, currency)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(organizer_id)
    .bind(&form.title)
    .bind(&form.description)
    .bind(&form.location)
    .bind(form.start_time)
    .bind(form.end_time)
    .bind(form.status.as_ref())
    .bind(&form.currency)
    .fetch_one(pool)
    .await?;

    Ok(event)
}

/// Lists an organizer's events, newest start first.
pub async fn list(pool: &PgPool, organizer_id: Uuid, filter: &EventFilter) -> AppResult<Vec<Event>> {
    let events = sqlx::query_as::<_, Event>(
        "SELECT * FROM events
         WHERE organizer_id = $1 AND ($2::TEXT IS NULL OR status = $2)
         ORDER BY start_time DESC",
    )
    .bind(organizer_id)
    .bind(filter.status.map(|s| s.to_string()))
    .fetch_all(pool)
    .await?;

    Ok(events)
}

/// Loads an event only if it belongs to `organizer_id`.
///
/// Foreign events read as missing so their existence is not revealed.
pub async fn find_owned(pool: &PgPool, organizer_id: Uuid, event_id: Uuid) -> AppResult<Event> {
    sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1 AND organizer_id = $2")
        .bind(event_id)
        .bind(organizer_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Event", event_id))
}

pub async fn update(
    pool: &PgPool,
    organizer_id: Uuid,
    event_id: Uuid,
    form: &EventForm,
) -> AppResult<Event> {
    sqlx::query_as::<_, Event>(
        "UPDATE events
         SET title = $3, description = $4, location = $5, start_time = $6, end_time = $7,
             status = $8, currency = $9, updated_at = now()
         WHERE id = $1 AND organizer_id = $2
         RETURNING *",
    )
    .bind(event_id)
    .bind(organizer_id)
    .bind(&form.title)
    .bind(&form.description)
    .bind(&form.location)
    .bind(form.start_time)
    .bind(form.end_time)
    .bind(form.status.as_ref())
    .bind(&form.currency)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Event", event_id))
}

/// Deletes an event and, through cascades, everything it owns.
pub async fn delete(pool: &PgPool, organizer_id: Uuid, event_id: Uuid) -> AppResult<()> {
    // Children reference tickets with RESTRICT, so clear them before the event row.
    let mut tx = pool.begin().await?;

    let owned = sqlx::query("SELECT 1 FROM events WHERE id = $1 AND organizer_id = $2 FOR UPDATE")
        .bind(event_id)
        .bind(organizer_id)
        .fetch_optional(&mut *tx)
        .await?;
    if owned.is_none() {
        return Err(AppError::not_found("Event", event_id));
    }

    sqlx::query("DELETE FROM orders WHERE event_id = $1")
        .bind(event_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM events WHERE id = $1")
        .bind(event_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

pub async fn summary(pool: &PgPool, event_id: Uuid) -> AppResult<EventSummary> {
    let tickets = sqlx::query_as::<_, TicketSales>(
        "SELECT t.id AS ticket_id,
                t.name,
                t.sold,
                CASE WHEN t.quantity IS NULL THEN NULL
                     ELSE GREATEST(t.quantity - t.sold, 0) END AS remaining,
                COALESCE((
                    SELECT SUM(oi.quantity * oi.unit_price - oi.discount)
                    FROM order_items oi
                    JOIN orders o ON o.id = oi.order_id
                    WHERE oi.ticket_id = t.id AND o.status = 'paid'
                ), 0)::NUMERIC AS revenue
         FROM tickets t
         WHERE t.event_id = $1
         ORDER BY t.position, t.name",
    )
    .bind(event_id)
    .fetch_all(pool)
    .await?;

    let (orders, attendees, checked_in, revenue) =
        sqlx::query_as::<_, (i64, i64, i64, Decimal)>(
            "SELECT
                (SELECT COUNT(*) FROM orders WHERE event_id = $1),
                (SELECT COUNT(*) FROM attendees WHERE event_id = $1 AND status = 'active'),
                (SELECT COUNT(*) FROM attendees
                  WHERE event_id = $1 AND status = 'active' AND checked_in_at IS NOT NULL),
                (SELECT COALESCE(SUM(total), 0)::NUMERIC FROM orders
                  WHERE event_id = $1 AND status = 'paid')",
        )
        .bind(event_id)
        .fetch_one(pool)
        .await?;

    Ok(EventSummary {
        event_id,
        tickets,
        orders,
        attendees,
        checked_in,
        revenue,
    })
}
