use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::{
    Attendee, AttendeeDetails, AttendeeFilter, AttendeeStatus, AttendeeUpdate, Audience,
};
use crate::services::messaging::Recipient;
use crate::services::{codes, registration};
use crate::storage::tickets;
use crate::utils::error::{AppError, AppResult};

pub async fn list(pool: &PgPool, event_id: Uuid, filter: &AttendeeFilter) -> AppResult<Vec<Attendee>> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM attendees WHERE event_id = ");
    qb.push_bind(event_id);

    if let Some(ticket_id) = filter.ticket_id {
        qb.push(" AND ticket_id = ").push_bind(ticket_id);
    }
    match filter.checked_in {
        Some(true) => {
            qb.push(" AND checked_in_at IS NOT NULL");
        }
        Some(false) => {
            qb.push(" AND checked_in_at IS NULL");
        }
        None => {}
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.to_string());
    }
    if let Some(pattern) = filter.search_pattern() {
        qb.push(" AND ((first_name || ' ' || last_name) ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR code ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    qb.push(" ORDER BY last_name, first_name, created_at");

    let attendees = qb.build_query_as::<Attendee>().fetch_all(pool).await?;
    Ok(attendees)
}

pub async fn find(pool: &PgPool, event_id: Uuid, attendee_id: Uuid) -> AppResult<Attendee> {
    sqlx::query_as::<_, Attendee>("SELECT * FROM attendees WHERE id = $1 AND event_id = $2")
        .bind(attendee_id)
        .bind(event_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Attendee", attendee_id))
}

/// Finds an attendee by the check-in code printed in their QR.
pub async fn find_by_code(pool: &PgPool, event_id: Uuid, code: &str) -> AppResult<Attendee> {
    let code = code.trim().to_uppercase();
    sqlx::query_as::<_, Attendee>("SELECT * FROM attendees WHERE code = $1 AND event_id = $2")
        .bind(&code)
        .bind(event_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No attendee with code '{}'", code)))
}

pub async fn list_by_order(pool: &PgPool, order_id: Uuid) -> AppResult<Vec<Attendee>> {
    let attendees = sqlx::query_as::<_, Attendee>(
        "SELECT * FROM attendees WHERE order_id = $1 ORDER BY created_at, last_name, first_name",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;

    Ok(attendees)
}

/// Active, checked-in attendees: the raffle pool before ticket filtering.
pub async fn list_checked_in(conn: &mut PgConnection, event_id: Uuid) -> AppResult<Vec<Attendee>> {
    let attendees = sqlx::query_as::<_, Attendee>(
        "SELECT * FROM attendees
         WHERE event_id = $1 AND status = 'active' AND checked_in_at IS NOT NULL
         ORDER BY id",
    )
    .bind(event_id)
    .fetch_all(conn)
    .await?;

    Ok(attendees)
}

/// Inserts one seat holder with a new check-in code.
pub async fn insert(
    conn: &mut PgConnection,
    event_id: Uuid,
    order_id: Uuid,
    details: &AttendeeDetails,
) -> AppResult<Attendee> {
    let attendee = sqlx::query_as::<_, Attendee>(
        "INSERT INTO attendees
             (id, event_id, order_id, ticket_id, first_name, last_name, email, phone, code)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(event_id)
    .bind(order_id)
    .bind(details.ticket_id)
    .bind(&details.first_name)
    .bind(&details.last_name)
    .bind(&details.email)
    .bind(&details.phone)
    .bind(codes::attendee_code())
    .fetch_one(conn)
    .await?;

    Ok(attendee)
}

pub async fn cancel_for_order(conn: &mut PgConnection, order_id: Uuid) -> AppResult<()> {
    sqlx::query(
        "UPDATE attendees SET status = 'cancelled', updated_at = now() WHERE order_id = $1",
    )
    .bind(order_id)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn update(
    pool: &PgPool,
    event_id: Uuid,
    attendee_id: Uuid,
    update: &AttendeeUpdate,
) -> AppResult<Attendee> {
    sqlx::query_as::<_, Attendee>(
        "UPDATE attendees
         SET first_name = $3, last_name = $4, email = $5, phone = $6, updated_at = now()
         WHERE id = $1 AND event_id = $2
         RETURNING *",
    )
    .bind(attendee_id)
    .bind(event_id)
    .bind(&update.first_name)
    .bind(&update.last_name)
    .bind(&update.email)
    .bind(&update.phone)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Attendee", attendee_id))
}

/// Removes an attendee. An active attendee gives their seat back.
pub async fn delete(pool: &PgPool, event_id: Uuid, attendee_id: Uuid) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    let removed = sqlx::query_as::<_, Attendee>(
        "DELETE FROM attendees WHERE id = $1 AND event_id = $2 RETURNING *",
    )
    .bind(attendee_id)
    .bind(event_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Attendee", attendee_id))?;

    if removed.status == AttendeeStatus::Active {
        tickets::adjust_sold(&mut tx, removed.ticket_id, -1).await?;
    }

    tx.commit().await?;
    tracing::info!(%attendee_id, %event_id, "Attendee removed");
    Ok(())
}

/// Marks the attendee as arrived.
pub async fn check_in(pool: &PgPool, attendee: &Attendee) -> AppResult<Attendee> {
    registration::ensure_can_check_in(attendee)?;

    sqlx::query_as::<_, Attendee>(
        "UPDATE attendees SET checked_in_at = now(), updated_at = now()
         WHERE id = $1 AND status = 'active' AND checked_in_at IS NULL
         RETURNING *",
    )
    .bind(attendee.id)
    .fetch_optional(pool)
    .await?
    // Lost a race with another scanner.
    .ok_or_else(|| AppError::Conflict(format!("{} is already checked in", attendee.full_name())))
}

pub async fn undo_check_in(pool: &PgPool, event_id: Uuid, attendee_id: Uuid) -> AppResult<Attendee> {
    let updated = sqlx::query_as::<_, Attendee>(
        "UPDATE attendees SET checked_in_at = NULL, updated_at = now()
         WHERE id = $1 AND event_id = $2 AND checked_in_at IS NOT NULL
         RETURNING *",
    )
    .bind(attendee_id)
    .bind(event_id)
    .fetch_optional(pool)
    .await?;

    match updated {
        Some(attendee) => Ok(attendee),
        None => {
            let attendee = find(pool, event_id, attendee_id).await?;
            Err(AppError::Conflict(format!(
                "{} is not checked in",
                attendee.full_name()
            )))
        }
    }
}

#[derive(FromRow)]
struct RecipientRow {
    #[sqlx(flatten)]
    attendee: Attendee,
    ticket_name: String,
}

/// Active attendees matching a message audience, with their ticket names.
pub async fn recipients(
    pool: &PgPool,
    event_id: Uuid,
    audience: Audience,
    ticket_ids: &[Uuid],
) -> AppResult<Vec<Recipient>> {
    let mut qb = QueryBuilder::<Postgres>::new(
        "SELECT a.*, t.name AS ticket_name
         FROM attendees a
         JOIN tickets t ON t.id = a.ticket_id
         WHERE a.status = 'active' AND a.event_id = ",
    );
    qb.push_bind(event_id);

    match audience {
        Audience::All => {}
        Audience::Tickets => {
            qb.push(" AND a.ticket_id = ANY(").push_bind(ticket_ids.to_vec()).push(")");
        }
        Audience::CheckedIn => {
            qb.push(" AND a.checked_in_at IS NOT NULL");
        }
        Audience::NotCheckedIn => {
            qb.push(" AND a.checked_in_at IS NULL");
        }
    }
    qb.push(" ORDER BY a.created_at, a.id");

    let rows = qb.build_query_as::<RecipientRow>().fetch_all(pool).await?;
    Ok(rows
        .into_iter()
        .map(|row| Recipient {
            attendee: row.attendee,
            ticket_name: row.ticket_name,
        })
        .collect())
}
