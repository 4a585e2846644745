use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Amenity, AmenityClaim, AmenityForm, Attendee, AttendeeStatus};
use crate::utils::error::{AppError, AppResult};

pub async fn list(pool: &PgPool, event_id: Uuid) -> AppResult<Vec<Amenity>> {
    let amenities =
        sqlx::query_as::<_, Amenity>("SELECT * FROM amenities WHERE event_id = $1 ORDER BY name")
            .bind(event_id)
            .fetch_all(pool)
            .await?;

    Ok(amenities)
}

pub async fn find(pool: &PgPool, event_id: Uuid, amenity_id: Uuid) -> AppResult<Amenity> {
    sqlx::query_as::<_, Amenity>("SELECT * FROM amenities WHERE id = $1 AND event_id = $2")
        .bind(amenity_id)
        .bind(event_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Amenity", amenity_id))
}

pub async fn create(pool: &PgPool, event_id: Uuid, form: &AmenityForm) -> AppResult<Amenity> {
    let amenity = sqlx::query_as::<_, Amenity>(
        "INSERT INTO amenities (id, event_id, name, description, quantity)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(event_id)
    .bind(&form.name)
    .bind(&form.description)
    .bind(form.quantity)
    .fetch_one(pool)
    .await?;

    Ok(amenity)
}

/// Replaces an amenity's settings. Quantity may not drop below what was claimed.
pub async fn update(
    pool: &PgPool,
    event_id: Uuid,
    amenity_id: Uuid,
    form: &AmenityForm,
) -> AppResult<Amenity> {
    let updated = sqlx::query_as::<_, Amenity>(
        "UPDATE amenities
         SET name = $3, description = $4, quantity = $5, updated_at = now()
         WHERE id = $1 AND event_id = $2 AND ($5::INTEGER IS NULL OR $5 >= claimed)
         RETURNING *",
    )
    .bind(amenity_id)
    .bind(event_id)
    .bind(&form.name)
    .bind(&form.description)
    .bind(form.quantity)
    .fetch_optional(pool)
    .await?;

    match updated {
        Some(amenity) => Ok(amenity),
        None => {
            let current = find(pool, event_id, amenity_id).await?;
            Err(AppError::validation(format!(
                "quantity cannot be lower than the {} already claimed",
                current.claimed
            )))
        }
    }
}

pub async fn delete(pool: &PgPool, event_id: Uuid, amenity_id: Uuid) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM amenities WHERE id = $1 AND event_id = $2")
        .bind(amenity_id)
        .bind(event_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Amenity", amenity_id));
    }
    Ok(())
}

pub async fn list_claims(pool: &PgPool, amenity_id: Uuid) -> AppResult<Vec<AmenityClaim>> {
    let claims = sqlx::query_as::<_, AmenityClaim>(
        "SELECT c.amenity_id, c.attendee_id, a.first_name, a.last_name, a.email, c.claimed_at
         FROM amenity_claims c
         JOIN attendees a ON a.id = c.attendee_id
         WHERE c.amenity_id = $1
         ORDER BY c.claimed_at",
    )
    .bind(amenity_id)
    .fetch_all(pool)
    .await?;

    Ok(claims)
}

/// Hands an amenity to an attendee.
///
/// Each attendee claims a given amenity at most once, and the counter is
/// only bumped while stock remains.
pub async fn claim(pool: &PgPool, amenity: &Amenity, attendee_id: Uuid) -> AppResult<AmenityClaim> {
    let mut tx = pool.begin().await?;

    let attendee = sqlx::query_as::<_, Attendee>(
        "SELECT * FROM attendees WHERE id = $1 AND event_id = $2",
    )
    .bind(attendee_id)
    .bind(amenity.event_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Attendee", attendee_id))?;

    if attendee.status != AttendeeStatus::Active {
        return Err(AppError::validation(
            "Cancelled attendees cannot claim amenities",
        ));
    }

    let claimed_at = sqlx::query_scalar::<_, chrono::DateTime<chrono::Utc>>(
        "INSERT INTO amenity_claims (amenity_id, attendee_id) VALUES ($1, $2) RETURNING claimed_at",
    )
    .bind(amenity.id)
    .bind(attendee.id)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| match AppError::from(e) {
        AppError::Conflict(_) => AppError::Conflict(format!(
            "{} already claimed '{}'",
            attendee.full_name(),
            amenity.name
        )),
        other => other,
    })?;

    let stocked = sqlx::query(
        "UPDATE amenities SET claimed = claimed + 1, updated_at = now()
         WHERE id = $1 AND (quantity IS NULL OR claimed < quantity)",
    )
    .bind(amenity.id)
    .execute(&mut *tx)
    .await?;
    if stocked.rows_affected() == 0 {
        return Err(AppError::Conflict(format!(
            "'{}' has run out",
            amenity.name
        )));
    }

    tx.commit().await?;
    tracing::debug!(amenity_id = %amenity.id, %attendee_id, "Amenity claimed");

    Ok(AmenityClaim {
        amenity_id: amenity.id,
        attendee_id: attendee.id,
        first_name: attendee.first_name,
        last_name: attendee.last_name,
        email: attendee.email,
        claimed_at,
    })
}

/// Undoes a claim and returns the item to stock.
pub async fn release(pool: &PgPool, amenity_id: Uuid, attendee_id: Uuid) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    let removed = sqlx::query(
        "DELETE FROM amenity_claims WHERE amenity_id = $1 AND attendee_id = $2",
    )
    .bind(amenity_id)
    .bind(attendee_id)
    .execute(&mut *tx)
    .await?;
    if removed.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "Attendee {} has not claimed this amenity",
            attendee_id
        )));
    }

    sqlx::query(
        "UPDATE amenities SET claimed = GREATEST(claimed - 1, 0), updated_at = now() WHERE id = $1",
    )
    .bind(amenity_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
