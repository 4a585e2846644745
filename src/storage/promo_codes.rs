use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{PromoCode, PromoCodeForm};
use crate::utils::error::{AppError, AppResult};

pub async fn list(pool: &PgPool, event_id: Uuid) -> AppResult<Vec<PromoCode>> {
    let codes = sqlx::query_as::<_, PromoCode>(
        "SELECT * FROM promo_codes WHERE event_id = $1 ORDER BY created_at DESC",
    )
    .bind(event_id)
    .fetch_all(pool)
    .await?;

    Ok(codes)
}

pub async fn find(pool: &PgPool, event_id: Uuid, promo_id: Uuid) -> AppResult<PromoCode> {
    sqlx::query_as::<_, PromoCode>("SELECT * FROM promo_codes WHERE id = $1 AND event_id = $2")
        .bind(promo_id)
        .bind(event_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Promo code", promo_id))
}

/// Looks up a normalised code. With `lock` set the row stays locked until
/// the caller's transaction ends, so `uses` cannot race past `max_uses`.
pub async fn find_by_code(
    conn: &mut PgConnection,
    event_id: Uuid,
    code: &str,
    lock: bool,
) -> AppResult<PromoCode> {
    let sql = if lock {
        "SELECT * FROM promo_codes WHERE event_id = $1 AND code = $2 FOR UPDATE"
    } else {
        "SELECT * FROM promo_codes WHERE event_id = $1 AND code = $2"
    };

    sqlx::query_as::<_, PromoCode>(sql)
        .bind(event_id)
        .bind(code)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::validation(format!("Promo code '{}' does not exist", code)))
}

pub async fn adjust_uses(conn: &mut PgConnection, promo_id: Uuid, delta: i32) -> AppResult<()> {
    sqlx::query(
        "UPDATE promo_codes SET uses = GREATEST(uses + $2, 0), updated_at = now() WHERE id = $1",
    )
    .bind(promo_id)
    .bind(delta)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn create(pool: &PgPool, event_id: Uuid, form: &PromoCodeForm) -> AppResult<PromoCode> {
    let code = sqlx::query_as::<_, PromoCode>(
        "INSERT INTO promo_codes
             (id, event_id, code, discount_kind, discount_value, max_uses, ticket_ids,
              valid_from, valid_until, active)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(event_id)
    .bind(&form.code)
    .bind(form.discount_kind.as_ref())
    .bind(form.discount_value)
    .bind(form.max_uses)
    .bind(&form.ticket_ids)
    .bind(form.valid_from)
    .bind(form.valid_until)
    .bind(form.active)
    .fetch_one(pool)
    .await?;

    Ok(code)
}

pub async fn update(
    pool: &PgPool,
    event_id: Uuid,
    promo_id: Uuid,
    form: &PromoCodeForm,
) -> AppResult<PromoCode> {
    sqlx::query_as::<_, PromoCode>(
        "UPDATE promo_codes
         SET code = $3, discount_kind = $4, discount_value = $5, max_uses = $6,
             ticket_ids = $7, valid_from = $8, valid_until = $9, active = $10,
             updated_at = now()
         WHERE id = $1 AND event_id = $2
         RETURNING *",
    )
    .bind(promo_id)
    .bind(event_id)
    .bind(&form.code)
    .bind(form.discount_kind.as_ref())
    .bind(form.discount_value)
    .bind(form.max_uses)
    .bind(&form.ticket_ids)
    .bind(form.valid_from)
    .bind(form.valid_until)
    .bind(form.active)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Promo code", promo_id))
}

pub async fn delete(pool: &PgPool, event_id: Uuid, promo_id: Uuid) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM promo_codes WHERE id = $1 AND event_id = $2")
        .bind(promo_id)
        .bind(event_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Promo code", promo_id));
    }
    Ok(())
}
