use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{NewOrganizer, Organizer};
use crate::services::codes;
use crate::utils::error::AppResult;

/// Registers a new organizer with a freshly generated API token.
pub async fn create(pool: &PgPool, new: &NewOrganizer) -> AppResult<Organizer> {
    let organizer = sqlx::query_as::<_, Organizer>(
        "INSERT INTO organizers (id, name, contact_email, api_token)
         VALUES ($1, $2, $3, $4)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(&new.name)
    .bind(&new.contact_email)
    .bind(codes::api_token())
    .fetch_one(pool)
    .await?;

    Ok(organizer)
}

/// Resolves a bearer token to its organizer.
pub async fn find_by_token(pool: &PgPool, token: &str) -> AppResult<Option<Organizer>> {
    let organizer =
        sqlx::query_as::<_, Organizer>("SELECT * FROM organizers WHERE api_token = $1")
            .bind(token)
            .fetch_optional(pool)
            .await?;

    Ok(organizer)
}
