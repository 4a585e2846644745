//! Bearer-token authentication for the `/api` routes.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::models::Organizer;
use crate::state::AppState;
use crate::storage::organizers;
use crate::utils::error::AppError;

/// The organizer whose API token came with the request.
#[derive(Debug, Clone)]
pub struct AuthOrganizer(pub Organizer);

fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::AuthError("Missing Authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::AuthError("Malformed Authorization header".to_string()))?;

    match value.strip_prefix("Bearer ").map(str::trim) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(AppError::AuthError(
            "Authorization header must be 'Bearer <token>'".to_string(),
        )),
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthOrganizer {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;

        match organizers::find_by_token(&state.pool, token).await? {
            Some(organizer) => Ok(AuthOrganizer(organizer)),
            None => Err(AppError::AuthError("Invalid API token".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_bearer_token_is_extracted() {
        assert_eq!(bearer_token(&headers("Bearer abc123")).unwrap(), "abc123");
    }

    #[test]
    fn test_missing_or_malformed_header_is_rejected() {
        assert!(matches!(bearer_token(&HeaderMap::new()), Err(AppError::AuthError(_))));
        assert!(matches!(bearer_token(&headers("Basic abc")), Err(AppError::AuthError(_))));
        assert!(matches!(bearer_token(&headers("Bearer   ")), Err(AppError::AuthError(_))));
    }
}
