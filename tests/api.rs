mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use common::{body_json, json_post};

/// Router over a pool that never connects unless a handler reaches the database.
fn app() -> Router {
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect_lazy(&common::config().database_url)
        .unwrap();

    common::router(pool)
}

#[tokio::test]
async fn test_health_check() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
        "nosniff"
    );

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_api_requires_bearer_token() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/organizers/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "AUTH_ERROR");
}

#[tokio::test]
async fn test_non_bearer_scheme_is_rejected() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/events")
                .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_event_routes_require_token_too() {
    let uri = format!("/api/events/{}/orders/quote", uuid::Uuid::new_v4());
    let response = app()
        .oneshot(json_post(&uri, r#"{"items": []}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_organizer_rejects_blank_name() {
    let response = app()
        .oneshot(json_post(
            "/organizers",
            r#"{"name": "   ", "contact_email": "ops@example.com"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_register_organizer_rejects_bad_email() {
    let response = app()
        .oneshot(json_post(
            "/organizers",
            r#"{"name": "Harbour Fest", "contact_email": "not-an-email"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_uses_error_envelope() {
    let response = app()
        .oneshot(json_post("/organizers", "{\"name\": "))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}
