#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

use eventdesk_server::config::{Config, MailConfig};
use eventdesk_server::mailer::{LogMailer, Mailer};
use eventdesk_server::routes::create_routes;
use eventdesk_server::state::AppState;

pub fn config() -> Config {
    Config {
        database_url: "postgres://localhost/eventdesk_test".to_string(),
        database_max_connections: 1,
        port: 0,
        cors_allowed_origins: "http://localhost:3000".to_string(),
        environment: "test".to_string(),
        mail: MailConfig {
            api_url: "http://localhost/emails".to_string(),
            api_key: None,
            from: "Eventdesk <test@localhost>".to_string(),
        },
    }
}

pub fn router(pool: PgPool) -> Router {
    router_with_mailer(pool, Arc::new(LogMailer))
}

pub fn router_with_mailer(pool: PgPool, mailer: Arc<dyn Mailer>) -> Router {
    create_routes(AppState::new(pool, mailer, config()))
}

pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn json_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// An organizer session against the router: every call carries its token.
pub struct Api {
    router: Router,
    token: String,
}

impl Api {
    /// Registers a fresh organizer on `router`.
    pub async fn register(router: Router) -> Self {
        let response = router
            .clone()
            .oneshot(json_post(
                "/organizers",
                r#"{"name": "Harbour Fest", "contact_email": "ops@harbourfest.example"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        let token = body["data"]["api_token"].as_str().unwrap().to_string();
        Self { router, token }
    }

    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token));
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        (status, body_json(response).await)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, None).await
    }

    /// Creates an event starting tomorrow and returns its `/api/events/:id` prefix.
    pub async fn event(&self) -> String {
        let start = chrono::Utc::now() + chrono::Duration::days(1);
        let (status, body) = self
            .post(
                "/api/events",
                serde_json::json!({
                    "title": "Harbour Fest",
                    "location": "Pier 4",
                    "start_time": start,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        format!("/api/events/{}", body["data"]["id"].as_str().unwrap())
    }

    /// Creates a ticket type and returns its id.
    pub async fn ticket(&self, event: &str, name: &str, quantity: i32) -> String {
        let (status, body) = self
            .post(
                &format!("{event}/tickets"),
                serde_json::json!({ "name": name, "price": "20.00", "quantity": quantity }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_str().unwrap().to_string()
    }

    /// Places a paid order for `(ticket_id, quantity)` lines and returns the order body.
    pub async fn order(&self, event: &str, lines: &[(&str, i32)], promo: Option<&str>) -> Value {
        let items: Vec<Value> = lines
            .iter()
            .map(|(ticket_id, quantity)| {
                serde_json::json!({ "ticket_id": ticket_id, "quantity": quantity })
            })
            .collect();
        let (status, body) = self
            .post(
                &format!("{event}/orders"),
                serde_json::json!({
                    "buyer_name": "Ana Lopez",
                    "buyer_email": "ana@example.com",
                    "items": items,
                    "promo_code": promo,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"].clone()
    }
}
