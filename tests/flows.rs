//! End-to-end flows against a migrated PostgreSQL database.
//!
//! Each `#[sqlx::test]` gets its own database, so `DATABASE_URL` must point at
//! a server where the test user may create databases.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::async_trait;
use axum::http::StatusCode;
use chrono::Utc;
use serde_json::{json, Value};
use sqlx::PgPool;

use common::Api;
use eventdesk_server::mailer::{Mailer, OutgoingEmail};
use eventdesk_server::utils::error::{AppError, AppResult};

fn attendee_for<'a>(order: &'a Value, ticket_id: &str) -> &'a Value {
    order["attendees"]
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["ticket_id"] == ticket_id)
        .unwrap()
}

#[sqlx::test]
async fn test_cancel_releases_seats_and_promo_use(pool: PgPool) {
    let api = Api::register(common::router(pool)).await;
    let event = api.event().await;
    let ticket = api.ticket(&event, "General", 10).await;

    let (status, promo) = api
        .post(
            &format!("{event}/promo-codes"),
            json!({
                "code": "save10",
                "discount_kind": "percentage",
                "discount_value": "10",
                "max_uses": 5,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{promo}");
    let promo_uri = format!("{event}/promo-codes/{}", promo["data"]["id"].as_str().unwrap());

    let order = api.order(&event, &[(&ticket, 2)], Some("Save10")).await;
    let order_uri = format!("{event}/orders/{}", order["id"].as_str().unwrap());

    let (_, sold) = api.get(&format!("{event}/tickets/{ticket}")).await;
    assert_eq!(sold["data"]["sold"], 2);
    let (_, used) = api.get(&promo_uri).await;
    assert_eq!(used["data"]["uses"], 1);

    let (status, cancelled) = api.post(&format!("{order_uri}/cancel"), json!({})).await;
    assert_eq!(status, StatusCode::OK, "{cancelled}");
    assert_eq!(cancelled["data"]["status"], "cancelled");

    let (_, released) = api.get(&format!("{event}/tickets/{ticket}")).await;
    assert_eq!(released["data"]["sold"], 0);
    let (_, returned) = api.get(&promo_uri).await;
    assert_eq!(returned["data"]["uses"], 0);

    let (status, body) = api.post(&format!("{order_uri}/cancel"), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (_, still) = api.get(&format!("{event}/tickets/{ticket}")).await;
    assert_eq!(still["data"]["sold"], 0);
}

#[sqlx::test]
async fn test_amenity_claims_are_single_and_stock_limited(pool: PgPool) {
    let api = Api::register(common::router(pool)).await;
    let event = api.event().await;
    let ticket = api.ticket(&event, "General", 10).await;
    let order = api.order(&event, &[(&ticket, 2)], None).await;
    let first = order["attendees"][0]["id"].as_str().unwrap();
    let second = order["attendees"][1]["id"].as_str().unwrap();

    let (status, amenity) = api
        .post(
            &format!("{event}/amenities"),
            json!({ "name": "Tote bag", "quantity": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{amenity}");
    let claims = format!(
        "{event}/amenities/{}/claims",
        amenity["data"]["id"].as_str().unwrap()
    );

    let (status, _) = api.post(&claims, json!({ "attendee_id": first })).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = api.post(&claims, json!({ "attendee_id": first })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("already claimed"));

    let (status, body) = api.post(&claims, json!({ "attendee_id": second })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"]["message"].as_str().unwrap().contains("run out"));

    let (_, listed) = api.get(&claims).await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);
}

#[sqlx::test]
async fn test_sold_tickets_are_protected(pool: PgPool) {
    let api = Api::register(common::router(pool)).await;
    let event = api.event().await;
    let ticket = api.ticket(&event, "General", 10).await;
    api.order(&event, &[(&ticket, 2)], None).await;
    let ticket_uri = format!("{event}/tickets/{ticket}");

    let (status, body) = api.delete(&ticket_uri).await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let (status, body) = api
        .put(
            &ticket_uri,
            json!({ "name": "General", "price": "20.00", "quantity": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, _) = api
        .put(
            &ticket_uri,
            json!({ "name": "General", "price": "20.00", "quantity": 2 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[sqlx::test]
async fn test_deleted_ticket_leaves_capacity_and_lists(pool: PgPool) {
    let api = Api::register(common::router(pool)).await;
    let event = api.event().await;
    let kept = api.ticket(&event, "General", 10).await;
    let dropped = api.ticket(&event, "Balcony", 10).await;

    let (status, capacity) = api
        .post(
            &format!("{event}/capacities"),
            json!({ "name": "Hall", "capacity": 15, "ticket_ids": [kept, dropped] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{capacity}");
    let (status, list) = api
        .post(
            &format!("{event}/registration-lists"),
            json!({ "name": "Front desk", "ticket_ids": [kept, dropped] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{list}");

    let (status, _) = api.delete(&format!("{event}/tickets/{dropped}")).await;
    assert_eq!(status, StatusCode::OK);

    let (_, capacity) = api
        .get(&format!(
            "{event}/capacities/{}",
            capacity["data"]["id"].as_str().unwrap()
        ))
        .await;
    assert_eq!(capacity["data"]["ticket_ids"], json!([kept]));

    let (_, list) = api
        .get(&format!(
            "{event}/registration-lists/{}",
            list["data"]["id"].as_str().unwrap()
        ))
        .await;
    assert_eq!(list["data"]["ticket_ids"], json!([kept]));
}

#[sqlx::test]
async fn test_registration_list_check_in(pool: PgPool) {
    let api = Api::register(common::router(pool)).await;
    let event = api.event().await;
    let general = api.ticket(&event, "General", 10).await;
    let vip = api.ticket(&event, "VIP", 10).await;
    let order = api.order(&event, &[(&general, 1), (&vip, 1)], None).await;
    let general_code = attendee_for(&order, &general)["code"].as_str().unwrap();
    let vip_code = attendee_for(&order, &vip)["code"].as_str().unwrap();

    let (_, list) = api
        .post(
            &format!("{event}/registration-lists"),
            json!({ "name": "VIP door", "ticket_ids": [vip] }),
        )
        .await;
    let check_in = format!(
        "{event}/registration-lists/{}/check-in",
        list["data"]["id"].as_str().unwrap()
    );

    let (status, body) = api.post(&check_in, json!({ "code": general_code })).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");

    let (status, body) = api.post(&check_in, json!({ "code": vip_code })).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body["data"]["checked_in_at"].is_string());

    let (status, _) = api.post(&check_in, json!({ "code": vip_code })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let now = Utc::now();
    let (status, closed) = api
        .post(
            &format!("{event}/registration-lists"),
            json!({
                "name": "Yesterday",
                "ticket_ids": [general],
                "activates_at": now - chrono::Duration::hours(2),
                "expires_at": now - chrono::Duration::hours(1),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{closed}");
    let closed_check_in = format!(
        "{event}/registration-lists/{}/check-in",
        closed["data"]["id"].as_str().unwrap()
    );

    let (status, body) = api.post(&closed_check_in, json!({ "code": general_code })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    // The window is checked before the code, so unknown codes get the same answer.
    let (status, body) = api
        .post(&closed_check_in, json!({ "code": "ZZZZZZZZZZ" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
}

/// Polls a message until delivery has finished.
async fn wait_for_delivery(api: &Api, uri: &str) -> Value {
    for _ in 0..100 {
        let (status, body) = api.get(uri).await;
        assert_eq!(status, StatusCode::OK);
        let state = body["data"]["status"].as_str().unwrap().to_string();
        if state == "completed" || state == "failed" {
            return body["data"].clone();
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("message {uri} never finished sending");
}

#[sqlx::test]
async fn test_message_is_queued_then_completed(pool: PgPool) {
    let api = Api::register(common::router(pool)).await;
    let event = api.event().await;
    let ticket = api.ticket(&event, "General", 10).await;
    api.order(&event, &[(&ticket, 2)], None).await;

    let (status, body) = api
        .post(
            &format!("{event}/messages"),
            json!({ "subject": "Doors open at 6", "body": "See you, {{first_name}}!" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["status"], "queued");
    assert_eq!(body["data"]["total"], 2);

    let uri = format!("{event}/messages/{}", body["data"]["id"].as_str().unwrap());
    let message = wait_for_delivery(&api, &uri).await;
    assert_eq!(message["status"], "completed");
    assert_eq!(message["sent"], 2);
    assert_eq!(message["failed"], 0);
    assert!(message["completed_at"].is_string());
}

struct RejectingMailer;

#[async_trait]
impl Mailer for RejectingMailer {
    async fn send(&self, email: &OutgoingEmail) -> AppResult<()> {
        Err(AppError::ExternalServiceError(format!(
            "mailbox {} unavailable",
            email.to
        )))
    }
}

#[sqlx::test]
async fn test_message_fails_when_nothing_is_delivered(pool: PgPool) {
    let api = Api::register(common::router_with_mailer(pool, Arc::new(RejectingMailer))).await;
    let event = api.event().await;
    let ticket = api.ticket(&event, "General", 10).await;
    api.order(&event, &[(&ticket, 1)], None).await;

    let (status, body) = api
        .post(
            &format!("{event}/messages"),
            json!({ "subject": "Schedule change", "body": "Doors now open at 7." }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let uri = format!("{event}/messages/{}", body["data"]["id"].as_str().unwrap());
    let message = wait_for_delivery(&api, &uri).await;
    assert_eq!(message["status"], "failed");
    assert_eq!(message["sent"], 0);
    assert_eq!(message["failed"], 1);
    assert!(message["last_error"].as_str().unwrap().contains("unavailable"));
}

#[sqlx::test]
async fn test_messages_need_recipients(pool: PgPool) {
    let api = Api::register(common::router(pool)).await;
    let event = api.event().await;

    let (status, body) = api
        .post(
            &format!("{event}/messages"),
            json!({ "subject": "Hello", "body": "Anyone there?" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (_, listed) = api.get(&format!("{event}/messages")).await;
    assert_eq!(listed["data"], json!([]));
}
