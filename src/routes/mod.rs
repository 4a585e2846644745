use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer};
use crate::handlers::{
    amenities, attendees, capacities, events, health_check, messages, orders, organizers,
    promo_codes, raffles, registration_lists, tickets,
};
use crate::state::AppState;

/// Routes under `/api/events/:event_id`, all of which require a bearer token.
fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/tickets", get(tickets::list).post(tickets::create))
        .route(
            "/tickets/:ticket_id",
            get(tickets::get).put(tickets::update).delete(tickets::delete),
        )
        .route("/orders", get(orders::list).post(orders::create))
        .route("/orders/quote", post(orders::quote))
        .route("/orders/:order_id", get(orders::get))
        .route("/orders/:order_id/cancel", post(orders::cancel))
        .route("/orders/:order_id/mark-paid", post(orders::mark_paid))
        .route("/attendees", get(attendees::list))
        .route(
            "/attendees/:attendee_id",
            get(attendees::get)
                .put(attendees::update)
                .delete(attendees::delete),
        )
        .route(
            "/attendees/:attendee_id/check-in",
            post(attendees::check_in).delete(attendees::undo_check_in),
        )
        .route("/amenities", get(amenities::list).post(amenities::create))
        .route(
            "/amenities/:amenity_id",
            get(amenities::get)
                .put(amenities::update)
                .delete(amenities::delete),
        )
        .route(
            "/amenities/:amenity_id/claims",
            get(amenities::list_claims).post(amenities::claim),
        )
        .route(
            "/amenities/:amenity_id/claims/:attendee_id",
            delete(amenities::release),
        )
        .route("/raffles", get(raffles::list).post(raffles::create))
        .route(
            "/raffles/:raffle_id",
            get(raffles::get).put(raffles::update).delete(raffles::delete),
        )
        .route("/raffles/:raffle_id/draw", post(raffles::draw))
        .route("/raffles/:raffle_id/winners", get(raffles::winners))
        .route(
            "/raffles/:raffle_id/winners/:attendee_id",
            delete(raffles::remove_winner),
        )
        .route("/promo-codes", get(promo_codes::list).post(promo_codes::create))
        .route("/promo-codes/validate", post(promo_codes::validate))
        .route(
            "/promo-codes/:promo_id",
            get(promo_codes::get)
                .put(promo_codes::update)
                .delete(promo_codes::delete),
        )
        .route("/capacities", get(capacities::list).post(capacities::create))
        .route(
            "/capacities/:capacity_id",
            get(capacities::get)
                .put(capacities::update)
                .delete(capacities::delete),
        )
        .route(
            "/registration-lists",
            get(registration_lists::list).post(registration_lists::create),
        )
        .route(
            "/registration-lists/:list_id",
            get(registration_lists::get)
                .put(registration_lists::update)
                .delete(registration_lists::delete),
        )
        .route(
            "/registration-lists/:list_id/check-in",
            post(registration_lists::check_in),
        )
        .route("/messages", get(messages::list).post(messages::create))
        .route("/messages/:message_id", get(messages::get))
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/organizers/me", get(organizers::me))
        .route("/events", get(events::list).post(events::create))
        .route(
            "/events/:event_id",
            get(events::get).put(events::update).delete(events::delete),
        )
        .route("/events/:event_id/summary", get(events::summary))
        .nest("/events/:event_id", event_routes())
}

pub fn create_routes(state: AppState) -> Router {
    let security_headers = create_security_headers_layer(state.config.is_production());
    let cors = create_cors_layer(&state.config.cors_allowed_origins);

    Router::new()
        .route("/health", get(health_check))
        .route("/organizers", post(organizers::register))
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(security_headers)
        .layer(cors)
        .with_state(state)
}
