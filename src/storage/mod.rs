//! PostgreSQL access, one module per table family.
//!
//! Functions take either the pool or a `&mut PgConnection` when they must
//! run inside a caller's transaction. Every event-scoped lookup filters on
//! `event_id` so a row can never be reached through another event.

pub mod amenities;
pub mod attendees;
pub mod capacities;
pub mod events;
pub mod messages;
pub mod orders;
pub mod organizers;
pub mod promo_codes;
pub mod raffles;
pub mod registration_lists;
pub mod tickets;
