//! Domain rules that do not touch the database.
//!
//! Storage loads rows, hands them to these functions, and writes back what
//! they decide. Keeping the rules pure lets them be tested without Postgres.

pub mod capacity;
pub mod checkout;
pub mod codes;
pub mod messaging;
pub mod pricing;
pub mod promo;
pub mod raffle;
pub mod registration;
