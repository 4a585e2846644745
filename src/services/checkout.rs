use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::models::order::validate_cart;
use crate::models::{CapacityAssignment, CartItem, PromoCode, Ticket};
use crate::services::{capacity, pricing, promo};
use crate::utils::error::{AppError, AppResult};
use crate::utils::validation::MAX_MONEY;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteLine {
    pub ticket_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub discount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub lines: Vec<QuoteLine>,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub promo_code_id: Option<Uuid>,
}

impl Quote {
    pub fn is_free(&self) -> bool {
        self.total.is_zero()
    }
}

/// Everything a cart is priced against, loaded by the caller.
pub struct Catalog<'a> {
    pub tickets: &'a [Ticket],
    pub capacities: &'a [CapacityAssignment],
    pub promo: Option<&'a PromoCode>,
}

/// Prices a cart and checks every sales rule.
///
/// A line is priced entirely at the ticket's current stage. Inventory,
/// capacity assignments and the promo code are checked against the
/// `sold`/`uses` counters in `catalog`, so callers that go on to write the
/// order must have locked those rows first.
pub fn quote(items: &[CartItem], catalog: &Catalog<'_>, now: DateTime<Utc>) -> AppResult<Quote> {
    validate_cart(items)?;

    let mut lines = Vec::with_capacity(items.len());
    for item in items {
        let ticket = catalog
            .tickets
            .iter()
            .find(|t| t.id == item.ticket_id)
            .ok_or_else(|| {
                AppError::validation(format!(
                    "Ticket {} does not belong to this event",
                    item.ticket_id
                ))
            })?;

        pricing::ensure_on_sale(ticket, now)?;
        pricing::ensure_order_limits(ticket, item.quantity)?;

        if !pricing::availability(ticket).allows(item.quantity) {
            return Err(AppError::Conflict(format!(
                "Not enough '{}' tickets left",
                ticket.name
            )));
        }

        let unit_price = pricing::current_price(ticket, now).ok_or_else(|| {
            AppError::Conflict(format!("'{}' has no price stage left", ticket.name))
        })?;

        let subtotal = unit_price
            .checked_mul(Decimal::from(item.quantity))
            .filter(|amount| *amount <= MAX_MONEY)
            .ok_or_else(|| too_large(&ticket.name))?;

        lines.push(QuoteLine {
            ticket_id: ticket.id,
            name: ticket.name.clone(),
            quantity: item.quantity,
            unit_price,
            subtotal: promo::round_money(subtotal),
            discount: Decimal::ZERO,
        });
    }

    capacity::enforce(catalog.capacities, catalog.tickets, items)?;

    if let Some(code) = catalog.promo {
        promo::ensure_redeemable(code, now)?;
        let subtotals: Vec<(Uuid, Decimal)> =
            lines.iter().map(|l| (l.ticket_id, l.subtotal)).collect();
        for (line, discount) in lines.iter_mut().zip(promo::allocate(code, &subtotals)?) {
            line.discount = discount;
        }
    }

    let subtotal = lines
        .iter()
        .try_fold(Decimal::ZERO, |acc, l| acc.checked_add(l.subtotal))
        .filter(|amount| *amount <= MAX_MONEY)
        .ok_or_else(|| too_large("order"))?;
    let discount: Decimal = lines.iter().map(|l| l.discount).sum();

    Ok(Quote {
        lines,
        subtotal,
        discount,
        total: (subtotal - discount).max(Decimal::ZERO),
        promo_code_id: catalog.promo.map(|p| p.id),
    })
}

fn too_large(what: &str) -> AppError {
    AppError::validation(format!(
        "Total for '{}' exceeds the largest amount an order can hold",
        what
    ))
}
