use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::models::{Availability, Ticket};
use crate::utils::error::{AppError, AppResult};

pub fn availability(ticket: &Ticket) -> Availability {
    match ticket.quantity {
        None => Availability::Unlimited,
        Some(quantity) => Availability::Remaining((quantity - ticket.sold).max(0)),
    }
}

/// Price a new seat sells at right now.
///
/// Without stages this is the base price. With stages it is the price of
/// the first stage that has neither ended nor sold its cumulative share of
/// seats. `None` once every stage is used up.
pub fn current_price(ticket: &Ticket, now: DateTime<Utc>) -> Option<Decimal> {
    if ticket.stages.is_empty() {
        return Some(ticket.price);
    }

    let mut cumulative: Option<i64> = Some(0);
    for stage in ticket.stages.iter() {
        cumulative = match (cumulative, stage.quantity) {
            (Some(total), Some(quantity)) => Some(total + i64::from(quantity)),
            _ => None,
        };

        let ended = stage.ends_at.is_some_and(|ends_at| now >= ends_at);
        let exhausted = cumulative.is_some_and(|cap| cap <= i64::from(ticket.sold));
        if !ended && !exhausted {
            return Some(stage.price);
        }
    }
    None
}

pub fn ensure_on_sale(ticket: &Ticket, now: DateTime<Utc>) -> AppResult<()> {
    if ticket.sales_start.is_some_and(|start| now < start) {
        return Err(AppError::validation(format!(
            "Sales for '{}' have not started",
            ticket.name
        )));
    }
    if ticket.sales_end.is_some_and(|end| now >= end) {
        return Err(AppError::validation(format!(
            "Sales for '{}' have ended",
            ticket.name
        )));
    }
    Ok(())
}

pub fn ensure_order_limits(ticket: &Ticket, quantity: i32) -> AppResult<()> {
    if quantity < ticket.min_per_order {
        return Err(AppError::validation(format!(
            "'{}' requires at least {} per order",
            ticket.name, ticket.min_per_order
        )));
    }
    if let Some(max) = ticket.max_per_order {
        if quantity > max {
            return Err(AppError::validation(format!(
                "'{}' allows at most {} per order",
                ticket.name, max
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::TicketStage;
    use chrono::Duration;
    use sqlx::types::Json;
    use uuid::Uuid;

    pub(crate) fn ticket(price: i64, quantity: Option<i32>, sold: i32) -> Ticket {
        let now = Utc::now();
        Ticket {
            id: Uuid::new_v4(),
            event_id: Uuid::nil(),
            name: "General".to_string(),
            description: None,
            price: Decimal::from(price),
            quantity,
            sold,
            min_per_order: 1,
            max_per_order: None,
            sales_start: None,
            sales_end: None,
            stages: Json(vec![]),
            hidden: false,
            position: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn stage(price: i64, quantity: Option<i32>, ends_at: Option<DateTime<Utc>>) -> TicketStage {
        TicketStage {
            name: format!("Stage {price}"),
            price: Decimal::from(price),
            quantity,
            ends_at,
        }
    }

    #[test]
    fn test_availability() {
        assert_eq!(availability(&ticket(10, None, 40)), Availability::Unlimited);
        assert_eq!(
            availability(&ticket(10, Some(50), 40)),
            Availability::Remaining(10)
        );
        // Quantity lowered below sold outside the API still reads as zero.
        assert_eq!(
            availability(&ticket(10, Some(30), 40)),
            Availability::Remaining(0)
        );
    }

    #[test]
    fn test_base_price_without_stages() {
        let t = ticket(25, None, 0);
        assert_eq!(current_price(&t, Utc::now()), Some(Decimal::from(25)));
    }

    #[test]
    fn test_stage_moves_on_when_quantity_sold() {
        let mut t = ticket(0, Some(300), 0);
        t.stages = Json(vec![
            stage(10, Some(100), None),
            stage(15, Some(100), None),
            stage(20, None, None),
        ]);
        let now = Utc::now();

        assert_eq!(current_price(&t, now), Some(Decimal::from(10)));
        t.sold = 99;
        assert_eq!(current_price(&t, now), Some(Decimal::from(10)));
        t.sold = 100;
        assert_eq!(current_price(&t, now), Some(Decimal::from(15)));
        t.sold = 250;
        assert_eq!(current_price(&t, now), Some(Decimal::from(20)));
    }

    #[test]
    fn test_stage_moves_on_when_date_passes() {
        let now = Utc::now();
        let mut t = ticket(0, None, 0);
        t.stages = Json(vec![
            stage(10, None, Some(now - Duration::days(1))),
            stage(15, None, Some(now + Duration::days(1))),
        ]);
        assert_eq!(current_price(&t, now), Some(Decimal::from(15)));
    }

    #[test]
    fn test_all_stages_used_up() {
        let now = Utc::now();
        let mut t = ticket(0, None, 50);
        t.stages = Json(vec![
            stage(10, Some(20), None),
            stage(15, Some(30), Some(now + Duration::days(1))),
        ]);
        assert_eq!(current_price(&t, now), None);
    }

    #[test]
    fn test_sales_window() {
        let now = Utc::now();
        let mut t = ticket(10, None, 0);
        t.sales_start = Some(now + Duration::hours(1));
        assert!(ensure_on_sale(&t, now).is_err());

        t.sales_start = Some(now - Duration::hours(1));
        t.sales_end = Some(now);
        assert!(ensure_on_sale(&t, now).is_err());

        t.sales_end = Some(now + Duration::hours(1));
        assert!(ensure_on_sale(&t, now).is_ok());
    }

    #[test]
    fn test_order_limits() {
        let mut t = ticket(10, None, 0);
        t.min_per_order = 2;
        t.max_per_order = Some(4);
        assert!(ensure_order_limits(&t, 1).is_err());
        assert!(ensure_order_limits(&t, 2).is_ok());
        assert!(ensure_order_limits(&t, 4).is_ok());
        assert!(ensure_order_limits(&t, 5).is_err());
    }
}
