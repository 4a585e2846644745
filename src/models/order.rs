use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::models::Attendee;
use crate::utils::error::{AppError, AppResult};
use crate::utils::validation;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    #[default]
    Paid,
    Cancelled,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethod {
    Free,
    #[default]
    Cash,
    Card,
    Transfer,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub event_id: Uuid,
    pub buyer_name: String,
    pub buyer_email: String,
    #[sqlx(try_from = "String")]
    pub status: OrderStatus,
    #[sqlx(try_from = "String")]
    pub payment_method: PaymentMethod,
    pub promo_code_id: Option<Uuid>,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub ticket_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub discount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub attendees: Vec<Attendee>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub ticket_id: Uuid,
    pub quantity: i32,
}

/// Most seats a single order may hold, across all of its lines.
pub const MAX_SEATS_PER_ORDER: i64 = 1_000;

/// Rejects empty carts, non-positive quantities, oversized orders and
/// repeated tickets.
pub fn validate_cart(items: &[CartItem]) -> AppResult<()> {
    if items.is_empty() {
        return Err(AppError::validation("At least one ticket is required"));
    }
    if items.iter().any(|item| item.quantity < 1) {
        return Err(AppError::validation("Ticket quantities must be at least 1"));
    }
    let seats: i64 = items.iter().map(|item| i64::from(item.quantity)).sum();
    if seats > MAX_SEATS_PER_ORDER {
        return Err(AppError::validation(format!(
            "An order can hold at most {} tickets, {} requested",
            MAX_SEATS_PER_ORDER, seats
        )));
    }
    let ids: Vec<Uuid> = items.iter().map(|item| item.ticket_id).collect();
    validation::unique_ids("items", &ids)?;
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub items: Vec<CartItem>,
    pub promo_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttendeeDetails {
    pub ticket_id: Uuid,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewOrder {
    pub buyer_name: String,
    pub buyer_email: String,
    pub items: Vec<CartItem>,
    pub promo_code: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub status: OrderStatus,
    pub notes: Option<String>,
    #[serde(default)]
    pub attendees: Vec<AttendeeDetails>,
}

impl NewOrder {
    /// Validates the form and fills in one buyer-named attendee per seat
    /// when no attendee details were given.
    pub fn validate(self) -> AppResult<Self> {
        validate_cart(&self.items)?;
        if self.status == OrderStatus::Cancelled {
            return Err(AppError::validation("New orders cannot be cancelled"));
        }

        let buyer_name = validation::required("buyer_name", &self.buyer_name)?;
        let buyer_email = validation::email("buyer_email", &self.buyer_email)?;

        let attendees = if self.attendees.is_empty() {
            let (first_name, last_name) = split_name(&buyer_name);
            let (first_name, last_name, email) = (&first_name, &last_name, &buyer_email);
            self.items
                .iter()
                .flat_map(|item| {
                    (0..item.quantity).map(move |_| AttendeeDetails {
                        ticket_id: item.ticket_id,
                        first_name: first_name.clone(),
                        last_name: last_name.clone(),
                        email: email.clone(),
                        phone: None,
                    })
                })
                .collect()
        } else {
            for item in &self.items {
                let given = self
                    .attendees
                    .iter()
                    .filter(|a| a.ticket_id == item.ticket_id)
                    .count();
                if given != item.quantity as usize {
                    return Err(AppError::validation(format!(
                        "Expected {} attendee(s) for ticket {}, got {}",
                        item.quantity, item.ticket_id, given
                    )));
                }
            }
            if self
                .attendees
                .iter()
                .any(|a| !self.items.iter().any(|i| i.ticket_id == a.ticket_id))
            {
                return Err(AppError::validation(
                    "Attendee details reference a ticket that is not in the order",
                ));
            }

            self.attendees
                .into_iter()
                .map(|a| {
                    Ok(AttendeeDetails {
                        first_name: validation::required("first_name", &a.first_name)?,
                        last_name: a.last_name.trim().to_string(),
                        email: validation::email("email", &a.email)?,
                        phone: validation::optional(a.phone.as_deref()),
                        ticket_id: a.ticket_id,
                    })
                })
                .collect::<AppResult<Vec<_>>>()?
        };

        Ok(Self {
            buyer_name,
            buyer_email,
            notes: validation::optional(self.notes.as_deref()),
            attendees,
            ..self
        })
    }
}

fn split_name(full: &str) -> (String, String) {
    match full.split_once(' ') {
        Some((first, last)) => (first.to_string(), last.trim().to_string()),
        None => (full.to_string(), String::new()),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(items: Vec<CartItem>, attendees: Vec<AttendeeDetails>) -> NewOrder {
        NewOrder {
            buyer_name: "Ana Maria Lopez".to_string(),
            buyer_email: "ana@example.com".to_string(),
            items,
            promo_code: None,
            payment_method: PaymentMethod::Cash,
            status: OrderStatus::Paid,
            notes: None,
            attendees,
        }
    }

    fn details(ticket_id: Uuid, name: &str) -> AttendeeDetails {
        AttendeeDetails {
            ticket_id,
            first_name: name.to_string(),
            last_name: String::new(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: None,
        }
    }

    #[test]
    fn test_buyer_fills_every_seat_when_no_details_given() {
        let ticket = Uuid::new_v4();
        let valid = order(vec![CartItem { ticket_id: ticket, quantity: 3 }], vec![])
            .validate()
            .unwrap();

        assert_eq!(valid.attendees.len(), 3);
        assert!(valid.attendees.iter().all(|a| a.first_name == "Ana"
            && a.last_name == "Maria Lopez"
            && a.ticket_id == ticket));
    }

    #[test]
    fn test_details_must_match_quantities() {
        let ticket = Uuid::new_v4();
        let items = vec![CartItem { ticket_id: ticket, quantity: 2 }];
        assert!(order(items.clone(), vec![details(ticket, "Bo")])
            .validate()
            .is_err());
        assert!(order(items, vec![details(ticket, "Bo"), details(ticket, "Cy")])
            .validate()
            .is_ok());
    }

    #[test]
    fn test_details_for_unknown_ticket_are_rejected() {
        let ticket = Uuid::new_v4();
        let items = vec![CartItem { ticket_id: ticket, quantity: 1 }];
        let attendees = vec![details(ticket, "Bo"), details(Uuid::new_v4(), "Cy")];
        assert!(order(items, attendees).validate().is_err());
    }

    #[test]
    fn test_cart_rules() {
        let ticket = Uuid::new_v4();
        assert!(validate_cart(&[]).is_err());
        assert!(validate_cart(&[CartItem { ticket_id: ticket, quantity: 0 }]).is_err());
        assert!(validate_cart(&[
            CartItem { ticket_id: ticket, quantity: 1 },
            CartItem { ticket_id: ticket, quantity: 2 },
        ])
        .is_err());
    }

    #[test]
    fn test_oversized_orders_are_rejected_before_seats_are_filled() {
        let items = vec![
            CartItem { ticket_id: Uuid::new_v4(), quantity: 1_500_000_000 },
            CartItem { ticket_id: Uuid::new_v4(), quantity: 1_500_000_000 },
        ];
        assert!(matches!(
            order(items, vec![]).validate(),
            Err(AppError::ValidationError(_))
        ));

        let at_limit = vec![CartItem { ticket_id: Uuid::new_v4(), quantity: 1_000 }];
        assert!(validate_cart(&at_limit).is_ok());
        let over = vec![
            CartItem { ticket_id: Uuid::new_v4(), quantity: 600 },
            CartItem { ticket_id: Uuid::new_v4(), quantity: 401 },
        ];
        assert!(validate_cart(&over).is_err());
    }

    #[test]
    fn test_new_orders_cannot_start_cancelled() {
        let mut o = order(vec![CartItem { ticket_id: Uuid::new_v4(), quantity: 1 }], vec![]);
        o.status = OrderStatus::Cancelled;
        assert!(o.validate().is_err());
    }
}
