use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{CapacityAssignment, CapacityUsage, CartItem, Ticket};
use crate::utils::error::{AppError, AppResult};

pub fn usage(assignment: &CapacityAssignment, tickets: &[Ticket]) -> CapacityUsage {
    let used: i64 = tickets
        .iter()
        .filter(|t| assignment.ticket_ids.contains(&t.id))
        .map(|t| i64::from(t.sold))
        .sum();

    CapacityUsage {
        used,
        remaining: (i64::from(assignment.capacity) - used).max(0),
    }
}

/// Fails on the first assignment the cart would push over its cap.
pub fn enforce(
    assignments: &[CapacityAssignment],
    tickets: &[Ticket],
    items: &[CartItem],
) -> AppResult<()> {
    let requested: HashMap<Uuid, i32> = items
        .iter()
        .map(|item| (item.ticket_id, item.quantity))
        .collect();

    for assignment in assignments {
        let wanted: i64 = assignment
            .ticket_ids
            .iter()
            .filter_map(|id| requested.get(id))
            .map(|quantity| i64::from(*quantity))
            .sum();
        if wanted == 0 {
            continue;
        }

        let CapacityUsage { used, remaining } = usage(assignment, tickets);
        if used + wanted > i64::from(assignment.capacity) {
            return Err(AppError::Conflict(format!(
                "Capacity '{}' has {} seat(s) left, {} requested",
                assignment.name, remaining, wanted
            )));
        }
    }
    Ok(())
}

/// Ensures every referenced ticket belongs to the event.
pub fn ensure_known_tickets(ticket_ids: &[Uuid], tickets: &[Ticket]) -> AppResult<()> {
    match ticket_ids
        .iter()
        .find(|id| !tickets.iter().any(|t| t.id == **id))
    {
        Some(unknown) => Err(AppError::validation(format!(
            "Ticket {} does not belong to this event",
            unknown
        ))),
        None => Ok(()),
    }
}
