use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

use crate::models::{Attendee, AttendeeStatus, Raffle};
use crate::utils::error::{AppError, AppResult};

/// Attendees who may win: active, checked in, holding an allowed ticket,
/// and not already a winner of this raffle.
pub fn eligible<'a>(
    raffle: &Raffle,
    attendees: &'a [Attendee],
    winners: &HashSet<Uuid>,
) -> Vec<&'a Attendee> {
    attendees
        .iter()
        .filter(|a| a.event_id == raffle.event_id)
        .filter(|a| a.status == AttendeeStatus::Active && a.is_checked_in())
        .filter(|a| raffle.ticket_ids.is_empty() || raffle.ticket_ids.contains(&a.ticket_id))
        .filter(|a| !winners.contains(&a.id))
        .collect()
}

pub fn ensure_open(raffle: &Raffle, drawn: usize) -> AppResult<()> {
    if drawn >= raffle.winner_count as usize {
        return Err(AppError::Conflict(format!(
            "Raffle '{}' already has all {} winner(s)",
            raffle.name, raffle.winner_count
        )));
    }
    Ok(())
}

/// Picks one winner uniformly at random.
pub fn draw<'a, R>(
    raffle: &Raffle,
    attendees: &'a [Attendee],
    winners: &HashSet<Uuid>,
    rng: &mut R,
) -> AppResult<&'a Attendee>
where
    R: Rng + ?Sized,
{
    ensure_open(raffle, winners.len())?;

    eligible(raffle, attendees, winners)
        .choose(rng)
        .copied()
        .ok_or_else(|| {
            AppError::validation(format!(
                "No checked-in attendees are eligible for raffle '{}'",
                raffle.name
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn raffle(winner_count: i32, ticket_ids: Vec<Uuid>) -> Raffle {
        let now = Utc::now();
        Raffle {
            id: Uuid::new_v4(),
            event_id: Uuid::nil(),
            name: "Door prize".to_string(),
            prize: "Headphones".to_string(),
            description: None,
            winner_count,
            ticket_ids,
            created_at: now,
            updated_at: now,
        }
    }

    fn attendee(ticket_id: Uuid, checked_in: bool, status: AttendeeStatus) -> Attendee {
        let now = Utc::now();
        Attendee {
            id: Uuid::new_v4(),
            event_id: Uuid::nil(),
            order_id: Uuid::new_v4(),
            ticket_id,
            first_name: "Guest".to_string(),
            last_name: String::new(),
            email: "guest@example.com".to_string(),
            phone: None,
            code: "ABCDEFGHJK".to_string(),
            status,
            checked_in_at: checked_in.then_some(now),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_only_checked_in_active_attendees_are_eligible() {
        let ticket = Uuid::new_v4();
        let attendees = vec![
            attendee(ticket, true, AttendeeStatus::Active),
            attendee(ticket, false, AttendeeStatus::Active),
            attendee(ticket, true, AttendeeStatus::Cancelled),
        ];
        let pool = eligible(&raffle(1, vec![]), &attendees, &HashSet::new());
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].id, attendees[0].id);
    }

    #[test]
    fn test_ticket_restriction() {
        let vip = Uuid::new_v4();
        let attendees = vec![
            attendee(vip, true, AttendeeStatus::Active),
            attendee(Uuid::new_v4(), true, AttendeeStatus::Active),
        ];
        let pool = eligible(&raffle(1, vec![vip]), &attendees, &HashSet::new());
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].ticket_id, vip);
    }

    #[test]
    fn test_draws_never_repeat_a_winner() {
        let ticket = Uuid::new_v4();
        let attendees: Vec<Attendee> = (0..5)
            .map(|_| attendee(ticket, true, AttendeeStatus::Active))
            .collect();
        let r = raffle(5, vec![]);
        let mut rng = StdRng::seed_from_u64(7);
        let mut winners = HashSet::new();

        for _ in 0..5 {
            let winner = draw(&r, &attendees, &winners, &mut rng).unwrap();
            assert!(winners.insert(winner.id));
        }
        assert_eq!(winners.len(), 5);

        // All slots filled.
        let err = draw(&r, &attendees, &winners, &mut rng).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_empty_pool_is_a_validation_error() {
        let attendees = vec![attendee(Uuid::new_v4(), false, AttendeeStatus::Active)];
        let mut rng = StdRng::seed_from_u64(1);
        let err = draw(&raffle(1, vec![]), &attendees, &HashSet::new(), &mut rng).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
