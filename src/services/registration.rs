use chrono::{DateTime, Utc};

use crate::models::{Attendee, AttendeeStatus, ListWindow, RegistrationList};
use crate::utils::error::{AppError, AppResult};

pub fn window(list: &RegistrationList, now: DateTime<Utc>) -> ListWindow {
    if list.activates_at.is_some_and(|at| now < at) {
        ListWindow::Pending
    } else if list.expires_at.is_some_and(|at| at <= now) {
        ListWindow::Expired
    } else {
        ListWindow::Active
    }
}

/// Rejects scans outside the list's activation window.
pub fn ensure_open(list: &RegistrationList, now: DateTime<Utc>) -> AppResult<()> {
    match window(list, now) {
        ListWindow::Active => Ok(()),
        ListWindow::Pending => Err(AppError::validation(format!(
            "Registration list '{}' is not active yet",
            list.name
        ))),
        ListWindow::Expired => Err(AppError::validation(format!(
            "Registration list '{}' has expired",
            list.name
        ))),
    }
}

/// Checks that staff working `list` may check this attendee in at `now`.
pub fn ensure_admits(
    list: &RegistrationList,
    attendee: &Attendee,
    now: DateTime<Utc>,
) -> AppResult<()> {
    ensure_open(list, now)?;

    if !list.ticket_ids.contains(&attendee.ticket_id) {
        return Err(AppError::Forbidden(format!(
            "This attendee's ticket is not on registration list '{}'",
            list.name
        )));
    }
    ensure_can_check_in(attendee)
}

pub fn ensure_can_check_in(attendee: &Attendee) -> AppResult<()> {
    if attendee.status == AttendeeStatus::Cancelled {
        return Err(AppError::validation(
            "Cancelled attendees cannot be checked in",
        ));
    }
    if let Some(at) = attendee.checked_in_at {
        return Err(AppError::Conflict(format!(
            "{} was already checked in at {}",
            attendee.full_name(),
            at.to_rfc3339()
        )));
    }
    Ok(())
}
