//! Small field validators shared by the form payloads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::utils::error::{AppError, AppResult};

/// Trims `value` and rejects it when nothing is left.
pub fn required(field: &str, value: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Trims an optional text field, mapping blank input to `None`.
pub fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Loose address check: one `@`, a non-empty local part and a dotted domain.
pub fn email(field: &str, value: &str) -> AppResult<String> {
    let value = required(field, value)?;
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    };

    if !valid {
        return Err(AppError::validation(format!(
            "{} must be a valid email address",
            field
        )));
    }
    Ok(value.to_lowercase())
}

pub fn non_negative(field: &str, value: i32) -> AppResult<i32> {
    if value < 0 {
        return Err(AppError::validation(format!("{} cannot be negative", field)));
    }
    Ok(value)
}

/// Largest amount a NUMERIC(12,2) column holds.
pub const MAX_MONEY: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Accepts amounts in `0..=MAX_MONEY` with at most two decimal places.
pub fn money(field: &str, value: Decimal) -> AppResult<Decimal> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(AppError::validation(format!("{} cannot be negative", field)));
    }
    if value > MAX_MONEY {
        return Err(AppError::validation(format!(
            "{} cannot exceed {}",
            field, MAX_MONEY
        )));
    }
    if value.normalize().scale() > 2 {
        return Err(AppError::validation(format!(
            "{} cannot have more than 2 decimal places",
            field
        )));
    }
    Ok(value)
}

/// Rejects windows whose end precedes their start. Open ends are allowed.
pub fn window(
    label: &str,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> AppResult<()> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(AppError::validation(format!(
                "{} must end after it starts",
                label
            )));
        }
    }
    Ok(())
}

/// Rejects duplicated ids and returns them sorted, so stored arrays are stable.
pub fn unique_ids(field: &str, ids: &[Uuid]) -> AppResult<Vec<Uuid>> {
    let mut sorted = ids.to_vec();
    sorted.sort();
    if sorted.windows(2).any(|pair| pair[0] == pair[1]) {
        return Err(AppError::validation(format!(
            "{} contains duplicate entries",
            field
        )));
    }
    Ok(sorted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_required_trims_and_rejects_blank() {
        assert_eq!(required("name", "  Gala  ").unwrap(), "Gala");
        assert!(required("name", "   ").is_err());
    }

    #[test]
    fn test_optional_drops_blank() {
        assert_eq!(optional(Some("  ")), None);
        assert_eq!(optional(Some(" hi ")), Some("hi".to_string()));
        assert_eq!(optional(None), None);
    }

    #[test]
    fn test_email() {
        assert_eq!(
            email("email", " Ana@Example.com ").unwrap(),
            "ana@example.com"
        );
        for bad in ["", "ana", "@example.com", "ana@example", "ana@ex ample.com", "a@b@c.com"] {
            assert!(email("email", bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_window() {
        let now = Utc::now();
        assert!(window("Sales", Some(now), Some(now + Duration::hours(1))).is_ok());
        assert!(window("Sales", Some(now), None).is_ok());
        assert!(window("Sales", Some(now), Some(now - Duration::hours(1))).is_err());
    }

    #[test]
    fn test_money_bounds() {
        use std::str::FromStr;

        assert_eq!(MAX_MONEY.to_string(), "9999999999.99");
        assert!(money("price", Decimal::ZERO).is_ok());
        assert!(money("price", Decimal::from_str("19.990").unwrap()).is_ok());
        assert!(money("price", MAX_MONEY).is_ok());
        assert!(money("price", Decimal::from_str("-0.01").unwrap()).is_err());
        assert!(money("price", Decimal::from_str("10000000000.00").unwrap()).is_err());
        assert!(money("price", Decimal::from_str("19.999").unwrap()).is_err());
    }

    #[test]
    fn test_unique_ids() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(unique_ids("tickets", &[a, b]).unwrap().len(), 2);
        assert!(unique_ids("tickets", &[a, b, a]).is_err());
    }
}
