use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::models::{DiscountKind, PromoCode};
use crate::utils::error::{AppError, AppResult};

const MIN_CODE_LEN: usize = 3;
const MAX_CODE_LEN: usize = 32;

/// Trims and uppercases a promo code, rejecting anything outside `[A-Z0-9_-]{3,32}`.
pub fn normalize_code(raw: &str) -> AppResult<String> {
    let code = raw.trim().to_uppercase();
    let valid_len = (MIN_CODE_LEN..=MAX_CODE_LEN).contains(&code.len());
    let valid_chars = code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-' || c == '_');

    if !valid_len || !valid_chars {
        return Err(AppError::validation(format!(
            "Promo codes must be {}-{} characters of letters, digits, '-' or '_'",
            MIN_CODE_LEN, MAX_CODE_LEN
        )));
    }
    Ok(code)
}

pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Checks the code can be redeemed at `now`, independent of the cart.
pub fn ensure_redeemable(promo: &PromoCode, now: DateTime<Utc>) -> AppResult<()> {
    if !promo.active {
        return Err(AppError::validation(format!(
            "Promo code '{}' is not active",
            promo.code
        )));
    }
    if promo.valid_from.is_some_and(|from| now < from) {
        return Err(AppError::validation(format!(
            "Promo code '{}' is not valid yet",
            promo.code
        )));
    }
    if promo.valid_until.is_some_and(|until| now >= until) {
        return Err(AppError::validation(format!(
            "Promo code '{}' has expired",
            promo.code
        )));
    }
    if promo.max_uses.is_some_and(|max| promo.uses >= max) {
        return Err(AppError::validation(format!(
            "Promo code '{}' has reached its usage limit",
            promo.code
        )));
    }
    Ok(())
}

pub fn applies_to(promo: &PromoCode, ticket_id: Uuid) -> bool {
    promo.ticket_ids.is_empty() || promo.ticket_ids.contains(&ticket_id)
}

/// Splits the code's discount across cart lines given as `(ticket_id, line_subtotal)`.
///
/// Percentage codes are rounded once on the eligible subtotal, then shared out
/// in proportion to each eligible line with the rounding remainder on the last
/// one. Fixed codes apply once per order, consuming eligible lines in cart
/// order until the amount runs out. Errors when no line is eligible.
pub fn allocate(promo: &PromoCode, lines: &[(Uuid, Decimal)]) -> AppResult<Vec<Decimal>> {
    let Some(last_eligible) = lines
        .iter()
        .rposition(|(ticket_id, _)| applies_to(promo, *ticket_id))
    else {
        return Err(AppError::validation(format!(
            "Promo code '{}' does not apply to the selected tickets",
            promo.code
        )));
    };

    let discounts = match promo.discount_kind {
        DiscountKind::Percentage => {
            let eligible: Decimal = lines
                .iter()
                .filter(|(ticket_id, _)| applies_to(promo, *ticket_id))
                .map(|(_, subtotal)| *subtotal)
                .sum();
            let total = round_money(eligible * promo.discount_value / Decimal::ONE_HUNDRED);

            let mut left = total;
            lines
                .iter()
                .enumerate()
                .map(|(index, (ticket_id, subtotal))| {
                    if !applies_to(promo, *ticket_id) {
                        return Decimal::ZERO;
                    }
                    if index == last_eligible {
                        return left;
                    }
                    let share = if eligible.is_zero() {
                        Decimal::ZERO
                    } else {
                        round_money(total * *subtotal / eligible).min(left)
                    };
                    left -= share;
                    share
                })
                .collect()
        }
        DiscountKind::Fixed => {
            let mut left = promo.discount_value;
            lines
                .iter()
                .map(|(ticket_id, subtotal)| {
                    if !applies_to(promo, *ticket_id) {
                        return Decimal::ZERO;
                    }
                    let take = left.min(*subtotal);
                    left -= take;
                    round_money(take)
                })
                .collect()
        }
    };
    Ok(discounts)
}
