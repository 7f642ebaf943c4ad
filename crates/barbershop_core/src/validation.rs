//! Input checks run before anything reaches a store.

use chrono::NaiveTime;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::OnceLock;

use crate::ports::{PortError, PortResult};

const MONEY_SCALE: u32 = 2;
const MONEY_LIMIT: i64 = 10_000_000_000;

fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+?[0-9][0-9 \-]{5,20}$").expect("valid phone regex"))
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[A-Za-z]{2,}$").expect("valid email regex")
    })
}

/// Trims `value` and rejects it when nothing is left.
pub fn required(field: &str, value: &str) -> PortResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PortError::validation(field, "is required"));
    }
    Ok(trimmed.to_string())
}

/// 7 to 15 digits, optional leading `+`, spaces and dashes allowed.
///
/// Returns the canonical form (`+` if given, then the digits) that clients are
/// looked up by, so `611 111 111` and `611-111-111` name the same client.
pub fn phone(value: &str) -> PortResult<String> {
    let trimmed = required("phone", value)?;
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    if !phone_regex().is_match(&trimmed) || !(7..=15).contains(&digits.len()) {
        return Err(PortError::validation("phone", "is not a valid phone number"));
    }
    if trimmed.starts_with('+') {
        return Ok(format!("+{}", digits));
    }
    Ok(digits)
}

pub fn email(value: &str) -> PortResult<String> {
    let trimmed = value.trim();
    if !email_regex().is_match(trimmed) {
        return Err(PortError::validation("email", "is not a valid email address"));
    }
    Ok(trimmed.to_string())
}

/// Empty strings count as "not provided".
pub fn optional_email(value: Option<&str>) -> PortResult<Option<String>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => email(v).map(Some),
        None => Ok(None),
    }
}

pub fn positive(field: &str, amount: Decimal) -> PortResult<Decimal> {
    if amount <= Decimal::ZERO {
        return Err(PortError::validation(field, "must be greater than zero"));
    }
    Ok(amount)
}

pub fn non_negative(field: &str, amount: Decimal) -> PortResult<Decimal> {
    if amount < Decimal::ZERO {
        return Err(PortError::validation(field, "cannot be negative"));
    }
    Ok(amount)
}

/// Money is stored as `NUMERIC(12,2)`: at most two decimals, below 10^10.
pub fn money(field: &str, amount: Decimal) -> PortResult<Decimal> {
    if amount.normalize().scale() > MONEY_SCALE {
        return Err(PortError::validation(field, "cannot have more than two decimals"));
    }
    if amount.abs() >= Decimal::from(MONEY_LIMIT) {
        return Err(PortError::validation(field, "is too large"));
    }
    Ok(amount)
}

/// Rounds a computed amount to cents, half away from zero.
pub fn to_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Parses `HH:MM`.
pub fn time_of_day(value: &str) -> PortResult<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| PortError::validation("time", "must be formatted as HH:MM"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_accepts_common_shapes() {
        assert!(phone("612 345 678").is_ok());
        assert!(phone("+34 612-345-678").is_ok());
        assert!(phone("12345").is_err());
        assert!(phone("call me").is_err());
        assert!(phone("   ").is_err());
    }

    #[test]
    fn phone_is_reduced_to_its_digits() {
        assert_eq!(phone("611111111").unwrap(), "611111111");
        assert_eq!(phone(" 611 111 111 ").unwrap(), "611111111");
        assert_eq!(phone("611-111-111").unwrap(), "611111111");
        assert_eq!(phone("+34 611-111-111").unwrap(), "+34611111111");
    }

    #[test]
    fn email_is_optional_but_checked() {
        assert_eq!(optional_email(None), Ok(None));
        assert_eq!(optional_email(Some("  ")), Ok(None));
        assert!(optional_email(Some("ana@example.com")).unwrap().is_some());
        assert!(optional_email(Some("ana@")).is_err());
    }

    #[test]
    fn amounts_respect_sign_rules() {
        assert!(positive("amount", Decimal::ZERO).is_err());
        assert!(positive("amount", Decimal::new(1, 2)).is_ok());
        assert!(non_negative("opening_cash", Decimal::ZERO).is_ok());
        assert!(non_negative("opening_cash", Decimal::new(-1, 0)).is_err());
    }

    #[test]
    fn money_has_at_most_two_decimals() {
        assert!(money("amount", Decimal::new(1250, 2)).is_ok());
        // 12.500 is still 12.50
        assert!(money("amount", Decimal::new(12500, 3)).is_ok());
        assert!(matches!(
            money("amount", Decimal::new(4, 3)),
            Err(PortError::Validation { field, .. }) if field == "amount"
        ));
        assert!(money("amount", Decimal::from(MONEY_LIMIT)).is_err());
        assert_eq!(to_cents(Decimal::new(4, 3)), Decimal::ZERO);
        assert_eq!(to_cents(Decimal::new(1255, 3)), Decimal::new(126, 2));
    }

    #[test]
    fn time_of_day_requires_hours_and_minutes() {
        assert_eq!(
            time_of_day("09:30").unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap()
        );
        assert!(time_of_day("9h30").is_err());
        assert!(time_of_day("25:00").is_err());
    }
}
