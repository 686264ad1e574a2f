//! # Amount Conversion
//!
//! Amounts cross the contract boundary in major units (e.g. `100.00` CZK).
//! Most providers want minor units (`10000`), some want a two-decimal string.
//! These helpers are the only place the conversion happens.

use crate::error::{PaymentError, PaymentResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Number of minor units in one major unit
const MINOR_UNIT_SCALE: u32 = 2;

/// Convert a major-unit amount to minor units: `round(amount * 100)`.
pub fn to_minor_units(amount: Decimal) -> PaymentResult<i64> {
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|scaled| {
            scaled
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_i64()
        })
        .ok_or_else(|| PaymentError::InvalidRequest(format!("Amount out of range: {}", amount)))
}

/// Minor units as the decimal string most providers expect (`"10000"`)
pub fn to_minor_string(amount: Decimal) -> PaymentResult<String> {
    to_minor_units(amount).map(|minor| minor.to_string())
}

/// Convert minor units back to a major-unit amount with two decimals
pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, MINOR_UNIT_SCALE)
}

/// Parse a provider's minor-unit string (`"5000"`) into major units (`50.00`)
pub fn parse_minor_units(value: &str) -> PaymentResult<Decimal> {
    value
        .trim()
        .parse::<i64>()
        .map(from_minor_units)
        .map_err(|_| PaymentError::Serialization(format!("Invalid minor-unit amount: {}", value)))
}

/// Parse a provider's major-unit value (`"100.5"`, `100.5`) into a decimal
pub fn parse_major_units(value: &str) -> PaymentResult<Decimal> {
    Decimal::from_str(value.trim())
        .map(|d| {
            d.round_dp_with_strategy(MINOR_UNIT_SCALE, RoundingStrategy::MidpointAwayFromZero)
        })
        .map_err(|_| PaymentError::Serialization(format!("Invalid amount: {}", value)))
}

/// Format a major-unit amount with exactly two decimals (`"100.00"`)
pub fn format_major(amount: Decimal) -> String {
    let mut rounded =
        amount.round_dp_with_strategy(MINOR_UNIT_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MINOR_UNIT_SCALE);
    rounded.to_string()
}
