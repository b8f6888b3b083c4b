//! Core arithmetic and comparison primitives.

use std::cmp::Ordering;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};

use crate::DecimalError;

/// Coerce a loosely-typed external value into a decimal.
///
/// `None`, empty, and whitespace-only input are zero. Plain and scientific
/// notation parse directly; otherwise currency symbols, grouping separators,
/// and any other non-numeric characters are stripped before a final parse
/// attempt. Unparseable input is zero, never an error: formulas routinely
/// see ragged data from upstream HR systems and must not fall over on it.
pub fn normalize(raw: Option<&str>) -> Decimal {
    let Some(raw) = raw else {
        return Decimal::ZERO;
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Decimal::ZERO;
    }
    if let Ok(d) = Decimal::from_str(trimmed) {
        return d;
    }
    if let Ok(d) = Decimal::from_scientific(trimmed) {
        return d;
    }
    let mut cleaned = String::with_capacity(trimmed.len());
    for ch in trimmed.chars() {
        match ch {
            '0'..='9' | '.' => cleaned.push(ch),
            '-' if cleaned.is_empty() => cleaned.push(ch),
            _ => {}
        }
    }
    Decimal::from_str(&cleaned).unwrap_or(Decimal::ZERO)
}

/// Drop excess fractional digits past `scale` (half-to-even), leaving
/// shorter results untouched so exact values stay exact.
fn at_scale(value: Decimal, scale: u32) -> Decimal {
    if value.scale() > scale {
        value.round_dp_with_strategy(scale, RoundingStrategy::MidpointNearestEven)
    } else {
        value
    }
}

/// Sign-aware saturation for the (practically unreachable) 28-digit overflow.
fn saturated(negative: bool) -> Decimal {
    if negative {
        Decimal::MIN
    } else {
        Decimal::MAX
    }
}

pub fn add(a: Decimal, b: Decimal, scale: u32) -> Decimal {
    match a.checked_add(b) {
        Some(d) => at_scale(d, scale),
        None => saturated(a.is_sign_negative()),
    }
}

pub fn sub(a: Decimal, b: Decimal, scale: u32) -> Decimal {
    match a.checked_sub(b) {
        Some(d) => at_scale(d, scale),
        None => saturated(a.is_sign_negative()),
    }
}

pub fn mul(a: Decimal, b: Decimal, scale: u32) -> Decimal {
    match a.checked_mul(b) {
        Some(d) => at_scale(d, scale),
        None => saturated(a.is_sign_negative() != b.is_sign_negative()),
    }
}

/// Division that treats a zero divisor as an expected edge case.
pub fn try_div(a: Decimal, b: Decimal, scale: u32) -> Option<Decimal> {
    if b.is_zero() {
        return None;
    }
    match a.checked_div(b) {
        Some(d) => Some(at_scale(d, scale)),
        None => Some(saturated(a.is_sign_negative() != b.is_sign_negative())),
    }
}

/// Fail-fast division: a zero divisor is a hard [`DecimalError::DivisionByZero`].
pub fn div(a: Decimal, b: Decimal, scale: u32) -> Result<Decimal, DecimalError> {
    try_div(a, b, scale).ok_or(DecimalError::DivisionByZero)
}

/// Remainder; `None` on a zero divisor.
pub fn rem(a: Decimal, b: Decimal) -> Option<Decimal> {
    if b.is_zero() {
        return None;
    }
    a.checked_rem(b)
}

/// Exponentiation. Integer exponents compute exactly; fractional exponents
/// go through the decimal `powd` approximation. `None` on overflow.
pub fn pow(base: Decimal, exp: Decimal, scale: u32) -> Option<Decimal> {
    let result = if exp.fract().is_zero() {
        base.checked_powi(exp.to_i64()?)
    } else {
        base.checked_powd(exp)
    };
    result.map(|d| at_scale(d, scale))
}

/// Square root; `None` on negative input rather than an error.
pub fn sqrt(a: Decimal, scale: u32) -> Option<Decimal> {
    a.sqrt().map(|d| at_scale(d, scale))
}

/// Compare two decimals after rounding both to `scale`.
///
/// All the boolean comparisons below derive from this single primitive so
/// that "equal at payroll precision" means the same thing everywhere.
pub fn cmp_at(a: Decimal, b: Decimal, scale: u32) -> Ordering {
    a.round_dp(scale).cmp(&b.round_dp(scale))
}

pub fn gt(a: Decimal, b: Decimal, scale: u32) -> bool {
    cmp_at(a, b, scale) == Ordering::Greater
}

pub fn gte(a: Decimal, b: Decimal, scale: u32) -> bool {
    cmp_at(a, b, scale) != Ordering::Less
}

pub fn lt(a: Decimal, b: Decimal, scale: u32) -> bool {
    cmp_at(a, b, scale) == Ordering::Less
}

pub fn lte(a: Decimal, b: Decimal, scale: u32) -> bool {
    cmp_at(a, b, scale) != Ordering::Greater
}

pub fn eq(a: Decimal, b: Decimal, scale: u32) -> bool {
    cmp_at(a, b, scale) == Ordering::Equal
}

/// Smallest non-null value; zero when nothing remains after filtering.
pub fn min<I>(values: I) -> Decimal
where
    I: IntoIterator<Item = Option<Decimal>>,
{
    values
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(Decimal::ZERO)
}

/// Largest non-null value; zero when nothing remains after filtering.
pub fn max<I>(values: I) -> Decimal
where
    I: IntoIterator<Item = Option<Decimal>>,
{
    values
        .into_iter()
        .flatten()
        .max()
        .unwrap_or(Decimal::ZERO)
}
