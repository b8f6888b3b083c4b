//! Percentage and gross/net helpers derived from the core primitives.

use rust_decimal::Decimal;

use crate::ops::{add, mul, sub, try_div};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// `base * rate / 100`.
pub fn percent(base: Decimal, rate: Decimal, scale: u32) -> Decimal {
    // The divisor is the constant 100, so the division cannot fail.
    try_div(mul(base, rate, scale), HUNDRED, scale).unwrap_or(Decimal::ZERO)
}

/// Relative change from `base` to `current`, in percent.
///
/// `None` when `base` is zero: there is no meaningful reference value, and
/// callers are expected to guard with their own fallback.
pub fn percent_change(current: Decimal, base: Decimal, scale: u32) -> Option<Decimal> {
    let delta = sub(current, base, scale);
    try_div(mul(delta, HUNDRED, scale), base, scale)
}

/// The monetary value of a `rate`% discount on `amount`.
pub fn discount_amount(amount: Decimal, rate: Decimal, scale: u32) -> Decimal {
    percent(amount, rate, scale)
}

/// `amount` after a `rate`% discount.
pub fn apply_discount(amount: Decimal, rate: Decimal, scale: u32) -> Decimal {
    sub(amount, discount_amount(amount, rate, scale), scale)
}

/// Tax owed on a net amount at `rate`%.
pub fn tax_from_net(net: Decimal, rate: Decimal, scale: u32) -> Decimal {
    percent(net, rate, scale)
}

/// Back out the net amount from a gross that already includes `rate`% tax.
///
/// `None` when `rate` is -100: the gross factor collapses to zero.
pub fn net_from_gross(gross: Decimal, rate: Decimal, scale: u32) -> Option<Decimal> {
    let factor = add(Decimal::ONE, try_div(rate, HUNDRED, scale)?, scale);
    try_div(gross, factor, scale)
}

/// Gross up a net amount by `rate`% tax.
pub fn gross_from_net(net: Decimal, rate: Decimal, scale: u32) -> Decimal {
    let factor = add(
        Decimal::ONE,
        try_div(rate, HUNDRED, scale).unwrap_or(Decimal::ZERO),
        scale,
    );
    mul(net, factor, scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_SCALE;
    use pretty_assertions::assert_eq;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn percent_of_base() {
        assert_eq!(percent(d("200"), d("21"), DEFAULT_SCALE), d("42"));
        assert_eq!(percent(d("0"), d("21"), DEFAULT_SCALE), d("0"));
    }

    #[test]
    fn percent_change_guards_zero_base() {
        assert_eq!(
            percent_change(d("110"), d("100"), DEFAULT_SCALE),
            Some(d("10"))
        );
        assert_eq!(percent_change(d("110"), d("0"), DEFAULT_SCALE), None);
    }

    #[test]
    fn discounts() {
        assert_eq!(discount_amount(d("80"), d("25"), DEFAULT_SCALE), d("20"));
        assert_eq!(apply_discount(d("80"), d("25"), DEFAULT_SCALE), d("60"));
    }

    #[test]
    fn gross_net_round_trip() {
        let gross = gross_from_net(d("1000"), d("21"), DEFAULT_SCALE);
        assert_eq!(gross, d("1210"));
        assert_eq!(
            net_from_gross(gross, d("21"), DEFAULT_SCALE),
            Some(d("1000"))
        );
        assert_eq!(tax_from_net(d("1000"), d("21"), DEFAULT_SCALE), d("210"));
        assert_eq!(net_from_gross(d("100"), d("-100"), DEFAULT_SCALE), None);
    }
}
