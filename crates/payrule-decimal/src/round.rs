//! Rounding disciplines used by payroll rules.

use rust_decimal::{Decimal, RoundingStrategy};

/// How to resolve a digit that falls past the requested precision.
///
/// Mode names parse case-insensitively from the DSL's `ROUND(x, p, 'MODE')`
/// string argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RoundingMode {
    /// Half away from zero (`2.5 -> 3`). The commercial default.
    #[default]
    HalfUp,
    /// Half toward zero (`2.5 -> 2`).
    HalfDown,
    /// Half to even (`2.5 -> 2`, `3.5 -> 4`), the bias-free discipline
    /// statutory payroll rounding often requires.
    Bankers,
    /// Toward negative infinity.
    Floor,
    /// Toward positive infinity.
    Ceil,
    /// Toward zero.
    Truncate,
}

impl RoundingMode {
    /// Parse a DSL mode name. Accepts the canonical names plus the common
    /// aliases seen in imported rule sets.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "HALF_UP" | "HALFUP" => Some(Self::HalfUp),
            "HALF_DOWN" | "HALFDOWN" => Some(Self::HalfDown),
            "BANKERS" | "HALF_EVEN" | "HALFEVEN" => Some(Self::Bankers),
            "FLOOR" => Some(Self::Floor),
            "CEIL" | "CEILING" => Some(Self::Ceil),
            "TRUNCATE" | "TRUNC" => Some(Self::Truncate),
            _ => None,
        }
    }

    fn strategy(self) -> RoundingStrategy {
        match self {
            Self::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            Self::HalfDown => RoundingStrategy::MidpointTowardZero,
            Self::Bankers => RoundingStrategy::MidpointNearestEven,
            Self::Floor => RoundingStrategy::ToNegativeInfinity,
            Self::Ceil => RoundingStrategy::ToPositiveInfinity,
            Self::Truncate => RoundingStrategy::ToZero,
        }
    }
}

/// Round `value` to `precision` fractional digits under `mode`.
///
/// Negative precision rounds at the tens/hundreds/... positions, e.g.
/// `round(1250, -2, HalfUp) == 1300`. Decimal all the way down; the binary
/// rounding of a float never touches the value.
pub fn round(value: Decimal, precision: i32, mode: RoundingMode) -> Decimal {
    if precision >= 0 {
        return value.round_dp_with_strategy(precision as u32, mode.strategy());
    }
    let shift = -precision as u32;
    if shift > 28 {
        // Everything rounds away below 10^28; only the sign could survive,
        // and no payroll magnitude gets here.
        return Decimal::ZERO;
    }
    let factor = Decimal::from_i128_with_scale(10i128.pow(shift), 0);
    let scaled = match value.checked_div(factor) {
        Some(s) => s.round_dp_with_strategy(0, mode.strategy()),
        None => return Decimal::ZERO,
    };
    scaled.checked_mul(factor).unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn bankers_breaks_ties_to_even() {
        assert_eq!(round(d("2.5"), 0, RoundingMode::Bankers), d("2"));
        assert_eq!(round(d("3.5"), 0, RoundingMode::Bankers), d("4"));
        assert_eq!(round(d("2.25"), 1, RoundingMode::Bankers), d("2.2"));
        assert_eq!(round(d("2.35"), 1, RoundingMode::Bankers), d("2.4"));
    }

    #[test]
    fn half_up_and_half_down_at_the_midpoint() {
        assert_eq!(round(d("2.5"), 0, RoundingMode::HalfUp), d("3"));
        assert_eq!(round(d("-2.5"), 0, RoundingMode::HalfUp), d("-3"));
        assert_eq!(round(d("2.5"), 0, RoundingMode::HalfDown), d("2"));
        assert_eq!(round(d("-2.5"), 0, RoundingMode::HalfDown), d("-2"));
    }

    #[test]
    fn directed_modes() {
        assert_eq!(round(d("2.1"), 0, RoundingMode::Floor), d("2"));
        assert_eq!(round(d("-2.1"), 0, RoundingMode::Floor), d("-3"));
        assert_eq!(round(d("2.1"), 0, RoundingMode::Ceil), d("3"));
        assert_eq!(round(d("-2.1"), 0, RoundingMode::Ceil), d("-2"));
        assert_eq!(round(d("-2.9"), 0, RoundingMode::Truncate), d("-2"));
    }

    #[test]
    fn negative_precision_rounds_whole_positions() {
        assert_eq!(round(d("1250"), -2, RoundingMode::HalfUp), d("1300"));
        assert_eq!(round(d("1249.99"), -2, RoundingMode::HalfUp), d("1200"));
        assert_eq!(round(d("-1250"), -2, RoundingMode::Floor), d("-1300"));
    }

    #[test]
    fn mode_names_parse_case_insensitively() {
        assert_eq!(RoundingMode::parse("half_up"), Some(RoundingMode::HalfUp));
        assert_eq!(RoundingMode::parse("BANKERS"), Some(RoundingMode::Bankers));
        assert_eq!(RoundingMode::parse("Ceiling"), Some(RoundingMode::Ceil));
        assert_eq!(RoundingMode::parse("nearest"), None);
    }
}
