//! Remainder-safe proportional allocation.

use rust_decimal::Decimal;

use crate::round::{round, RoundingMode};

/// Split `amount` across `weights`, rounding each part to `precision` under
/// `mode`, with the guarantee that the parts sum *exactly* to `amount`.
///
/// The rounding residual (amount minus the sum of rounded parts) is added in
/// full to the bucket holding the largest rounded part, where it distorts the
/// distribution least in relative terms. A zero total weight puts the whole
/// amount in the first bucket. Empty weights yield an empty split.
pub fn allocate(
    amount: Decimal,
    weights: &[Decimal],
    precision: i32,
    mode: RoundingMode,
) -> Vec<Decimal> {
    if weights.is_empty() {
        return Vec::new();
    }

    let total: Decimal = weights.iter().copied().sum();
    let mut parts: Vec<Decimal> = if total.is_zero() {
        vec![Decimal::ZERO; weights.len()]
    } else {
        weights
            .iter()
            .map(|w| {
                let raw = amount
                    .checked_mul(*w)
                    .and_then(|p| p.checked_div(total))
                    .unwrap_or(Decimal::ZERO);
                round(raw, precision, mode)
            })
            .collect()
    };

    let assigned: Decimal = parts.iter().copied().sum();
    let residual = amount - assigned;
    if !residual.is_zero() {
        let mut largest = 0;
        for (i, part) in parts.iter().enumerate().skip(1) {
            if *part > parts[largest] {
                largest = i;
            }
        }
        parts[largest] += residual;
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn thirds_of_a_hundred_sum_back() {
        let parts = allocate(d("100"), &[d("1"), d("1"), d("1")], 2, RoundingMode::HalfUp);
        assert_eq!(parts.iter().copied().sum::<Decimal>(), d("100"));
        // 33.33 + 33.33 + 33.33 leaves 0.01 on the first (largest) bucket.
        assert_eq!(parts, vec![d("33.34"), d("33.33"), d("33.33")]);
    }

    #[test]
    fn residual_lands_on_the_largest_part() {
        let parts = allocate(d("100"), &[d("1"), d("2"), d("1")], 2, RoundingMode::Truncate);
        assert_eq!(parts.iter().copied().sum::<Decimal>(), d("100"));
        assert_eq!(parts[1], d("50"));
    }

    #[test]
    fn zero_weight_buckets_get_nothing() {
        let parts = allocate(d("10"), &[d("0"), d("1")], 2, RoundingMode::HalfUp);
        assert_eq!(parts, vec![d("0"), d("10")]);
    }

    #[test]
    fn zero_total_weight_goes_to_the_first_bucket() {
        let parts = allocate(d("10"), &[d("0"), d("0")], 2, RoundingMode::HalfUp);
        assert_eq!(parts, vec![d("10"), d("0")]);
    }

    #[test]
    fn empty_weights_yield_empty_split() {
        assert_eq!(
            allocate(d("10"), &[], 2, RoundingMode::HalfUp),
            Vec::<Decimal>::new()
        );
    }

    #[test]
    fn negative_amounts_allocate_symmetrically() {
        let parts = allocate(d("-100"), &[d("1"), d("1"), d("1")], 2, RoundingMode::HalfUp);
        assert_eq!(parts.iter().copied().sum::<Decimal>(), d("-100"));
    }
}
