//! Exact decimal amounts. Never IEEE-754 — every transfer/order amount is a
//! `rust_decimal::Decimal`, the direct analogue of `original_source`'s
//! `shopspring/decimal` usage.

use rust_decimal::{Decimal, RoundingStrategy};

/// Amount type used throughout the matcher and order model.
pub type Amount = Decimal;

/// `ROUND_HALF_UP` at `dp` decimal places, matching the original source's
/// `round()` helper (classical half-up on the scaled magnitude, not banker's
/// rounding). `rust_decimal`'s default `round_dp` is midpoint-to-even, so the
/// `MidpointAwayFromZero` strategy is used to reproduce half-up on the
/// unsigned case and preserve the signed floor-scaled behavior §4.J/§8
/// documents as authoritative (e.g. `round_half_up(-0.5, 0) == 0`... see
/// `rate::syntax::round_half_up` for the floating-point variant used by the
/// rate aggregator, which is the one the invariant in §8 is stated against).
pub fn round_half_up_decimal(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn half_up_rounds_away_from_zero_at_midpoint() {
        let v = Decimal::from_str("1.005").unwrap();
        assert_eq!(round_half_up_decimal(v, 2), Decimal::from_str("1.01").unwrap());
    }

    #[test]
    fn round_off_precision_example() {
        // amount_match round_off mode: match(1.234500, 1.2345, @4dp) = true
        let a = Decimal::from_str("1.234500").unwrap();
        let b = Decimal::from_str("1.2345").unwrap();
        assert_eq!(round_half_up_decimal(a, 4), round_half_up_decimal(b, 4));
    }
}
