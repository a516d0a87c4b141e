//! Rounding and input helpers shared by the cost calculations.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds to whole centavos, with midpoints going away from zero.
///
/// Costs are kept at full precision internally; this is applied when an
/// amount is shown to the user.
///
/// ```
/// use rust_decimal_macros::dec;
/// use estimator_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(310.745)), dec!(310.75));
/// assert_eq!(round_half_up(dec!(-0.005)), dec!(-0.01));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Strips surrounding whitespace and thousands separators from typed input.
pub(crate) fn normalize_decimal_input(s: &str) -> String {
    s.trim().replace(',', "")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn midpoint_goes_up() {
        assert_eq!(round_half_up(dec!(1450.125)), dec!(1450.13));
    }

    #[test]
    fn below_midpoint_goes_down() {
        assert_eq!(round_half_up(dec!(1450.124)), dec!(1450.12));
    }

    #[test]
    fn negative_midpoint_goes_away_from_zero() {
        assert_eq!(round_half_up(dec!(-38.005)), dec!(-38.01));
    }

    #[test]
    fn carry_reaches_whole_pesos() {
        assert_eq!(round_half_up(dec!(102599.995)), dec!(102600.00));
    }

    #[test]
    fn input_loses_grouping_and_padding() {
        assert_eq!(normalize_decimal_input("  1,234.5 "), "1234.5");
        assert_eq!(normalize_decimal_input("85"), "85");
    }
}
