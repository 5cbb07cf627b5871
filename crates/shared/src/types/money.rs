//! Fixed-point decimal helpers.
//!
//! CRITICAL: Never use floating-point for money or quantities.
//! Every stored amount and quantity carries four fractional digits and is
//! rounded half-up (away from zero). Reports round to two digits.

use rust_decimal::{Decimal, RoundingStrategy};

/// Fractional digits kept on stored amounts and quantities.
pub const INTERNAL_SCALE: u32 = 4;

/// Fractional digits shown on reports.
pub const REPORT_SCALE: u32 = 2;

/// Maximum |debit - credit| accepted for a posting group (0.01).
pub const BALANCE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Quantities at or below this are treated as zero (0.0001 kg).
pub const QUANTITY_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 4);

/// Rounds to the internal 4-digit scale, half-up.
#[must_use]
pub fn round_internal(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(INTERNAL_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds to the 2-digit reporting scale, half-up.
#[must_use]
pub fn round_report(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(REPORT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns true if `value` is within [`QUANTITY_EPSILON`] of zero.
#[must_use]
pub fn is_effectively_zero(value: Decimal) -> bool {
    value.abs() <= QUANTITY_EPSILON
}

/// Returns true if `a` and `b` differ by no more than `tolerance`.
#[must_use]
pub fn approx_eq(a: Decimal, b: Decimal, tolerance: Decimal) -> bool {
    (a - b).abs() <= tolerance
}
