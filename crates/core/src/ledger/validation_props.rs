//! Property-based tests for posting leg validation.

use granary_shared::types::AccountId;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::validation::{PostingLeg, validate_legs};
use crate::error::KernelError;

/// Strategy to generate a valid positive amount (0.01 to 1,000,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn active(_: AccountId) -> Option<bool> {
    Some(true)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Splitting a debit across many credits always validates.
    #[test]
    fn prop_split_credits_balance(parts in prop::collection::vec(positive_amount(), 1..8)) {
        let total: Decimal = parts.iter().copied().sum();
        let mut legs = vec![PostingLeg::debit(AccountId::new(), total, "split")];
        legs.extend(
            parts
                .iter()
                .map(|amount| PostingLeg::credit(AccountId::new(), *amount, "part")),
        );

        let totals = validate_legs(&legs, active).unwrap();
        prop_assert_eq!(totals.total_debit, total);
        prop_assert_eq!(totals.total_credit, total);
    }

    /// Zero-amount legs are rejected.
    #[test]
    fn prop_zero_leg_rejected(amount in positive_amount()) {
        let legs = vec![
            PostingLeg::debit(AccountId::new(), amount, "x"),
            PostingLeg::credit(AccountId::new(), amount, "x"),
            PostingLeg::credit(AccountId::new(), Decimal::ZERO, "x"),
        ];
        let result = validate_legs(&legs, active);
        prop_assert!(matches!(result, Err(KernelError::Validation { .. })), "got {:?}", result);
    }

    /// Negative amounts are rejected.
    #[test]
    fn prop_negative_rejected(amount in positive_amount()) {
        let legs = vec![
            PostingLeg::debit(AccountId::new(), -amount, "x"),
            PostingLeg::credit(AccountId::new(), -amount, "x"),
        ];
        let result = validate_legs(&legs, active);
        prop_assert!(matches!(result, Err(KernelError::Validation { .. })), "got {:?}", result);
    }

    /// Any difference above one cent is unbalanced.
    #[test]
    fn prop_gap_above_tolerance_rejected(amount in positive_amount(), gap_cents in 2i64..10_000) {
        let legs = vec![
            PostingLeg::debit(AccountId::new(), amount + Decimal::new(gap_cents, 2), "x"),
            PostingLeg::credit(AccountId::new(), amount, "x"),
        ];
        let result = validate_legs(&legs, active);
        prop_assert!(matches!(result, Err(KernelError::Unbalanced { .. })), "got {:?}", result);
    }
}
