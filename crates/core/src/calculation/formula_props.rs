//! Property-based tests for the complex-unit calculation.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::formula::{ComplexUnitInput, FormulaKey, calculate};

fn formula_strategy() -> impl Strategy<Value = FormulaKey> {
    prop_oneof![
        Just(FormulaKey::QantarBaladi),
        Just(FormulaKey::QantarGovernment),
        Just(FormulaKey::Ton),
        Just(FormulaKey::Kg),
    ]
}

/// Gross weight between 100.0 and 100,000.0 kg.
fn gross_strategy() -> impl Strategy<Value = Decimal> {
    (1_000i64..1_000_000i64).prop_map(|v| Decimal::new(v, 1))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Stock weight never exceeds invoice weight, and tare stays below gross.
    #[test]
    fn prop_inventory_weight_bounded(
        formula in formula_strategy(),
        gross in gross_strategy(),
        bags in 0i64..20,
        tare_tenths in 0i64..25,
        price_cents in 1i64..1_000_000,
    ) {
        let input = ComplexUnitInput {
            formula,
            gross_weight_kg: gross,
            bag_count: bags,
            tare_per_bag_kg: Decimal::new(tare_tenths, 1),
            unit_price: Decimal::new(price_cents, 2),
            custom_factor: None,
        };
        let result = calculate(&input).unwrap();

        prop_assert!(result.net_for_inventory_kg > Decimal::ZERO);
        prop_assert!(result.net_for_inventory_kg <= gross);
        prop_assert!(result.net_for_invoice_kg <= gross);
        prop_assert!(result.total_amount >= Decimal::ZERO);
        prop_assert!(result.total_amount.scale() <= 4);
    }

    /// Cost per kg times stock weight reproduces the total within rounding.
    #[test]
    fn prop_cost_per_kg_reproduces_total(
        formula in formula_strategy(),
        gross in gross_strategy(),
        price_cents in 1i64..1_000_000,
    ) {
        let input = ComplexUnitInput {
            formula,
            gross_weight_kg: gross,
            bag_count: 0,
            tare_per_bag_kg: Decimal::ZERO,
            unit_price: Decimal::new(price_cents, 2),
            custom_factor: None,
        };
        let result = calculate(&input).unwrap();
        let rebuilt = result.cost_per_kg_inventory * result.net_for_inventory_kg;
        // Rounding the cost to 4 dp moves the total by at most half a unit per kg.
        let bound = result.net_for_inventory_kg * Decimal::new(5, 5) + Decimal::new(1, 4);
        prop_assert!((rebuilt - result.total_amount).abs() <= bound);
    }
}
