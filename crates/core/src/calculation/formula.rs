//! Formula keys and the calculation itself.

use std::fmt;
use std::str::FromStr;

use granary_shared::types::round_internal;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{KernelError, KernelResult};

/// Trading-unit formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormulaKey {
    /// Local qantar of 160 kg. Invoiced on gross, stocked net of a notional tare.
    QantarBaladi,
    /// Government qantar of 157.5 kg. Tare is deducted on both sides.
    QantarGovernment,
    /// Metric ton.
    Ton,
    /// Plain kilograms.
    Kg,
}

impl FormulaKey {
    /// Every formula.
    pub const ALL: [Self; 4] = [
        Self::QantarBaladi,
        Self::QantarGovernment,
        Self::Ton,
        Self::Kg,
    ];

    /// Kilograms per trading unit.
    #[must_use]
    pub fn factor(self) -> Decimal {
        match self {
            Self::QantarBaladi => Decimal::from(160),
            Self::QantarGovernment => Decimal::new(1575, 1),
            Self::Ton => Decimal::from(1000),
            Self::Kg => Decimal::ONE,
        }
    }

    /// Stable key.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::QantarBaladi => "qantar_baladi",
            Self::QantarGovernment => "qantar_government",
            Self::Ton => "ton",
            Self::Kg => "kg",
        }
    }
}

impl fmt::Display for FormulaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormulaKey {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| {
                KernelError::validation("calculation_formula", format!("unknown formula `{s}`"))
            })
    }
}

/// Inputs of a complex-unit calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexUnitInput {
    /// Formula key.
    pub formula: FormulaKey,
    /// Gross weight in kg.
    pub gross_weight_kg: Decimal,
    /// Number of bags.
    pub bag_count: i64,
    /// Tare per bag in kg.
    pub tare_per_bag_kg: Decimal,
    /// Price per trading unit.
    pub unit_price: Decimal,
    /// Overrides the formula's factor when set.
    pub custom_factor: Option<Decimal>,
}

/// Outputs of a complex-unit calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexUnitResult {
    /// Weight the invoice is computed on.
    pub net_for_invoice_kg: Decimal,
    /// Weight that enters stock.
    pub net_for_inventory_kg: Decimal,
    /// Total tare (bags times tare per bag).
    pub tare_weight_kg: Decimal,
    /// Factor applied.
    pub conversion_factor: Decimal,
    /// Invoice weight expressed in trading units.
    pub quantity_in_unit: Decimal,
    /// Invoice total, rounded to 4 dp.
    pub total_amount: Decimal,
    /// Total divided by the stock weight, rounded to 4 dp.
    pub cost_per_kg_inventory: Decimal,
}

/// Runs the calculation.
///
/// Intermediates keep full precision; only the total and the cost per kg
/// are rounded.
pub fn calculate(input: &ComplexUnitInput) -> KernelResult<ComplexUnitResult> {
    let gross = input.gross_weight_kg;
    if gross <= Decimal::ZERO {
        return Err(KernelError::validation(
            "gross_weight_kg",
            "gross weight must be positive",
        ));
    }
    if input.unit_price < Decimal::ZERO {
        return Err(KernelError::validation(
            "unit_price",
            "unit price must not be negative",
        ));
    }
    if input.bag_count < 0 {
        return Err(KernelError::validation(
            "bag_count",
            "bag count must not be negative",
        ));
    }
    if input.tare_per_bag_kg < Decimal::ZERO {
        return Err(KernelError::validation(
            "tare_per_bag_kg",
            "tare must not be negative",
        ));
    }

    let tare = Decimal::from(input.bag_count) * input.tare_per_bag_kg;
    if input.bag_count > 0 && tare >= gross {
        return Err(KernelError::validation(
            "tare_per_bag_kg",
            format!("total tare {tare} kg must be below gross weight {gross} kg"),
        ));
    }

    let (net_for_invoice, net_for_inventory) = match input.formula {
        FormulaKey::QantarBaladi => (gross, gross - tare),
        FormulaKey::QantarGovernment => (gross - tare, gross - tare),
        FormulaKey::Ton | FormulaKey::Kg => (gross, gross),
    };

    let factor = match input.custom_factor {
        Some(custom) if custom <= Decimal::ZERO => {
            return Err(KernelError::validation(
                "conversion_factor",
                "conversion factor must be positive",
            ));
        }
        Some(custom) => custom,
        None => input.formula.factor(),
    };

    let quantity_in_unit = net_for_invoice / factor;
    let total_amount = round_internal(quantity_in_unit * input.unit_price);
    let cost_per_kg_inventory = if net_for_inventory > Decimal::ZERO {
        round_internal(total_amount / net_for_inventory)
    } else {
        Decimal::ZERO
    };

    Ok(ComplexUnitResult {
        net_for_invoice_kg: net_for_invoice,
        net_for_inventory_kg: net_for_inventory,
        tare_weight_kg: tare,
        conversion_factor: factor,
        quantity_in_unit,
        total_amount,
        cost_per_kg_inventory,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn input(
        formula: FormulaKey,
        gross: Decimal,
        bags: i64,
        tare: Decimal,
        price: Decimal,
    ) -> ComplexUnitInput {
        ComplexUnitInput {
            formula,
            gross_weight_kg: gross,
            bag_count: bags,
            tare_per_bag_kg: tare,
            unit_price: price,
            custom_factor: None,
        }
    }

    #[test]
    fn test_government_qantar() {
        let result = calculate(&input(
            FormulaKey::QantarGovernment,
            dec!(2400),
            10,
            dec!(2.5),
            dec!(8000),
        ))
        .unwrap();

        assert_eq!(result.tare_weight_kg, dec!(25));
        assert_eq!(result.net_for_invoice_kg, dec!(2375));
        assert_eq!(result.net_for_inventory_kg, dec!(2375));
        assert_eq!(result.conversion_factor, dec!(157.5));
        assert_eq!(result.total_amount, dec!(120634.9206));
        assert_eq!(result.cost_per_kg_inventory, dec!(50.7937));
    }

    #[test]
    fn test_baladi_qantar_invoices_gross() {
        let result = calculate(&input(
            FormulaKey::QantarBaladi,
            dec!(1600),
            8,
            dec!(2),
            dec!(1000),
        ))
        .unwrap();

        assert_eq!(result.net_for_invoice_kg, dec!(1600));
        assert_eq!(result.net_for_inventory_kg, dec!(1584));
        assert_eq!(result.total_amount, dec!(10000));
        assert_eq!(result.cost_per_kg_inventory, dec!(6.3131));
    }

    #[rstest]
    #[case(FormulaKey::Ton, dec!(2500), dec!(4000), dec!(10000))]
    #[case(FormulaKey::Kg, dec!(1000), dec!(10), dec!(10000))]
    fn test_simple_formulas(
        #[case] formula: FormulaKey,
        #[case] gross: Decimal,
        #[case] price: Decimal,
        #[case] total: Decimal,
    ) {
        let result = calculate(&input(formula, gross, 0, Decimal::ZERO, price)).unwrap();
        assert_eq!(result.net_for_invoice_kg, gross);
        assert_eq!(result.net_for_inventory_kg, gross);
        assert_eq!(result.total_amount, total);
    }

    #[test]
    fn test_custom_factor_overrides() {
        let mut req = input(FormulaKey::Kg, dec!(500), 0, Decimal::ZERO, dec!(120));
        req.custom_factor = Some(dec!(50));
        let result = calculate(&req).unwrap();
        assert_eq!(result.quantity_in_unit, dec!(10));
        assert_eq!(result.total_amount, dec!(1200));
        assert_eq!(result.cost_per_kg_inventory, dec!(2.4));
    }

    #[rstest]
    #[case(dec!(0), 0, dec!(0), dec!(10), "gross_weight_kg")]
    #[case(dec!(100), 10, dec!(10), dec!(10), "tare_per_bag_kg")]
    #[case(dec!(100), -1, dec!(1), dec!(10), "bag_count")]
    #[case(dec!(100), 0, dec!(0), dec!(-1), "unit_price")]
    fn test_validation(
        #[case] gross: Decimal,
        #[case] bags: i64,
        #[case] tare: Decimal,
        #[case] price: Decimal,
        #[case] field: &str,
    ) {
        let err =
            calculate(&input(FormulaKey::QantarGovernment, gross, bags, tare, price)).unwrap_err();
        match err {
            KernelError::Validation { field: f, .. } => assert_eq!(f, field),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_custom_factor_rejected() {
        let mut req = input(FormulaKey::Kg, dec!(10), 0, Decimal::ZERO, dec!(1));
        req.custom_factor = Some(Decimal::ZERO);
        assert!(calculate(&req).is_err());
    }

    #[test]
    fn test_formula_key_parse() {
        assert_eq!("qantar_baladi".parse::<FormulaKey>(), Ok(FormulaKey::QantarBaladi));
        assert!("bushel".parse::<FormulaKey>().is_err());
    }
}
