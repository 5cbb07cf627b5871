//! Complex-unit calculation.
//!
//! Turns a physical lot (gross weight, bag count, tare per bag) and a
//! price per trading unit into the invoice weight, the stock weight, the
//! total amount and the inventory cost per kg.

pub mod formula;

#[cfg(test)]
mod formula_props;

pub use formula::{ComplexUnitInput, ComplexUnitResult, FormulaKey, calculate};
