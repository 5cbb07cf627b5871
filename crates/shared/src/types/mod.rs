//! Common types used across the application.

pub mod id;
pub mod money;

#[cfg(test)]
mod id_tests;
#[cfg(test)]
mod money_tests;

pub use id::*;
pub use money::{
    BALANCE_TOLERANCE, QUANTITY_EPSILON, approx_eq, is_effectively_zero, round_internal,
    round_report,
};
