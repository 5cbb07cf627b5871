//! Business rule validation for posting legs.

use granary_shared::types::{AccountId, BALANCE_TOLERANCE};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{KernelError, KernelResult};

/// One leg of a posting request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingLeg {
    /// Target account.
    pub account_id: AccountId,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Line description.
    pub description: String,
}

impl PostingLeg {
    /// A debit leg.
    pub fn debit(account_id: AccountId, amount: Decimal, description: impl Into<String>) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: Decimal::ZERO,
            description: description.into(),
        }
    }

    /// A credit leg.
    pub fn credit(account_id: AccountId, amount: Decimal, description: impl Into<String>) -> Self {
        Self {
            account_id,
            debit: Decimal::ZERO,
            credit: amount,
            description: description.into(),
        }
    }
}

/// Totals of a validated posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostingTotals {
    /// Sum of debits.
    pub total_debit: Decimal,
    /// Sum of credits.
    pub total_credit: Decimal,
}

/// Validates posting legs.
///
/// `account_state` returns `Some(is_active)` for known accounts and `None`
/// for unknown ones.
///
/// # Errors
///
/// - `Validation` for fewer than two legs, negative amounts, or legs
///   without exactly one positive side
/// - `NotFound` for an unknown account
/// - `InactiveAccount` for an inactive account
/// - `Unbalanced` when |Σdebit − Σcredit| > 0.01
pub fn validate_legs<F>(legs: &[PostingLeg], account_state: F) -> KernelResult<PostingTotals>
where
    F: Fn(AccountId) -> Option<bool>,
{
    if legs.len() < 2 {
        return Err(KernelError::validation(
            "legs",
            "a posting needs at least two legs",
        ));
    }

    let mut total_debit = Decimal::ZERO;
    let mut total_credit = Decimal::ZERO;

    for (i, leg) in legs.iter().enumerate() {
        if leg.debit < Decimal::ZERO || leg.credit < Decimal::ZERO {
            return Err(KernelError::validation(
                format!("legs[{i}]"),
                "amounts must not be negative",
            ));
        }
        let debit_side = leg.debit > Decimal::ZERO;
        let credit_side = leg.credit > Decimal::ZERO;
        if debit_side == credit_side {
            return Err(KernelError::validation(
                format!("legs[{i}]"),
                "exactly one of debit or credit must be positive",
            ));
        }

        match account_state(leg.account_id) {
            None => return Err(KernelError::not_found("Account", leg.account_id)),
            Some(false) => return Err(KernelError::InactiveAccount(leg.account_id)),
            Some(true) => {}
        }

        total_debit += leg.debit;
        total_credit += leg.credit;
    }

    if (total_debit - total_credit).abs() > BALANCE_TOLERANCE {
        return Err(KernelError::Unbalanced {
            debit: total_debit,
            credit: total_credit,
        });
    }

    Ok(PostingTotals {
        total_debit,
        total_credit,
    })
}
