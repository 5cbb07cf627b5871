//! Account domain types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use granary_shared::types::AccountId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::KernelError;

/// Side on which an account's balance grows.
///
/// - Asset/Expense: balance += debit - credit
/// - Liability/Equity/Revenue: balance += credit - debit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalSide {
    /// Debit-normal accounts (Asset, Expense)
    Debit,
    /// Credit-normal accounts (Liability, Equity, Revenue)
    Credit,
}

impl NormalSide {
    /// Calculates the balance change contributed by one leg.
    #[must_use]
    pub fn balance_change(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self {
            Self::Debit => debit - credit,
            Self::Credit => credit - debit,
        }
    }
}

/// Account classification.
///
/// Cash, inventory and receivable accounts are assets with a dedicated
/// kind; payables are liabilities with a dedicated kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountKind {
    /// Generic asset.
    Asset,
    /// Cash on hand.
    Cash,
    /// Stock valuation.
    Inventory,
    /// Money owed by customers.
    Receivable,
    /// Generic liability.
    Liability,
    /// Money owed to suppliers.
    Payable,
    /// Owner claims.
    Equity,
    /// Income.
    Revenue,
    /// Costs.
    Expense,
}

impl AccountKind {
    /// All kinds, in chart order.
    pub const ALL: [Self; 9] = [
        Self::Asset,
        Self::Cash,
        Self::Inventory,
        Self::Receivable,
        Self::Liability,
        Self::Payable,
        Self::Equity,
        Self::Revenue,
        Self::Expense,
    ];

    /// Returns the normal side for this kind.
    #[must_use]
    pub fn normal_side(self) -> NormalSide {
        match self {
            Self::Asset | Self::Cash | Self::Inventory | Self::Receivable | Self::Expense => {
                NormalSide::Debit
            }
            Self::Liability | Self::Payable | Self::Equity | Self::Revenue => NormalSide::Credit,
        }
    }

    /// True for the balance-sheet asset group.
    #[must_use]
    pub fn is_asset(self) -> bool {
        matches!(
            self,
            Self::Asset | Self::Cash | Self::Inventory | Self::Receivable
        )
    }

    /// True for the balance-sheet liability group.
    #[must_use]
    pub fn is_liability(self) -> bool {
        matches!(self, Self::Liability | Self::Payable)
    }

    /// Stable storage code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "ASSET",
            Self::Cash => "CASH",
            Self::Inventory => "INVENTORY",
            Self::Receivable => "RECEIVABLE",
            Self::Liability => "LIABILITY",
            Self::Payable => "PAYABLE",
            Self::Equity => "EQUITY",
            Self::Revenue => "REVENUE",
            Self::Expense => "EXPENSE",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountKind {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ASSET" => Ok(Self::Asset),
            "CASH" => Ok(Self::Cash),
            "INVENTORY" => Ok(Self::Inventory),
            "RECEIVABLE" => Ok(Self::Receivable),
            "LIABILITY" => Ok(Self::Liability),
            "PAYABLE" => Ok(Self::Payable),
            "EQUITY" => Ok(Self::Equity),
            "REVENUE" => Ok(Self::Revenue),
            "EXPENSE" => Ok(Self::Expense),
            other => Err(KernelError::validation(
                "account_type",
                format!("unknown account type `{other}`"),
            )),
        }
    }
}

/// A chart-of-accounts entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialAccount {
    /// Account id.
    pub id: AccountId,
    /// Display name.
    pub name: String,
    /// Classification.
    pub account_type: AccountKind,
    /// Inactive accounts refuse new postings.
    pub is_active: bool,
    /// Running balance in the account's natural direction.
    pub balance: Decimal,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl FinancialAccount {
    /// Returns the normal side of the account.
    #[must_use]
    pub fn normal_side(&self) -> NormalSide {
        self.account_type.normal_side()
    }

    /// Applies one leg to the running balance.
    pub fn apply(&mut self, debit: Decimal, credit: Decimal) {
        self.balance += self.normal_side().balance_change(debit, credit);
    }
}

/// Input for creating an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    /// Display name.
    pub name: String,
    /// Classification.
    pub account_type: AccountKind,
}
