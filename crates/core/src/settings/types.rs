//! Setting rows, account roles and tunables.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::KernelError;

/// One key/value setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    /// Setting key.
    pub key: String,
    /// Raw value.
    pub value: String,
    /// Last write.
    pub updated_at: DateTime<Utc>,
}

/// Symbolic account roles consulted by the event composers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountRole {
    /// Cash on hand.
    Cash,
    /// Inventory asset.
    Inventory,
    /// Accounts receivable.
    Receivable,
    /// Accounts payable.
    Payable,
    /// Sales revenue.
    SalesRevenue,
    /// Cost of goods sold.
    Cogs,
    /// Shortage and spoilage expense.
    InventoryLoss,
    /// Surplus income.
    InventoryGain,
    /// Owner equity.
    OwnerEquity,
    /// General expenses.
    GeneralExpenses,
    /// Retained earnings.
    RetainedEarnings,
    /// Equity clearing account debited or credited by season closing.
    IncomeSummary,
}

impl AccountRole {
    /// Every role, in bootstrap order.
    pub const ALL: [Self; 12] = [
        Self::Cash,
        Self::Inventory,
        Self::Receivable,
        Self::Payable,
        Self::SalesRevenue,
        Self::Cogs,
        Self::InventoryLoss,
        Self::InventoryGain,
        Self::OwnerEquity,
        Self::GeneralExpenses,
        Self::RetainedEarnings,
        Self::IncomeSummary,
    ];

    /// The settings key holding the account id.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Cash => "CASH_ACCOUNT_ID",
            Self::Inventory => "INVENTORY_ACCOUNT_ID",
            Self::Receivable => "ACCOUNTS_RECEIVABLE_ID",
            Self::Payable => "ACCOUNTS_PAYABLE_ID",
            Self::SalesRevenue => "SALES_REVENUE_ACCOUNT_ID",
            Self::Cogs => "COGS_ACCOUNT_ID",
            Self::InventoryLoss => "INVENTORY_LOSS_ACCOUNT_ID",
            Self::InventoryGain => "INVENTORY_GAIN_ACCOUNT_ID",
            Self::OwnerEquity => "OWNER_EQUITY_ID",
            Self::GeneralExpenses => "GENERAL_EXPENSES_ACCOUNT_ID",
            Self::RetainedEarnings => "RETAINED_EARNINGS_ACCOUNT_ID",
            Self::IncomeSummary => "INCOME_SUMMARY_ACCOUNT_ID",
        }
    }
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for AccountRole {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.key() == s)
            .ok_or_else(|| KernelError::validation("role", format!("unknown account role `{s}`")))
    }
}

/// Tunable keys mirrored from configuration into the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tunable {
    /// Threshold assigned to new crops.
    LowStockThresholdKg,
    /// Dual-balance discrepancy threshold.
    DiscrepancyTolerance,
    /// Whether a sale return also moves the restocked cost out of COGS.
    SaleReturnReversesCogs,
}

impl Tunable {
    /// The settings key.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::LowStockThresholdKg => "LOW_STOCK_THRESHOLD_KG",
            Self::DiscrepancyTolerance => "DISCREPANCY_TOLERANCE",
            Self::SaleReturnReversesCogs => "SALE_RETURN_REVERSES_COGS",
        }
    }
}
