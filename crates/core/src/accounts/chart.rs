//! Default chart of accounts seeded on an empty book.

use super::types::AccountKind;
use crate::settings::AccountRole;

/// One seeded account and the role it fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultAccount {
    /// Display name.
    pub name: &'static str,
    /// Classification.
    pub kind: AccountKind,
    /// Role assigned at bootstrap.
    pub role: AccountRole,
}

/// The default chart, one account per role.
#[must_use]
pub fn default_chart() -> Vec<DefaultAccount> {
    vec![
        DefaultAccount {
            name: "Cash",
            kind: AccountKind::Cash,
            role: AccountRole::Cash,
        },
        DefaultAccount {
            name: "Inventory",
            kind: AccountKind::Inventory,
            role: AccountRole::Inventory,
        },
        DefaultAccount {
            name: "Accounts Receivable",
            kind: AccountKind::Receivable,
            role: AccountRole::Receivable,
        },
        DefaultAccount {
            name: "Accounts Payable",
            kind: AccountKind::Payable,
            role: AccountRole::Payable,
        },
        DefaultAccount {
            name: "Sales Revenue",
            kind: AccountKind::Revenue,
            role: AccountRole::SalesRevenue,
        },
        DefaultAccount {
            name: "Cost of Goods Sold",
            kind: AccountKind::Expense,
            role: AccountRole::Cogs,
        },
        DefaultAccount {
            name: "Inventory Loss",
            kind: AccountKind::Expense,
            role: AccountRole::InventoryLoss,
        },
        DefaultAccount {
            name: "Inventory Gain",
            kind: AccountKind::Revenue,
            role: AccountRole::InventoryGain,
        },
        DefaultAccount {
            name: "Owner Equity",
            kind: AccountKind::Equity,
            role: AccountRole::OwnerEquity,
        },
        DefaultAccount {
            name: "General Expenses",
            kind: AccountKind::Expense,
            role: AccountRole::GeneralExpenses,
        },
        DefaultAccount {
            name: "Retained Earnings",
            kind: AccountKind::Equity,
            role: AccountRole::RetainedEarnings,
        },
        DefaultAccount {
            name: "Income Summary",
            kind: AccountKind::Equity,
            role: AccountRole::IncomeSummary,
        },
    ]
}
