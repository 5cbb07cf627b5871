//! Report data types.
//!
//! Every amount in a report is rounded to 2 dp half-up.

use chrono::NaiveDate;
use granary_shared::types::{AccountId, CropId, SeasonId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::accounts::AccountKind;
use crate::ledger::SourceKind;

/// One account's totals in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountLine {
    /// Account id.
    pub account_id: AccountId,
    /// Account name.
    pub name: String,
    /// Account kind.
    pub account_type: AccountKind,
    /// Total debit amount.
    pub total_debit: Decimal,
    /// Total credit amount.
    pub total_credit: Decimal,
    /// Balance on the account's normal side.
    pub balance: Decimal,
}

/// Trial balance report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceReport {
    /// Last day included.
    pub as_of: NaiveDate,
    /// Account rows.
    pub accounts: Vec<AccountLine>,
    /// Totals.
    pub totals: TrialBalanceTotals,
}

/// Trial balance totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceTotals {
    /// Total debit.
    pub total_debit: Decimal,
    /// Total credit.
    pub total_credit: Decimal,
    /// Whether debits equal credits within tolerance.
    pub is_balanced: bool,
}

/// A group of accounts with a total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSection {
    /// Section total.
    pub total: Decimal,
    /// Accounts in this section.
    pub accounts: Vec<AccountLine>,
}

/// Income statement report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeStatementReport {
    /// Period start date.
    pub period_start: NaiveDate,
    /// Period end date.
    pub period_end: NaiveDate,
    /// Revenue accounts.
    pub revenue: ReportSection,
    /// The COGS account.
    pub cost_of_goods_sold: ReportSection,
    /// Revenue minus COGS.
    pub gross_profit: Decimal,
    /// Other expense accounts.
    pub operating_expenses: ReportSection,
    /// Net income.
    pub net_income: Decimal,
}

/// Balance sheet report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSheetReport {
    /// As of date.
    pub as_of: NaiveDate,
    /// Asset, cash, inventory and receivable accounts.
    pub assets: ReportSection,
    /// Liability and payable accounts.
    pub liabilities: ReportSection,
    /// Equity accounts.
    pub equity: ReportSection,
    /// Revenue less expenses through `as_of` not yet closed into equity.
    pub retained_earnings: Decimal,
    /// Total assets.
    pub total_assets: Decimal,
    /// Total liabilities.
    pub total_liabilities: Decimal,
    /// Equity accounts plus retained earnings.
    pub total_equity: Decimal,
    /// Liabilities plus equity.
    pub liabilities_and_equity: Decimal,
    /// Whether assets equal liabilities plus equity within tolerance.
    pub is_balanced: bool,
}

/// Movement of equity over a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquityStatementReport {
    /// Period start date.
    pub period_start: NaiveDate,
    /// Period end date.
    pub period_end: NaiveDate,
    /// Total equity the day before `period_start`.
    pub beginning_equity: Decimal,
    /// Net income of the period.
    pub net_income: Decimal,
    /// Owner contributions.
    pub contributions: Decimal,
    /// Owner withdrawals.
    pub withdrawals: Decimal,
    /// Opening stock, journals and other equity movements.
    pub other_changes: Decimal,
    /// Total equity at `period_end`.
    pub ending_equity: Decimal,
}

/// Cash-flow classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CashFlowActivity {
    /// Trading and expenses.
    Operating,
    /// Long-lived assets.
    Investing,
    /// Owner capital.
    Financing,
}

/// Cash movement of one source kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowLine {
    /// Source kind of the cash legs.
    pub source_kind: SourceKind,
    /// Net inflow (negative for outflow).
    pub amount: Decimal,
}

/// One cash-flow section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowSection {
    /// Net inflow of the section.
    pub total: Decimal,
    /// Lines per source kind.
    pub lines: Vec<CashFlowLine>,
}

/// Cash-flow statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowReport {
    /// Period start date.
    pub period_start: NaiveDate,
    /// Period end date.
    pub period_end: NaiveDate,
    /// Cash before the period.
    pub opening_balance: Decimal,
    /// Operating activities.
    pub operating: CashFlowSection,
    /// Investing activities.
    pub investing: CashFlowSection,
    /// Financing activities.
    pub financing: CashFlowSection,
    /// Sum of the three sections.
    pub net_change: Decimal,
    /// Opening balance plus net change.
    pub closing_balance: Decimal,
    /// Whether the closing balance matches the cash legs through `period_end`.
    pub is_reconciled: bool,
}

/// Assets against liabilities plus equity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEquation {
    /// Total assets.
    pub assets: Decimal,
    /// Total liabilities.
    pub liabilities: Decimal,
    /// Equity including current earnings.
    pub equity: Decimal,
    /// Assets minus liabilities and equity.
    pub difference: Decimal,
}

/// Ledger view against the physical stock view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DualBalanceReport {
    /// Equation from account balances.
    pub ledger_view: BalanceEquation,
    /// Equation with the inventory account replaced by stock value.
    pub physical_view: BalanceEquation,
    /// Inventory account balance.
    pub ledger_inventory: Decimal,
    /// Σ net stock × average cost over all crops.
    pub physical_inventory: Decimal,
    /// Ledger minus physical inventory.
    pub inventory_difference: Decimal,
    /// Threshold above which the difference is flagged.
    pub tolerance: Decimal,
    /// True when the difference exceeds the tolerance.
    pub discrepancy_detected: bool,
}

/// What the business holds against where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapitalDistributionReport {
    /// Cash account balance.
    pub cash: Decimal,
    /// Physical stock value.
    pub inventory_value: Decimal,
    /// Event-derived receivables.
    pub receivables: Decimal,
    /// Cash plus inventory plus receivables.
    pub total_assets: Decimal,
    /// Equity account balances.
    pub owner_capital: Decimal,
    /// All-time revenue minus expenses.
    pub net_profit: Decimal,
    /// Event-derived payables.
    pub payables: Decimal,
    /// Capital plus profit plus payables.
    pub total_sources: Decimal,
    /// Assets minus sources.
    pub difference: Decimal,
}

/// Trading result of one crop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropProfitRow {
    /// Crop id.
    pub crop_id: CropId,
    /// Crop name.
    pub crop_name: String,
    /// Kg sold.
    pub sold_kg: Decimal,
    /// Sales total.
    pub sales_total: Decimal,
    /// Kg bought.
    pub purchased_kg: Decimal,
    /// Purchases total.
    pub purchases_total: Decimal,
    /// Sales minus purchases.
    pub profit: Decimal,
    /// Profit as a percentage of sales.
    pub margin_percent: Decimal,
}

/// Per-crop trading result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropProfitabilityReport {
    /// Season filter.
    pub season_id: Option<SeasonId>,
    /// One row per crop with activity.
    pub crops: Vec<CropProfitRow>,
    /// Sum of sales.
    pub total_sales: Decimal,
    /// Sum of purchases.
    pub total_purchases: Decimal,
    /// Sum of profits.
    pub total_profit: Decimal,
}

/// One leg in an account ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountLedgerEntry {
    /// Leg id.
    pub id: Uuid,
    /// Posting date.
    pub entry_date: NaiveDate,
    /// Source kind.
    pub source_kind: SourceKind,
    /// Source id.
    pub source_id: Uuid,
    /// Description.
    pub description: String,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Balance after this leg on the account's normal side.
    pub running_balance: Decimal,
}

/// Legs of one account over a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountLedgerReport {
    /// Account id.
    pub account_id: AccountId,
    /// Account name.
    pub account_name: String,
    /// Period start date.
    pub period_start: NaiveDate,
    /// Period end date.
    pub period_end: NaiveDate,
    /// Balance before the period.
    pub opening_balance: Decimal,
    /// Legs in date order.
    pub entries: Vec<AccountLedgerEntry>,
    /// Sum of debits.
    pub total_debit: Decimal,
    /// Sum of credits.
    pub total_credit: Decimal,
    /// Balance after the last leg.
    pub closing_balance: Decimal,
}

/// One cash movement of the day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryLine {
    /// Source kind.
    pub source_kind: SourceKind,
    /// Source id.
    pub source_id: Uuid,
    /// Description.
    pub description: String,
    /// Amount.
    pub amount: Decimal,
}

/// Cash box of one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryDayReport {
    /// The day.
    pub date: NaiveDate,
    /// Cash before the day.
    pub opening_balance: Decimal,
    /// Cash in.
    pub receipts: Vec<TreasuryLine>,
    /// Cash out.
    pub payments: Vec<TreasuryLine>,
    /// Sum of receipts.
    pub total_receipts: Decimal,
    /// Sum of payments.
    pub total_payments: Decimal,
    /// Cash after the day.
    pub closing_balance: Decimal,
}
