//! Report generation service.
//!
//! Reports read the book only. Sums are taken over raw 4 dp values and
//! rounded to 2 dp on the way out.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use granary_shared::types::{AccountId, BALANCE_TOLERANCE, SeasonId, round_report};
use rust_decimal::Decimal;
use tracing::warn;

use super::types::{
    AccountLedgerEntry, AccountLedgerReport, AccountLine, BalanceEquation, BalanceSheetReport,
    CapitalDistributionReport, CashFlowActivity, CashFlowLine, CashFlowReport, CashFlowSection,
    CropProfitRow, CropProfitabilityReport, DualBalanceReport, EquityStatementReport,
    IncomeStatementReport, ReportSection, TreasuryDayReport, TreasuryLine, TrialBalanceReport,
    TrialBalanceTotals,
};
use crate::accounts::{AccountKind, FinancialAccount};
use crate::contacts::StatementService;
use crate::error::{KernelError, KernelResult};
use crate::ledger::{AccountBalance, EventKind, LedgerEntry, SourceKind};
use crate::settings::{AccountRole, SettingsResolver, SettingsService, Tunable};
use crate::store::Book;

/// Service for generating financial reports.
pub struct ReportService;

impl ReportService {
    /// Debit and credit totals per account through `as_of`.
    pub fn trial_balance(book: &Book, as_of: NaiveDate) -> TrialBalanceReport {
        let totals = Self::totals(book, |leg| leg.entry_date <= as_of);
        let lines = Self::lines(book, &totals);
        let total_debit: Decimal = lines.iter().map(|l| l.total_debit).sum();
        let total_credit: Decimal = lines.iter().map(|l| l.total_credit).sum();

        TrialBalanceReport {
            as_of,
            accounts: lines.into_iter().map(Self::rounded).collect(),
            totals: TrialBalanceTotals {
                total_debit: round_report(total_debit),
                total_credit: round_report(total_credit),
                is_balanced: (total_debit - total_credit).abs() <= BALANCE_TOLERANCE,
            },
        }
    }

    /// Revenue and expenses between two dates, both inclusive.
    ///
    /// Season closing entries are left out so a closed season still shows
    /// what it earned.
    ///
    /// The account holding the COGS role is reported on its own line
    /// ahead of the other expense accounts.
    pub fn income_statement(
        book: &Book,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> KernelResult<IncomeStatementReport> {
        Self::check_range(period_start, period_end)?;
        let cogs_account = SettingsResolver::resolve_uncached(book, AccountRole::Cogs).ok();
        let totals = Self::totals(book, |leg| {
            leg.entry_date >= period_start && leg.entry_date <= period_end && !is_closing(leg)
        });

        let mut revenue = Vec::new();
        let mut cogs = Vec::new();
        let mut operating = Vec::new();
        for line in Self::lines(book, &totals) {
            match line.account_type {
                AccountKind::Revenue => revenue.push(line),
                AccountKind::Expense if Some(line.account_id) == cogs_account => cogs.push(line),
                AccountKind::Expense => operating.push(line),
                _ => {}
            }
        }
        let revenue = Self::section(revenue);
        let cogs = Self::section(cogs);
        let operating = Self::section(operating);
        let gross_profit = revenue.total - cogs.total;
        let net_income = gross_profit - operating.total;

        Ok(IncomeStatementReport {
            period_start,
            period_end,
            revenue: Self::rounded_section(revenue),
            cost_of_goods_sold: Self::rounded_section(cogs),
            gross_profit: round_report(gross_profit),
            operating_expenses: Self::rounded_section(operating),
            net_income: round_report(net_income),
        })
    }

    /// Assets, liabilities and equity as of a date.
    ///
    /// Earnings not yet closed into an equity account are reported as
    /// retained earnings.
    pub fn balance_sheet(book: &Book, as_of: NaiveDate) -> BalanceSheetReport {
        let totals = Self::totals(book, |leg| leg.entry_date <= as_of);
        let mut assets = Vec::new();
        let mut liabilities = Vec::new();
        let mut equity = Vec::new();
        let mut retained = Decimal::ZERO;
        for line in Self::lines(book, &totals) {
            match line.account_type {
                kind if kind.is_asset() => assets.push(line),
                kind if kind.is_liability() => liabilities.push(line),
                AccountKind::Equity => equity.push(line),
                AccountKind::Revenue => retained += line.balance,
                _ => retained -= line.balance,
            }
        }
        let assets = Self::section(assets);
        let liabilities = Self::section(liabilities);
        let equity = Self::section(equity);
        let total_equity = equity.total + retained;
        let liabilities_and_equity = liabilities.total + total_equity;

        BalanceSheetReport {
            as_of,
            total_assets: round_report(assets.total),
            total_liabilities: round_report(liabilities.total),
            total_equity: round_report(total_equity),
            liabilities_and_equity: round_report(liabilities_and_equity),
            is_balanced: (assets.total - liabilities_and_equity).abs() <= BALANCE_TOLERANCE,
            retained_earnings: round_report(retained),
            assets: Self::rounded_section(assets),
            liabilities: Self::rounded_section(liabilities),
            equity: Self::rounded_section(equity),
        }
    }

    /// Beginning equity + net income + contributions − withdrawals
    /// + other movements = ending equity.
    pub fn equity_statement(
        book: &Book,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> KernelResult<EquityStatementReport> {
        Self::check_range(period_start, period_end)?;
        let beginning = Self::total_equity(book, |leg| leg.entry_date < period_start);
        let ending = Self::total_equity(book, |leg| leg.entry_date <= period_end);
        let in_period =
            |leg: &LedgerEntry| leg.entry_date >= period_start && leg.entry_date <= period_end;
        let net_income = Self::net_income(book, in_period);

        let mut contributions = Decimal::ZERO;
        let mut withdrawals = Decimal::ZERO;
        for leg in book.ledger_entries().filter(|leg| in_period(leg)) {
            let Ok(account) = book.account(leg.account_id) else {
                continue;
            };
            if account.account_type != AccountKind::Equity {
                continue;
            }
            match leg.source_kind.event {
                EventKind::CapitalContribution => contributions += leg.credit - leg.debit,
                EventKind::CapitalWithdrawal => withdrawals += leg.debit - leg.credit,
                _ => {}
            }
        }
        let other = ending - beginning - net_income - contributions + withdrawals;

        Ok(EquityStatementReport {
            period_start,
            period_end,
            beginning_equity: round_report(beginning),
            net_income: round_report(net_income),
            contributions: round_report(contributions),
            withdrawals: round_report(withdrawals),
            other_changes: round_report(other),
            ending_equity: round_report(ending),
        })
    }

    /// Cash legs of a period classified by source kind.
    ///
    /// Capital movements are financing; everything else is operating.
    pub fn cash_flow(
        book: &Book,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> KernelResult<CashFlowReport> {
        Self::check_range(period_start, period_end)?;
        let cash = SettingsResolver::resolve_uncached(book, AccountRole::Cash)?;
        let cash_legs = || book.ledger_entries().filter(move |leg| leg.account_id == cash);

        let opening: Decimal = cash_legs()
            .filter(|leg| leg.entry_date < period_start)
            .map(LedgerEntry::signed_amount)
            .sum();
        let mut grouped: BTreeMap<SourceKind, Decimal> = BTreeMap::new();
        for leg in cash_legs()
            .filter(|leg| leg.entry_date >= period_start && leg.entry_date <= period_end)
        {
            *grouped.entry(leg.source_kind).or_default() += leg.signed_amount();
        }

        let mut operating = CashFlowSection::default();
        let mut investing = CashFlowSection::default();
        let mut financing = CashFlowSection::default();
        for (source_kind, amount) in grouped {
            let section = match Self::activity(source_kind.event) {
                CashFlowActivity::Operating => &mut operating,
                CashFlowActivity::Investing => &mut investing,
                CashFlowActivity::Financing => &mut financing,
            };
            section.total += amount;
            section.lines.push(CashFlowLine {
                source_kind,
                amount,
            });
        }
        let net_change = operating.total + investing.total + financing.total;
        let closing = opening + net_change;
        let through_end: Decimal = cash_legs()
            .filter(|leg| leg.entry_date <= period_end)
            .map(LedgerEntry::signed_amount)
            .sum();

        Ok(CashFlowReport {
            period_start,
            period_end,
            opening_balance: round_report(opening),
            operating: Self::rounded_flow(operating),
            investing: Self::rounded_flow(investing),
            financing: Self::rounded_flow(financing),
            net_change: round_report(net_change),
            closing_balance: round_report(closing),
            is_reconciled: (closing - through_end).abs() <= BALANCE_TOLERANCE,
        })
    }

    /// Ledger inventory against physical stock value.
    ///
    /// Flags a discrepancy when the two differ by more than the
    /// `DISCREPANCY_TOLERANCE` setting (1.00 by default).
    pub fn dual_balance(book: &Book) -> DualBalanceReport {
        let mut assets = Decimal::ZERO;
        let mut liabilities = Decimal::ZERO;
        let mut equity = Decimal::ZERO;
        let mut ledger_inventory = Decimal::ZERO;
        for account in book.accounts() {
            match account.account_type {
                AccountKind::Inventory => {
                    ledger_inventory += account.balance;
                    assets += account.balance;
                }
                kind if kind.is_asset() => assets += account.balance,
                kind if kind.is_liability() => liabilities += account.balance,
                AccountKind::Expense => equity -= account.balance,
                _ => equity += account.balance,
            }
        }
        let physical_inventory = Self::physical_inventory(book);
        let physical_assets = assets - ledger_inventory + physical_inventory;
        let inventory_difference = ledger_inventory - physical_inventory;
        let tolerance =
            SettingsService::tunable_decimal(book, Tunable::DiscrepancyTolerance, Decimal::ONE);
        let discrepancy_detected = inventory_difference.abs() > tolerance;
        if discrepancy_detected {
            warn!(
                ledger = %round_report(ledger_inventory),
                physical = %round_report(physical_inventory),
                difference = %round_report(inventory_difference),
                "inventory discrepancy detected"
            );
        }

        DualBalanceReport {
            ledger_view: Self::equation(assets, liabilities, equity),
            physical_view: Self::equation(physical_assets, liabilities, equity),
            ledger_inventory: round_report(ledger_inventory),
            physical_inventory: round_report(physical_inventory),
            inventory_difference: round_report(inventory_difference),
            tolerance,
            discrepancy_detected,
        }
    }

    /// Cash + stock value + receivables against owner capital + profit + payables.
    ///
    /// Receivables and payables come from contact balances, not from the
    /// receivable and payable accounts.
    pub fn capital_distribution(book: &Book) -> KernelResult<CapitalDistributionReport> {
        let cash_account = SettingsResolver::resolve_uncached(book, AccountRole::Cash)?;
        let cash = book.account(cash_account)?.balance;
        let inventory_value = Self::physical_inventory(book);
        let debts = StatementService::debts(book)?;

        let mut owner_capital = Decimal::ZERO;
        let mut net_profit = Decimal::ZERO;
        for account in book.accounts() {
            match account.account_type {
                AccountKind::Equity => owner_capital += account.balance,
                AccountKind::Revenue => net_profit += account.balance,
                AccountKind::Expense => net_profit -= account.balance,
                _ => {}
            }
        }
        let total_assets = cash + inventory_value + debts.total_receivable;
        let total_sources = owner_capital + net_profit + debts.total_payable;

        Ok(CapitalDistributionReport {
            cash: round_report(cash),
            inventory_value: round_report(inventory_value),
            receivables: debts.total_receivable,
            total_assets: round_report(total_assets),
            owner_capital: round_report(owner_capital),
            net_profit: round_report(net_profit),
            payables: debts.total_payable,
            total_sources: round_report(total_sources),
            difference: round_report(total_assets - total_sources),
        })
    }

    /// Sales minus purchases per crop, optionally for one season.
    pub fn crop_profitability(
        book: &Book,
        season_id: Option<SeasonId>,
    ) -> KernelResult<CropProfitabilityReport> {
        if let Some(season_id) = season_id {
            book.season(season_id)?;
        }
        let in_season = |tag: Option<SeasonId>| season_id.is_none() || tag == season_id;

        let mut rows: BTreeMap<_, (Decimal, Decimal, Decimal, Decimal)> = BTreeMap::new();
        for sale in book.sales().filter(|s| in_season(s.season_id)) {
            let row = rows.entry(sale.crop_id).or_default();
            row.0 += sale.quantity_sold_kg;
            row.1 += sale.total_sale_amount;
        }
        for purchase in book.purchases().filter(|p| in_season(p.season_id)) {
            let row = rows.entry(purchase.crop_id).or_default();
            row.2 += purchase.net_quantity_kg;
            row.3 += purchase.total_cost;
        }

        let mut crops = Vec::with_capacity(rows.len());
        for (crop_id, (sold_kg, sales_total, purchased_kg, purchases_total)) in rows {
            let crop_name = book.crop(crop_id).map(|c| c.name.clone()).unwrap_or_default();
            let profit = sales_total - purchases_total;
            let margin_percent = if sales_total > Decimal::ZERO {
                round_report(profit / sales_total * Decimal::ONE_HUNDRED)
            } else {
                Decimal::ZERO
            };
            crops.push(CropProfitRow {
                crop_id,
                crop_name,
                sold_kg,
                sales_total: round_report(sales_total),
                purchased_kg,
                purchases_total: round_report(purchases_total),
                profit: round_report(profit),
                margin_percent,
            });
        }
        crops.sort_by(|a, b| a.crop_name.cmp(&b.crop_name));

        Ok(CropProfitabilityReport {
            season_id,
            total_sales: crops.iter().map(|c| c.sales_total).sum(),
            total_purchases: crops.iter().map(|c| c.purchases_total).sum(),
            total_profit: crops.iter().map(|c| c.profit).sum(),
            crops,
        })
    }

    /// Legs of one account with a running balance on its normal side.
    pub fn account_ledger(
        book: &Book,
        account_id: AccountId,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> KernelResult<AccountLedgerReport> {
        Self::check_range(period_start, period_end)?;
        let account = book.account(account_id)?;
        let side = account.normal_side();

        let mut opening = AccountBalance::new(account_id);
        let mut legs: Vec<&LedgerEntry> = Vec::new();
        for leg in book.ledger_entries().filter(|leg| leg.account_id == account_id) {
            if leg.entry_date < period_start {
                opening.add(leg.debit, leg.credit);
            } else if leg.entry_date <= period_end {
                legs.push(leg);
            }
        }
        legs.sort_by_key(|leg| leg.entry_date);

        let opening_balance = opening.balance(side);
        let mut running = opening_balance;
        let mut period = AccountBalance::new(account_id);
        let entries = legs
            .into_iter()
            .map(|leg| {
                running += side.balance_change(leg.debit, leg.credit);
                period.add(leg.debit, leg.credit);
                AccountLedgerEntry {
                    id: leg.id.into_inner(),
                    entry_date: leg.entry_date,
                    source_kind: leg.source_kind,
                    source_id: leg.source_id,
                    description: leg.description.clone(),
                    debit: round_report(leg.debit),
                    credit: round_report(leg.credit),
                    running_balance: round_report(running),
                }
            })
            .collect();

        Ok(AccountLedgerReport {
            account_id,
            account_name: account.name.clone(),
            period_start,
            period_end,
            opening_balance: round_report(opening_balance),
            entries,
            total_debit: round_report(period.debit_total),
            total_credit: round_report(period.credit_total),
            closing_balance: round_report(running),
        })
    }

    /// Cash receipts and payments of one day.
    pub fn treasury_day(book: &Book, date: NaiveDate) -> KernelResult<TreasuryDayReport> {
        let cash = SettingsResolver::resolve_uncached(book, AccountRole::Cash)?;
        let mut opening = Decimal::ZERO;
        let mut receipts = Vec::new();
        let mut payments = Vec::new();
        let mut total_receipts = Decimal::ZERO;
        let mut total_payments = Decimal::ZERO;
        for leg in book.ledger_entries().filter(|leg| leg.account_id == cash) {
            if leg.entry_date < date {
                opening += leg.signed_amount();
                continue;
            }
            if leg.entry_date > date {
                continue;
            }
            let line = |amount| TreasuryLine {
                source_kind: leg.source_kind,
                source_id: leg.source_id,
                description: leg.description.clone(),
                amount: round_report(amount),
            };
            if leg.debit > Decimal::ZERO {
                total_receipts += leg.debit;
                receipts.push(line(leg.debit));
            } else {
                total_payments += leg.credit;
                payments.push(line(leg.credit));
            }
        }

        Ok(TreasuryDayReport {
            date,
            opening_balance: round_report(opening),
            receipts,
            payments,
            total_receipts: round_report(total_receipts),
            total_payments: round_report(total_payments),
            closing_balance: round_report(opening + total_receipts - total_payments),
        })
    }

    /// Σ net stock × average cost over every crop.
    #[must_use]
    pub fn physical_inventory(book: &Book) -> Decimal {
        book.inventories().map(|inventory| inventory.value()).sum()
    }

    fn activity(event: EventKind) -> CashFlowActivity {
        match event {
            EventKind::CapitalContribution | EventKind::CapitalWithdrawal => {
                CashFlowActivity::Financing
            }
            _ => CashFlowActivity::Operating,
        }
    }

    fn check_range(start: NaiveDate, end: NaiveDate) -> KernelResult<()> {
        if start > end {
            return Err(KernelError::validation(
                "period_start",
                format!("start {start} is after end {end}"),
            ));
        }
        Ok(())
    }

    fn totals<F>(book: &Book, include: F) -> BTreeMap<AccountId, AccountBalance>
    where
        F: Fn(&LedgerEntry) -> bool,
    {
        let mut totals: BTreeMap<AccountId, AccountBalance> = BTreeMap::new();
        for leg in book.ledger_entries().filter(|leg| include(leg)) {
            totals
                .entry(leg.account_id)
                .or_insert_with(|| AccountBalance::new(leg.account_id))
                .add(leg.debit, leg.credit);
        }
        totals
    }

    /// Unrounded lines for every account, in chart order.
    fn lines(book: &Book, totals: &BTreeMap<AccountId, AccountBalance>) -> Vec<AccountLine> {
        let mut accounts: Vec<&FinancialAccount> = book.accounts().collect();
        accounts.sort_by(|a, b| {
            a.account_type
                .cmp(&b.account_type)
                .then_with(|| a.name.cmp(&b.name))
        });
        accounts
            .into_iter()
            .map(|account| {
                let sums = totals
                    .get(&account.id)
                    .copied()
                    .unwrap_or_else(|| AccountBalance::new(account.id));
                AccountLine {
                    account_id: account.id,
                    name: account.name.clone(),
                    account_type: account.account_type,
                    total_debit: sums.debit_total,
                    total_credit: sums.credit_total,
                    balance: sums.balance(account.normal_side()),
                }
            })
            .collect()
    }

    fn net_income<F>(book: &Book, include: F) -> Decimal
    where
        F: Fn(&LedgerEntry) -> bool,
    {
        let totals = Self::totals(book, |leg| include(leg) && !is_closing(leg));
        Self::lines(book, &totals)
            .iter()
            .map(|line| match line.account_type {
                AccountKind::Revenue => line.balance,
                AccountKind::Expense => -line.balance,
                _ => Decimal::ZERO,
            })
            .sum()
    }

    fn total_equity<F>(book: &Book, include: F) -> Decimal
    where
        F: Fn(&LedgerEntry) -> bool,
    {
        let totals = Self::totals(book, include);
        Self::lines(book, &totals)
            .iter()
            .map(|line| match line.account_type {
                AccountKind::Equity | AccountKind::Revenue => line.balance,
                AccountKind::Expense => -line.balance,
                _ => Decimal::ZERO,
            })
            .sum()
    }

    fn section(accounts: Vec<AccountLine>) -> ReportSection {
        ReportSection {
            total: accounts.iter().map(|a| a.balance).sum(),
            accounts,
        }
    }

    fn rounded(line: AccountLine) -> AccountLine {
        AccountLine {
            total_debit: round_report(line.total_debit),
            total_credit: round_report(line.total_credit),
            balance: round_report(line.balance),
            ..line
        }
    }

    fn rounded_section(section: ReportSection) -> ReportSection {
        ReportSection {
            total: round_report(section.total),
            accounts: section.accounts.into_iter().map(Self::rounded).collect(),
        }
    }

    fn rounded_flow(section: CashFlowSection) -> CashFlowSection {
        CashFlowSection {
            total: round_report(section.total),
            lines: section
                .lines
                .into_iter()
                .map(|line| CashFlowLine {
                    amount: round_report(line.amount),
                    ..line
                })
                .collect(),
        }
    }

    fn equation(assets: Decimal, liabilities: Decimal, equity: Decimal) -> BalanceEquation {
        BalanceEquation {
            assets: round_report(assets),
            liabilities: round_report(liabilities),
            equity: round_report(equity),
            difference: round_report(assets - liabilities - equity),
        }
    }
}

/// Legs of a season closing entry, which only move earnings between accounts.
fn is_closing(leg: &LedgerEntry) -> bool {
    leg.source_kind.event == EventKind::SeasonClosing
}
