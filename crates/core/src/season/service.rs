//! Season lifecycle.

use std::collections::BTreeMap;

use granary_shared::types::{AccountId, SeasonId, round_internal};
use rust_decimal::Decimal;
use tracing::info;

use super::types::{Season, SeasonClosing, SeasonRequest, SeasonStatus};
use crate::audit::{AuditAction, snapshot};
use crate::error::{KernelError, KernelResult};
use crate::ledger::{EventKind, LedgerService, PostingLeg, SourceKind};
use crate::settings::{AccountRole, SettingsResolver};
use crate::store::{Book, Row, UnitOfWork};

/// Creates, activates and closes seasons.
pub struct SeasonService;

impl SeasonService {
    /// Creates an upcoming season.
    pub fn create(uow: &mut UnitOfWork<'_>, req: SeasonRequest) -> KernelResult<Season> {
        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(KernelError::validation("name", "season name is required"));
        }
        if req.end_date < req.start_date {
            return Err(KernelError::validation(
                "end_date",
                "end date must not precede start date",
            ));
        }
        if uow.book().seasons().any(|s| s.name.eq_ignore_ascii_case(&name)) {
            return Err(KernelError::IntegrityViolation(format!(
                "season `{name}` already exists"
            )));
        }
        let season = Season {
            id: SeasonId::new(),
            name,
            start_date: req.start_date,
            end_date: req.end_date,
            status: SeasonStatus::Upcoming,
            closed_at: None,
            closing_net_profit: None,
            created_at: uow.now(),
        };
        uow.upsert(Row::Season(season.clone()));
        uow.audit(
            AuditAction::Create,
            "Season",
            season.id.into_inner(),
            None,
            snapshot(&season),
        );
        info!(season_id = %season.id, name = %season.name, "season created");
        Ok(season)
    }

    /// Makes a season the active one, completing whichever was active.
    ///
    /// # Errors
    ///
    /// `Validation` when the season has been closed.
    pub fn activate(uow: &mut UnitOfWork<'_>, season_id: SeasonId) -> KernelResult<Season> {
        let before = uow.book().season(season_id)?.clone();
        if before.is_closed() {
            return Err(KernelError::validation(
                "season_id",
                format!("season `{}` is closed", before.name),
            ));
        }
        let others: Vec<Season> = uow
            .book()
            .seasons()
            .filter(|s| s.status == SeasonStatus::Active && s.id != season_id)
            .cloned()
            .collect();
        for mut other in others {
            other.status = SeasonStatus::Completed;
            info!(season_id = %other.id, "previous season completed");
            uow.upsert(Row::Season(other));
        }

        let mut season = before.clone();
        season.status = SeasonStatus::Active;
        uow.upsert(Row::Season(season.clone()));
        uow.audit(
            AuditAction::Activate,
            "Season",
            season_id.into_inner(),
            snapshot(&before),
            snapshot(&season),
        );
        info!(%season_id, name = %season.name, "season activated");
        Ok(season)
    }

    /// Closes a season.
    ///
    /// Posts one `SEASON_CLOSING` group dated on the season's end date. The
    /// season's revenue, COGS and expenses are cleared into Income Summary
    /// and the net profit moves on to Retained Earnings (a loss debits it),
    /// so Income Summary nets to zero. Cash, receivables, payables and
    /// inventory are not touched.
    ///
    /// # Errors
    ///
    /// `Validation` when the season is already closed.
    pub fn close(uow: &mut UnitOfWork<'_>, season_id: SeasonId) -> KernelResult<SeasonClosing> {
        let before = uow.book().season(season_id)?.clone();
        if before.is_closed() {
            return Err(KernelError::validation(
                "season_id",
                format!("season `{}` is already closed", before.name),
            ));
        }
        let cogs_account = uow.role(AccountRole::Cogs)?;
        let closing = Self::closing_figures(uow.book(), season_id, cogs_account)?;

        let summary = uow.role(AccountRole::IncomeSummary)?;
        let retained = uow.role(AccountRole::RetainedEarnings)?;
        let revenue_account = uow.role(AccountRole::SalesRevenue)?;
        let description = format!("Closing of season {}", before.name);

        let mut legs = Vec::new();
        transfer(&mut legs, revenue_account, summary, closing.revenue, &description);
        transfer(&mut legs, summary, cogs_account, closing.cogs, &description);
        for (account, amount) in Self::expenses_by_account(uow.book(), season_id) {
            transfer(&mut legs, summary, account, amount, &description);
        }
        transfer(&mut legs, summary, retained, closing.net_profit, &description);

        if !legs.is_empty() {
            LedgerService::post(
                uow,
                before.end_date,
                SourceKind::of(EventKind::SeasonClosing),
                season_id.into_inner(),
                legs,
            )?;
        }

        let mut season = before.clone();
        season.status = SeasonStatus::Completed;
        season.closed_at = Some(uow.now());
        season.closing_net_profit = Some(closing.net_profit);
        uow.upsert(Row::Season(season.clone()));
        uow.audit(
            AuditAction::Close,
            "Season",
            season_id.into_inner(),
            snapshot(&before),
            snapshot(&season),
        );
        info!(
            %season_id,
            revenue = %closing.revenue,
            cogs = %closing.cogs,
            expenses = %closing.expenses,
            net_profit = %closing.net_profit,
            "season closed"
        );
        Ok(closing)
    }

    /// The active season, if any.
    #[must_use]
    pub fn active_season(book: &Book) -> Option<&Season> {
        book.seasons().find(|s| s.status == SeasonStatus::Active)
    }

    /// Revenue, COGS and expenses of the events tagged to a season.
    ///
    /// Revenue is the remaining total of the season's sales. COGS is the
    /// net of their `SALE_COGS` groups and of the COGS legs of their
    /// returns. Expenses are the expense rows tagged to the season.
    pub fn closing_figures(
        book: &Book,
        season_id: SeasonId,
        cogs_account: AccountId,
    ) -> KernelResult<SeasonClosing> {
        book.season(season_id)?;
        let mut revenue = Decimal::ZERO;
        let mut cogs = Decimal::ZERO;
        for sale in book.sales().filter(|s| s.season_id == Some(season_id)) {
            revenue += sale.total_sale_amount;
            cogs += LedgerService::net_on_account(
                book,
                cogs_account,
                sale.id.into_inner(),
                EventKind::SaleCogs,
            );
            for sale_return in book.sale_returns().filter(|r| r.sale_id == sale.id) {
                cogs += LedgerService::net_on_account(
                    book,
                    cogs_account,
                    sale_return.id.into_inner(),
                    EventKind::SaleReturn,
                );
            }
        }
        let expenses: Decimal = book
            .expenses()
            .filter(|e| e.season_id == Some(season_id))
            .map(|e| e.amount)
            .sum();
        let revenue = round_internal(revenue);
        let cogs = round_internal(cogs);
        let expenses = round_internal(expenses);
        Ok(SeasonClosing {
            season_id,
            revenue,
            cogs,
            expenses,
            net_profit: revenue - cogs - expenses,
        })
    }

    /// Season expenses summed per expense account.
    fn expenses_by_account(book: &Book, season_id: SeasonId) -> BTreeMap<AccountId, Decimal> {
        let mut totals = BTreeMap::new();
        for expense in book.expenses().filter(|e| e.season_id == Some(season_id)) {
            *totals.entry(expense.expense_account_id).or_insert(Decimal::ZERO) += expense.amount;
        }
        totals
    }

    /// [`Self::closing_figures`] resolving the COGS account from the book.
    pub fn preview(book: &Book, season_id: SeasonId) -> KernelResult<SeasonClosing> {
        let cogs_account = SettingsResolver::resolve_uncached(book, AccountRole::Cogs)?;
        Self::closing_figures(book, season_id, cogs_account)
    }
}

/// Appends `Dr debit, Cr credit` for `amount`; a negative amount swaps the
/// sides and zero adds nothing.
fn transfer(
    legs: &mut Vec<PostingLeg>,
    debit: AccountId,
    credit: AccountId,
    amount: Decimal,
    description: &str,
) {
    let amount = round_internal(amount);
    let (debit, credit) = if amount < Decimal::ZERO {
        (credit, debit)
    } else {
        (debit, credit)
    };
    let amount = amount.abs();
    if amount.is_zero() {
        return;
    }
    legs.push(PostingLeg::debit(debit, amount, description));
    legs.push(PostingLeg::credit(credit, amount, description));
}
