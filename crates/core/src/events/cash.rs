//! Quick cash movements and expenses.

use granary_shared::types::{AccountId, ExpenseId, PaymentId, round_internal};
use tracing::info;

use super::common::{require_positive, season_tag};
use super::payment::PaymentService;
use super::types::{
    Expense, ExpenseRequest, ExpenseSource, Payment, PaymentOrigin, PaymentRequest,
    QuickCashRequest, TransactionType,
};
use crate::accounts::AccountKind;
use crate::audit::{AuditAction, snapshot};
use crate::error::{KernelError, KernelResult};
use crate::ledger::{EventKind, LedgerService, PostingLeg, SourceKind};
use crate::settings::AccountRole;
use crate::store::{Row, RowKey, UnitOfWork};

/// Quick receipts, quick payments and expenses.
pub struct CashService;

impl CashService {
    /// Cash coming in.
    ///
    /// Debits Cash and credits Accounts Receivable when the contact is a
    /// customer, Sales Revenue otherwise. Stored as a general payment.
    pub fn quick_receipt(uow: &mut UnitOfWork<'_>, req: QuickCashRequest) -> KernelResult<Payment> {
        let cash = uow.role(AccountRole::Cash)?;
        let is_customer = match req.contact_id {
            Some(id) => uow.book().contact(id)?.is_customer,
            None => false,
        };
        let credit = if is_customer {
            uow.role(AccountRole::Receivable)?
        } else {
            uow.role(AccountRole::SalesRevenue)?
        };
        Self::quick(uow, req, cash, credit, PaymentOrigin::QuickReceipt)
    }

    /// Cash going out.
    ///
    /// Credits Cash and debits Accounts Payable when the contact is a
    /// supplier, General Expenses otherwise.
    pub fn quick_payment(uow: &mut UnitOfWork<'_>, req: QuickCashRequest) -> KernelResult<Payment> {
        let cash = uow.role(AccountRole::Cash)?;
        let is_supplier = match req.contact_id {
            Some(id) => uow.book().contact(id)?.is_supplier,
            None => false,
        };
        let debit = if is_supplier {
            uow.role(AccountRole::Payable)?
        } else {
            uow.role(AccountRole::GeneralExpenses)?
        };
        Self::quick(uow, req, debit, cash, PaymentOrigin::QuickPayment)
    }

    /// `Dr General Expenses, Cr Cash`, kept as an expense row.
    pub fn quick_expense(uow: &mut UnitOfWork<'_>, req: QuickCashRequest) -> KernelResult<Expense> {
        let expense_account = uow.role(AccountRole::GeneralExpenses)?;
        let cash = uow.role(AccountRole::Cash)?;
        let description = if req.description.trim().is_empty() {
            "Quick expense".to_string()
        } else {
            req.description
        };
        Self::compose_expense(
            uow,
            ExpenseRequest {
                expense_date: req.date,
                amount: req.amount,
                category: "GENERAL".to_string(),
                description,
                expense_account_id: Some(expense_account),
                paid_from_account_id: Some(cash),
                season_id: None,
            },
            ExpenseSource::Quick,
        )
    }

    /// Records an expense against explicit or default accounts.
    ///
    /// The expense account must be an expense-kind account; it defaults to
    /// General Expenses and the paying account defaults to Cash.
    pub fn record_expense(uow: &mut UnitOfWork<'_>, req: ExpenseRequest) -> KernelResult<Expense> {
        if req.category.trim().is_empty() {
            return Err(KernelError::validation("category", "category is required"));
        }
        Self::compose_expense(uow, req, ExpenseSource::Recorded)
    }

    /// Reverses and removes an expense.
    pub fn delete_expense(uow: &mut UnitOfWork<'_>, expense_id: ExpenseId) -> KernelResult<()> {
        let expense = uow.book().expense(expense_id)?.clone();
        LedgerService::reverse(
            uow,
            SourceKind::of(Self::event(expense.source)),
            expense_id.into_inner(),
            expense.expense_date,
        )?;
        uow.remove(&RowKey::Expense(expense_id));
        uow.audit(
            AuditAction::Delete,
            "Expense",
            expense_id.into_inner(),
            snapshot(&expense),
            None,
        );
        info!(%expense_id, "expense deleted");
        Ok(())
    }

    fn quick(
        uow: &mut UnitOfWork<'_>,
        req: QuickCashRequest,
        debit: AccountId,
        credit: AccountId,
        origin: PaymentOrigin,
    ) -> KernelResult<Payment> {
        let payment = PaymentService::compose(
            uow,
            PaymentId::new(),
            PaymentRequest {
                payment_date: req.date,
                amount: req.amount,
                contact_id: req.contact_id,
                method: req.method.unwrap_or_default(),
                debit_account_id: debit,
                credit_account_id: credit,
                transaction_type: TransactionType::General,
                transaction_id: None,
                notes: Some(req.description),
            },
            origin,
        )?;
        uow.audit(
            AuditAction::Create,
            "Payment",
            payment.id.into_inner(),
            None,
            snapshot(&payment),
        );
        Ok(payment)
    }

    fn compose_expense(
        uow: &mut UnitOfWork<'_>,
        req: ExpenseRequest,
        source: ExpenseSource,
    ) -> KernelResult<Expense> {
        require_positive("amount", req.amount)?;
        let amount = round_internal(req.amount);
        let expense_account_id = match req.expense_account_id {
            Some(id) => id,
            None => uow.role(AccountRole::GeneralExpenses)?,
        };
        let paid_from_account_id = match req.paid_from_account_id {
            Some(id) => id,
            None => uow.role(AccountRole::Cash)?,
        };
        let expense_account = uow.book().account(expense_account_id)?;
        if expense_account.account_type != AccountKind::Expense {
            return Err(KernelError::validation(
                "expense_account_id",
                format!("account `{}` is not an expense account", expense_account.name),
            ));
        }
        let season_id = season_tag(uow, req.season_id)?;

        let id = ExpenseId::new();
        LedgerService::post(
            uow,
            req.expense_date,
            SourceKind::of(Self::event(source)),
            id.into_inner(),
            vec![
                PostingLeg::debit(expense_account_id, amount, req.description.clone()),
                PostingLeg::credit(paid_from_account_id, amount, req.description.clone()),
            ],
        )?;

        let expense = Expense {
            id,
            expense_date: req.expense_date,
            amount,
            category: req.category,
            description: req.description,
            expense_account_id,
            paid_from_account_id,
            season_id,
            source,
            created_by: uow.user(),
            created_at: uow.now(),
        };
        uow.upsert(Row::Expense(expense.clone()));
        uow.audit(
            AuditAction::Create,
            "Expense",
            id.into_inner(),
            None,
            snapshot(&expense),
        );
        info!(
            expense_id = %id,
            amount = %amount,
            category = %expense.category,
            source = source.as_str(),
            "expense recorded"
        );
        Ok(expense)
    }

    fn event(source: ExpenseSource) -> EventKind {
        match source {
            ExpenseSource::Recorded => EventKind::Expense,
            ExpenseSource::Quick => EventKind::QuickExpense,
        }
    }
}
