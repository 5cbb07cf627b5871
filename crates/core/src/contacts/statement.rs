//! Contact statements and debt listings.

use chrono::NaiveDate;
use granary_shared::types::{AccountId, ContactId, round_report};
use rust_decimal::Decimal;

use super::types::{
    ContactDebt, ContactStatement, DebtSummary, StatementLine, StatementLineKind,
};
use crate::error::KernelResult;
use crate::settings::{AccountRole, SettingsResolver};
use crate::store::Book;

/// Builds statements from events.
pub struct StatementService;

impl StatementService {
    /// Statement of one contact between two dates, both inclusive.
    ///
    /// The opening balance applies the same rules to events strictly
    /// before `start_date`. Amounts are rounded to 2 dp.
    pub fn statement(
        book: &Book,
        contact_id: ContactId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> KernelResult<ContactStatement> {
        let contact = book.contact(contact_id)?;
        let cash = SettingsResolver::resolve_uncached(book, AccountRole::Cash)?;
        let all = Self::lines(book, contact_id, cash);

        let opening: Decimal = all
            .iter()
            .filter(|l| l.date < start_date)
            .map(|l| l.debit - l.credit)
            .sum();
        let mut running = opening;
        let mut total_debit = Decimal::ZERO;
        let mut total_credit = Decimal::ZERO;
        let mut lines = Vec::new();
        for mut line in all
            .into_iter()
            .filter(|l| l.date >= start_date && l.date <= end_date)
        {
            running += line.debit - line.credit;
            total_debit += line.debit;
            total_credit += line.credit;
            line.debit = round_report(line.debit);
            line.credit = round_report(line.credit);
            line.running_balance = round_report(running);
            lines.push(line);
        }

        Ok(ContactStatement {
            contact_id,
            contact_name: contact.name.clone(),
            start_date,
            end_date,
            opening_balance: round_report(opening),
            lines,
            total_debit: round_report(total_debit),
            total_credit: round_report(total_credit),
            closing_balance: round_report(running),
        })
    }

    /// All-time balance of a contact. Positive means the contact owes us.
    pub fn balance(book: &Book, contact_id: ContactId) -> KernelResult<Decimal> {
        book.contact(contact_id)?;
        let cash = SettingsResolver::resolve_uncached(book, AccountRole::Cash)?;
        Ok(Self::balance_with(book, contact_id, cash))
    }

    /// Every contact with a non-zero balance, split into receivables and
    /// payables (payables as positive amounts), largest first.
    pub fn debts(book: &Book) -> KernelResult<DebtSummary> {
        let cash = SettingsResolver::resolve_uncached(book, AccountRole::Cash)?;
        let mut summary = DebtSummary::default();
        for contact in book.contacts() {
            let balance = round_report(Self::balance_with(book, contact.id, cash));
            if balance > Decimal::ZERO {
                summary.total_receivable += balance;
                summary.receivables.push(ContactDebt {
                    contact_id: contact.id,
                    contact_name: contact.name.clone(),
                    balance,
                });
            } else if balance < Decimal::ZERO {
                summary.total_payable -= balance;
                summary.payables.push(ContactDebt {
                    contact_id: contact.id,
                    contact_name: contact.name.clone(),
                    balance: -balance,
                });
            }
        }
        summary.receivables.sort_by(|a, b| b.balance.cmp(&a.balance));
        summary.payables.sort_by(|a, b| b.balance.cmp(&a.balance));
        Ok(summary)
    }

    pub(crate) fn balance_with(book: &Book, contact_id: ContactId, cash: AccountId) -> Decimal {
        Self::lines(book, contact_id, cash)
            .iter()
            .map(|l| l.debit - l.credit)
            .sum()
    }

    /// Unrounded lines in date order; `running_balance` is left at zero.
    fn lines(book: &Book, contact_id: ContactId, cash: AccountId) -> Vec<StatementLine> {
        let mut lines = Vec::new();
        let mut push = |date, kind, reference, description: String, debit, credit| {
            lines.push(StatementLine {
                date,
                kind,
                reference,
                description,
                debit,
                credit,
                running_balance: Decimal::ZERO,
            });
        };

        for sale in book.sales().filter(|s| s.customer_id == contact_id) {
            push(
                sale.sale_date,
                StatementLineKind::Sale,
                sale.id.into_inner(),
                format!("Sale of {} kg", sale.quantity_sold_kg + sale.returned_qty),
                sale.total_sale_amount + sale.returned_amount,
                Decimal::ZERO,
            );
            for sale_return in book.sale_returns().filter(|r| r.sale_id == sale.id) {
                push(
                    sale_return.return_date,
                    StatementLineKind::SaleReturn,
                    sale_return.id.into_inner(),
                    format!("Return of {} kg", sale_return.returned_qty),
                    Decimal::ZERO,
                    sale_return.refund_amount,
                );
            }
        }
        for purchase in book.purchases().filter(|p| p.supplier_id == contact_id) {
            push(
                purchase.purchase_date,
                StatementLineKind::Purchase,
                purchase.id.into_inner(),
                format!("Purchase of {} kg", purchase.net_quantity_kg + purchase.returned_qty),
                Decimal::ZERO,
                purchase.total_cost + purchase.returned_cost,
            );
            let returns = book.purchase_returns().filter(|r| r.purchase_id == purchase.id);
            for purchase_return in returns {
                push(
                    purchase_return.return_date,
                    StatementLineKind::PurchaseReturn,
                    purchase_return.id.into_inner(),
                    format!("Return of {} kg", purchase_return.returned_qty),
                    purchase_return.returned_cost,
                    Decimal::ZERO,
                );
            }
        }
        for payment in book.payments().filter(|p| p.contact_id == Some(contact_id)) {
            if payment.debit_account_id == cash {
                push(
                    payment.payment_date,
                    StatementLineKind::CashReceived,
                    payment.id.into_inner(),
                    format!("Cash received ({})", payment.method),
                    Decimal::ZERO,
                    payment.amount,
                );
            } else if payment.credit_account_id == cash {
                push(
                    payment.payment_date,
                    StatementLineKind::CashPaid,
                    payment.id.into_inner(),
                    format!("Cash paid ({})", payment.method),
                    payment.amount,
                    Decimal::ZERO,
                );
            }
        }
        lines.sort_by_key(|l| (l.date, l.reference));
        lines
    }
}
