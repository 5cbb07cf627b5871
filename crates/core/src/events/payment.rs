//! Payment composer.

use chrono::NaiveDate;
use granary_shared::types::{AccountId, PaymentId, PurchaseId, SaleId, round_internal};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use super::common::require_positive;
use super::types::{Payment, PaymentOrigin, PaymentRequest, PaymentStatus, TransactionType};
use crate::audit::{AuditAction, snapshot};
use crate::error::{KernelError, KernelResult};
use crate::ledger::{EventKind, LedgerService, PostingLeg, SourceKind};
use crate::store::{Book, Row, RowKey, UnitOfWork};

/// Records, updates and deletes payments.
pub struct PaymentService;

impl PaymentService {
    /// Records a standalone payment.
    ///
    /// Posts `Dr debit_account, Cr credit_account`. A payment linked to a
    /// sale or purchase moves the parent's settled amount and status.
    pub fn record(uow: &mut UnitOfWork<'_>, req: PaymentRequest) -> KernelResult<Payment> {
        let payment = Self::compose(uow, PaymentId::new(), req, PaymentOrigin::Standalone)?;
        uow.audit(
            AuditAction::Create,
            "Payment",
            payment.id.into_inner(),
            None,
            snapshot(&payment),
        );
        Ok(payment)
    }

    /// Replaces a payment, keeping its id and origin.
    pub fn update(
        uow: &mut UnitOfWork<'_>,
        payment_id: PaymentId,
        req: PaymentRequest,
    ) -> KernelResult<Payment> {
        let before = Self::undo(uow, payment_id)?;
        let mut after = Self::compose(uow, payment_id, req, before.origin)?;
        after.created_at = before.created_at;
        uow.upsert(Row::Payment(after.clone()));
        uow.audit(
            AuditAction::Update,
            "Payment",
            payment_id.into_inner(),
            snapshot(&before),
            snapshot(&after),
        );
        Ok(after)
    }

    /// Reverses and removes a payment.
    pub fn delete(uow: &mut UnitOfWork<'_>, payment_id: PaymentId) -> KernelResult<()> {
        let before = Self::undo(uow, payment_id)?;
        uow.audit(
            AuditAction::Delete,
            "Payment",
            payment_id.into_inner(),
            snapshot(&before),
            None,
        );
        info!(%payment_id, "payment deleted");
        Ok(())
    }

    /// Builds, posts and stores a payment under a given id.
    pub(crate) fn compose(
        uow: &mut UnitOfWork<'_>,
        id: PaymentId,
        req: PaymentRequest,
        origin: PaymentOrigin,
    ) -> KernelResult<Payment> {
        require_positive("amount", req.amount)?;
        if req.debit_account_id == req.credit_account_id {
            return Err(KernelError::validation(
                "credit_account_id",
                "debit and credit accounts must differ",
            ));
        }
        if let Some(contact_id) = req.contact_id {
            uow.book().contact(contact_id)?;
        }

        let (transaction_id, parent_contact) = match (req.transaction_type, req.transaction_id) {
            (TransactionType::General, _) => (None, None),
            (_, None) => {
                return Err(KernelError::validation(
                    "transaction_id",
                    "a linked payment needs a transaction id",
                ));
            }
            (TransactionType::Sale, Some(raw)) => {
                let sale = uow.book().sale(SaleId::from_uuid(raw))?;
                (Some(raw), Some(sale.customer_id))
            }
            (TransactionType::Purchase, Some(raw)) => {
                let purchase = uow.book().purchase(PurchaseId::from_uuid(raw))?;
                (Some(raw), Some(purchase.supplier_id))
            }
        };

        let amount = round_internal(req.amount);
        let description = req
            .notes
            .clone()
            .unwrap_or_else(|| format!("{} payment", req.transaction_type.as_str()));
        LedgerService::post(
            uow,
            req.payment_date,
            Self::source_kind(origin),
            id.into_inner(),
            vec![
                PostingLeg::debit(req.debit_account_id, amount, description.clone()),
                PostingLeg::credit(req.credit_account_id, amount, description),
            ],
        )?;

        let payment = Payment {
            id,
            payment_date: req.payment_date,
            amount,
            contact_id: req.contact_id.or(parent_contact),
            method: if req.method.trim().is_empty() {
                "CASH".to_string()
            } else {
                req.method
            },
            credit_account_id: req.credit_account_id,
            debit_account_id: req.debit_account_id,
            transaction_type: req.transaction_type,
            transaction_id,
            origin,
            notes: req.notes,
            created_by: uow.user(),
            created_at: uow.now(),
        };
        uow.upsert(Row::Payment(payment.clone()));
        Self::resync_parent(uow, payment.transaction_type, payment.transaction_id)?;
        info!(
            payment_id = %payment.id,
            amount = %payment.amount,
            kind = payment.transaction_type.as_str(),
            "payment recorded"
        );
        Ok(payment)
    }

    /// Reverses a payment's group, removes the row and resyncs its parent.
    pub(crate) fn undo(uow: &mut UnitOfWork<'_>, payment_id: PaymentId) -> KernelResult<Payment> {
        let payment = uow.book().payment(payment_id)?.clone();
        LedgerService::reverse(
            uow,
            Self::source_kind(payment.origin),
            payment_id.into_inner(),
            payment.payment_date,
        )?;
        uow.remove(&RowKey::Payment(payment_id));
        Self::resync_parent(uow, payment.transaction_type, payment.transaction_id)?;
        Ok(payment)
    }

    /// Recomputes a parent's settled amount from its linked payments.
    pub(crate) fn resync_parent(
        uow: &mut UnitOfWork<'_>,
        transaction_type: TransactionType,
        transaction_id: Option<Uuid>,
    ) -> KernelResult<()> {
        let Some(raw) = transaction_id else {
            return Ok(());
        };
        let settled = Self::settled(uow.book(), transaction_type, raw);
        match transaction_type {
            TransactionType::Sale => {
                // The parent may already be gone when a sale is being deleted.
                if let Ok(sale) = uow.book().sale(SaleId::from_uuid(raw)) {
                    let mut sale = sale.clone();
                    sale.amount_received = settled;
                    sale.payment_status = PaymentStatus::derive(settled, sale.total_sale_amount);
                    uow.upsert(Row::Sale(sale));
                }
            }
            TransactionType::Purchase => {
                if let Ok(purchase) = uow.book().purchase(PurchaseId::from_uuid(raw)) {
                    let mut purchase = purchase.clone();
                    purchase.amount_paid = settled;
                    purchase.payment_status = PaymentStatus::derive(settled, purchase.total_cost);
                    uow.upsert(Row::Purchase(purchase));
                }
            }
            TransactionType::General => {}
        }
        Ok(())
    }

    /// Sum of payments linked to a sale or purchase.
    #[must_use]
    pub fn settled(
        book: &Book,
        transaction_type: TransactionType,
        transaction_id: Uuid,
    ) -> Decimal {
        Self::linked(book, transaction_type, transaction_id)
            .map(|p| p.amount)
            .sum()
    }

    /// Payments linked to a sale or purchase.
    pub fn linked(
        book: &Book,
        transaction_type: TransactionType,
        transaction_id: Uuid,
    ) -> impl Iterator<Item = &Payment> {
        book.payments().filter(move |p| {
            p.transaction_type == transaction_type && p.transaction_id == Some(transaction_id)
        })
    }

    /// Removes the inline payments of a parent and fails on any other
    /// linked payment when `allow_standalone` is false.
    pub(crate) fn detach_inline(
        uow: &mut UnitOfWork<'_>,
        entity: &'static str,
        transaction_type: TransactionType,
        transaction_id: Uuid,
        allow_standalone: bool,
    ) -> KernelResult<()> {
        let linked: Vec<Payment> = Self::linked(uow.book(), transaction_type, transaction_id)
            .cloned()
            .collect();
        if !allow_standalone {
            let standalone = linked
                .iter()
                .filter(|p| p.origin != PaymentOrigin::Inline)
                .count();
            if standalone > 0 {
                return Err(KernelError::DependencyConflict {
                    entity,
                    id: transaction_id.to_string(),
                    dependents: format!("{standalone} payments recorded against it"),
                });
            }
        }
        for payment in linked.iter().filter(|p| p.origin == PaymentOrigin::Inline) {
            Self::undo(uow, payment.id)?;
        }
        Ok(())
    }

    /// Composes the inline payment of a purchase or sale.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn inline(
        uow: &mut UnitOfWork<'_>,
        date: NaiveDate,
        amount: Decimal,
        method: Option<String>,
        debit: AccountId,
        credit: AccountId,
        transaction_type: TransactionType,
        transaction_id: Uuid,
    ) -> KernelResult<Payment> {
        Self::compose(
            uow,
            PaymentId::new(),
            PaymentRequest {
                payment_date: date,
                amount,
                contact_id: None,
                method: method.unwrap_or_default(),
                debit_account_id: debit,
                credit_account_id: credit,
                transaction_type,
                transaction_id: Some(transaction_id),
                notes: None,
            },
            PaymentOrigin::Inline,
        )
    }

    fn source_kind(origin: PaymentOrigin) -> SourceKind {
        match origin {
            PaymentOrigin::Standalone | PaymentOrigin::Inline => SourceKind::of(EventKind::Payment),
            PaymentOrigin::QuickReceipt => SourceKind::of(EventKind::CashReceipt),
            PaymentOrigin::QuickPayment => SourceKind::of(EventKind::CashPayment),
        }
    }
}
