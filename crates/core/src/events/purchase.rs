//! Purchase composer.

use granary_shared::types::PurchaseId;
use rust_decimal::Decimal;
use tracing::info;

use super::common::{active_crop, quantity_for, require_non_negative, season_tag, supplier};
use super::payment::PaymentService;
use super::types::{PaymentStatus, Purchase, PurchaseRequest, TransactionType};
use crate::audit::{AuditAction, snapshot};
use crate::error::{KernelError, KernelResult};
use crate::inventory::{BatchOrigin, InventoryEngine, NewBatch, PhysicalDelta};
use crate::ledger::{EventKind, LedgerService, PostingLeg, SourceKind};
use crate::settings::AccountRole;
use crate::store::{Row, RowKey, UnitOfWork};

const ENTITY: &str = "Purchase";

/// Records, updates and deletes purchases.
pub struct PurchaseService;

impl PurchaseService {
    /// Records a purchase.
    ///
    /// Creates the purchase batch, posts `Dr Inventory, Cr Accounts
    /// Payable` for the invoice total and, when `amount_paid` is positive,
    /// composes an inline payment `Dr Accounts Payable, Cr Cash`.
    pub fn record(uow: &mut UnitOfWork<'_>, req: PurchaseRequest) -> KernelResult<Purchase> {
        let purchase = Self::compose(uow, PurchaseId::new(), req)?;
        uow.audit(
            AuditAction::Create,
            ENTITY,
            purchase.id.into_inner(),
            None,
            snapshot(&purchase),
        );
        Ok(purchase)
    }

    /// Reverses a purchase and recomposes it from `req` under the same id.
    ///
    /// Standalone payments stay linked and are counted against the new total.
    ///
    /// # Errors
    ///
    /// - `DependencyConflict` when the purchase has returns
    /// - `CascadeRequired` when its batch has been drawn from
    pub fn update(
        uow: &mut UnitOfWork<'_>,
        purchase_id: PurchaseId,
        req: PurchaseRequest,
    ) -> KernelResult<Purchase> {
        let before = Self::undo(uow, purchase_id, true)?;
        Self::compose(uow, purchase_id, req)?;
        PaymentService::resync_parent(
            uow,
            TransactionType::Purchase,
            Some(purchase_id.into_inner()),
        )?;

        let mut after = uow.book().purchase(purchase_id)?.clone();
        after.created_at = before.created_at;
        uow.upsert(Row::Purchase(after.clone()));
        uow.audit(
            AuditAction::Update,
            ENTITY,
            purchase_id.into_inner(),
            snapshot(&before),
            snapshot(&after),
        );
        Ok(after)
    }

    /// Reverses and removes a purchase with its batch and inline payment.
    ///
    /// # Errors
    ///
    /// - `DependencyConflict` when returns or standalone payments reference it
    /// - `CascadeRequired` when its batch has been drawn from
    pub fn delete(uow: &mut UnitOfWork<'_>, purchase_id: PurchaseId) -> KernelResult<()> {
        let before = Self::undo(uow, purchase_id, false)?;
        uow.audit(
            AuditAction::Delete,
            ENTITY,
            purchase_id.into_inner(),
            snapshot(&before),
            None,
        );
        info!(%purchase_id, "purchase deleted");
        Ok(())
    }

    fn compose(
        uow: &mut UnitOfWork<'_>,
        id: PurchaseId,
        req: PurchaseRequest,
    ) -> KernelResult<Purchase> {
        require_non_negative("amount_paid", req.amount_paid)?;
        let crop = active_crop(uow.book(), req.crop_id)?;
        let supplier = supplier(uow.book(), req.supplier_id)?;
        let season_id = season_tag(uow, req.season_id)?;
        let (calc, pricing_unit) = quantity_for(&crop, &req.quantity)?;
        if req.amount_paid > calc.total_amount {
            return Err(KernelError::validation(
                "amount_paid",
                format!("cannot pay more than the invoice total {}", calc.total_amount),
            ));
        }

        let batch = InventoryEngine::add_batch(
            uow,
            NewBatch {
                crop_id: crop.id,
                quantity_kg: calc.net_for_inventory_kg,
                cost_per_kg: calc.cost_per_kg_inventory,
                purchase_date: req.purchase_date,
                purchase_id: Some(id),
                supplier_id: Some(supplier.id),
                expiry_date: req.expiry_date,
                origin: BatchOrigin::Purchase,
                origin_id: id.into_inner(),
                physical: PhysicalDelta {
                    gross_kg: req.quantity.gross_weight_kg,
                    bags: req.quantity.bag_count,
                },
            },
        )?;

        let inventory = uow.role(AccountRole::Inventory)?;
        let payable = uow.role(AccountRole::Payable)?;
        let description = format!("Purchase of {} from {}", crop.name, supplier.name);
        LedgerService::post(
            uow,
            req.purchase_date,
            SourceKind::of(EventKind::Purchase),
            id.into_inner(),
            vec![
                PostingLeg::debit(inventory, calc.total_amount, description.clone()),
                PostingLeg::credit(payable, calc.total_amount, description),
            ],
        )?;

        let purchase = Purchase {
            id,
            crop_id: crop.id,
            supplier_id: supplier.id,
            season_id,
            purchase_date: req.purchase_date,
            net_quantity_kg: calc.net_for_inventory_kg,
            unit_price: req.quantity.unit_price,
            total_cost: calc.total_amount,
            gross_quantity: req.quantity.gross_weight_kg,
            tare_weight: calc.tare_weight_kg,
            bag_count: req.quantity.bag_count,
            pricing_unit,
            conversion_factor: calc.conversion_factor,
            calculation_formula: req.quantity.formula,
            amount_paid: Decimal::ZERO,
            payment_status: PaymentStatus::derive(Decimal::ZERO, calc.total_amount),
            returned_qty: Decimal::ZERO,
            returned_cost: Decimal::ZERO,
            batch_id: batch.id,
            notes: req.notes,
            created_by: uow.user(),
            created_at: uow.now(),
        };
        uow.upsert(Row::Purchase(purchase));

        if req.amount_paid > Decimal::ZERO {
            let cash = uow.role(AccountRole::Cash)?;
            PaymentService::inline(
                uow,
                req.purchase_date,
                req.amount_paid,
                req.payment_method,
                payable,
                cash,
                TransactionType::Purchase,
                id.into_inner(),
            )?;
        }

        let purchase = uow.book().purchase(id)?.clone();
        info!(
            purchase_id = %purchase.id,
            crop = %crop.name,
            net_kg = %purchase.net_quantity_kg,
            total = %purchase.total_cost,
            status = purchase.payment_status.as_str(),
            "purchase recorded"
        );
        Ok(purchase)
    }

    fn undo(
        uow: &mut UnitOfWork<'_>,
        purchase_id: PurchaseId,
        keep_standalone_payments: bool,
    ) -> KernelResult<Purchase> {
        let purchase = uow.book().purchase(purchase_id)?.clone();
        let returns = uow
            .book()
            .purchase_returns()
            .filter(|r| r.purchase_id == purchase_id)
            .count();
        if returns > 0 {
            return Err(KernelError::DependencyConflict {
                entity: ENTITY,
                id: purchase_id.to_string(),
                dependents: format!("{returns} purchase returns"),
            });
        }
        PaymentService::detach_inline(
            uow,
            ENTITY,
            TransactionType::Purchase,
            purchase_id.into_inner(),
            keep_standalone_payments,
        )?;
        InventoryEngine::remove_batch(uow, purchase.batch_id, ENTITY, purchase_id.into_inner())?;
        InventoryEngine::adjust_physical(
            uow,
            purchase.crop_id,
            -purchase.gross_quantity,
            -purchase.bag_count,
        )?;
        LedgerService::reverse(
            uow,
            SourceKind::of(EventKind::Purchase),
            purchase_id.into_inner(),
            purchase.purchase_date,
        )?;
        uow.remove(&RowKey::Purchase(purchase_id));
        Ok(purchase)
    }
}
