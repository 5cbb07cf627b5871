//! Sale and purchase returns.

use granary_shared::types::{PurchaseReturnId, SaleReturnId, round_internal};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::info;

use super::common::require_positive;
use super::types::{
    PaymentStatus, PurchaseReturn, PurchaseReturnRequest, SaleReturn, SaleReturnRequest,
};
use crate::audit::{AuditAction, snapshot};
use crate::error::{KernelError, KernelResult};
use crate::inventory::{BatchOrigin, InventoryEngine, NewBatch, PhysicalDelta};
use crate::ledger::{EventKind, LedgerService, PostingLeg, SourceKind};
use crate::settings::{AccountRole, SettingsService, Tunable};
use crate::store::{Row, RowKey, UnitOfWork};

/// Records and deletes returns in both directions.
pub struct ReturnService;

impl ReturnService {
    /// Takes goods back from a customer.
    ///
    /// The refund is the returned share of the sale's remaining total. The
    /// goods re-enter stock as a new batch costed at the sale's weighted
    /// COGS per kg, or the current average when the sale carried no cost.
    /// Posts `Dr Sales Revenue, Cr Accounts Receivable` for the refund and,
    /// when `SALE_RETURN_REVERSES_COGS` is on, `Dr Inventory, Cr COGS` for
    /// the restocked cost in the same group.
    pub fn record_sale_return(
        uow: &mut UnitOfWork<'_>,
        req: SaleReturnRequest,
    ) -> KernelResult<SaleReturn> {
        require_positive("returned_qty", req.returned_qty)?;
        let mut sale = uow.book().sale(req.sale_id)?.clone();
        let returned_qty = round_internal(req.returned_qty);
        if returned_qty > sale.quantity_sold_kg {
            return Err(KernelError::validation(
                "returned_qty",
                format!(
                    "cannot return {returned_qty} kg; {} kg remain on the sale",
                    sale.quantity_sold_kg
                ),
            ));
        }

        let refund = round_internal(returned_qty / sale.quantity_sold_kg * sale.total_sale_amount);
        let cost_per_kg = if sale.cogs_total > Decimal::ZERO {
            round_internal(sale.cogs_total / sale.quantity_sold_kg)
        } else {
            uow.book().inventory(sale.crop_id)?.average_cost_per_kg
        };
        let restocked_cost = round_internal(returned_qty * cost_per_kg);
        let reverses_cogs =
            SettingsService::tunable_bool(uow.book(), Tunable::SaleReturnReversesCogs, true);

        let id = SaleReturnId::new();
        let batch = InventoryEngine::add_batch(
            uow,
            NewBatch {
                crop_id: sale.crop_id,
                quantity_kg: returned_qty,
                cost_per_kg,
                purchase_date: req.return_date,
                purchase_id: None,
                supplier_id: None,
                expiry_date: None,
                origin: BatchOrigin::SaleReturn,
                origin_id: id.into_inner(),
                physical: PhysicalDelta {
                    gross_kg: returned_qty,
                    bags: 0,
                },
            },
        )?;

        let revenue = uow.role(AccountRole::SalesRevenue)?;
        let receivable = uow.role(AccountRole::Receivable)?;
        let description = format!("Return of {returned_qty} kg on sale {}", sale.id);
        let mut legs = vec![
            PostingLeg::debit(revenue, refund, description.clone()),
            PostingLeg::credit(receivable, refund, description.clone()),
        ];
        if reverses_cogs && restocked_cost > Decimal::ZERO {
            let inventory = uow.role(AccountRole::Inventory)?;
            let cogs = uow.role(AccountRole::Cogs)?;
            legs.push(PostingLeg::debit(inventory, restocked_cost, description.clone()));
            legs.push(PostingLeg::credit(cogs, restocked_cost, description));
        }
        LedgerService::post(
            uow,
            req.return_date,
            SourceKind::of(EventKind::SaleReturn),
            id.into_inner(),
            legs,
        )?;

        sale.quantity_sold_kg -= returned_qty;
        sale.total_sale_amount -= refund;
        sale.cogs_total = (sale.cogs_total - restocked_cost).max(Decimal::ZERO);
        sale.returned_qty += returned_qty;
        sale.returned_amount += refund;
        sale.payment_status = PaymentStatus::derive(sale.amount_received, sale.total_sale_amount);
        uow.upsert(Row::Sale(sale));

        let sale_return = SaleReturn {
            id,
            sale_id: req.sale_id,
            return_date: req.return_date,
            returned_qty,
            reason: req.reason,
            refund_amount: refund,
            cost_per_kg,
            restocked_cost,
            reverses_cogs,
            batch_id: batch.id,
            created_by: uow.user(),
            created_at: uow.now(),
        };
        uow.upsert(Row::SaleReturn(sale_return.clone()));
        uow.audit(
            AuditAction::Create,
            "SaleReturn",
            id.into_inner(),
            None,
            snapshot(&sale_return),
        );
        info!(
            sale_return_id = %id,
            sale_id = %sale_return.sale_id,
            returned_kg = %returned_qty,
            refund = %refund,
            cost_per_kg = %cost_per_kg,
            "sale return recorded"
        );
        Ok(sale_return)
    }

    /// Undoes a sale return.
    ///
    /// # Errors
    ///
    /// `CascadeRequired` when the restock batch has been drawn from.
    pub fn delete_sale_return(
        uow: &mut UnitOfWork<'_>,
        return_id: SaleReturnId,
    ) -> KernelResult<()> {
        let sale_return = uow.book().sale_return(return_id)?.clone();
        let mut sale = uow.book().sale(sale_return.sale_id)?.clone();
        let batch = InventoryEngine::remove_batch(
            uow,
            sale_return.batch_id,
            "SaleReturn",
            return_id.into_inner(),
        )?;
        InventoryEngine::adjust_physical(uow, batch.crop_id, -sale_return.returned_qty, 0)?;
        LedgerService::reverse(
            uow,
            SourceKind::of(EventKind::SaleReturn),
            return_id.into_inner(),
            sale_return.return_date,
        )?;

        sale.quantity_sold_kg += sale_return.returned_qty;
        sale.total_sale_amount += sale_return.refund_amount;
        sale.cogs_total += sale_return.restocked_cost;
        sale.returned_qty -= sale_return.returned_qty;
        sale.returned_amount -= sale_return.refund_amount;
        sale.payment_status = PaymentStatus::derive(sale.amount_received, sale.total_sale_amount);
        uow.upsert(Row::Sale(sale));
        uow.remove(&RowKey::SaleReturn(return_id));
        uow.audit(
            AuditAction::Delete,
            "SaleReturn",
            return_id.into_inner(),
            snapshot(&sale_return),
            None,
        );
        info!(sale_return_id = %return_id, "sale return deleted");
        Ok(())
    }

    /// Sends goods back to a supplier.
    ///
    /// The returned cost is the returned share of the purchase's remaining
    /// total. The purchase batch is reduced in place; sales that already
    /// drew from it keep their cost. Posts `Dr Accounts Payable, Cr
    /// Inventory`.
    ///
    /// # Errors
    ///
    /// `InsufficientStock` when the purchase batch holds less than the
    /// returned quantity.
    pub fn record_purchase_return(
        uow: &mut UnitOfWork<'_>,
        req: PurchaseReturnRequest,
    ) -> KernelResult<PurchaseReturn> {
        require_positive("returned_qty", req.returned_qty)?;
        let mut purchase = uow.book().purchase(req.purchase_id)?.clone();
        let returned_qty = round_internal(req.returned_qty);
        if returned_qty > purchase.net_quantity_kg {
            return Err(KernelError::validation(
                "returned_qty",
                format!(
                    "cannot return {returned_qty} kg; {} kg remain on the purchase",
                    purchase.net_quantity_kg
                ),
            ));
        }

        let ratio = returned_qty / purchase.net_quantity_kg;
        let returned_cost = round_internal(ratio * purchase.total_cost);
        let gross_returned = round_internal(ratio * purchase.gross_quantity);
        let bags_returned = (Decimal::from(purchase.bag_count) * ratio)
            .round()
            .to_i64()
            .unwrap_or(0);

        let id = PurchaseReturnId::new();
        InventoryEngine::reduce_batch(uow, purchase.batch_id, returned_qty)?;
        InventoryEngine::adjust_physical(uow, purchase.crop_id, -gross_returned, -bags_returned)?;

        let payable = uow.role(AccountRole::Payable)?;
        let inventory = uow.role(AccountRole::Inventory)?;
        let description = format!("Return of {returned_qty} kg on purchase {}", purchase.id);
        LedgerService::post(
            uow,
            req.return_date,
            SourceKind::of(EventKind::PurchaseReturn),
            id.into_inner(),
            vec![
                PostingLeg::debit(payable, returned_cost, description.clone()),
                PostingLeg::credit(inventory, returned_cost, description),
            ],
        )?;

        purchase.net_quantity_kg -= returned_qty;
        purchase.total_cost -= returned_cost;
        purchase.gross_quantity -= gross_returned;
        purchase.bag_count -= bags_returned;
        purchase.returned_qty += returned_qty;
        purchase.returned_cost += returned_cost;
        purchase.payment_status = PaymentStatus::derive(purchase.amount_paid, purchase.total_cost);
        uow.upsert(Row::Purchase(purchase));

        let purchase_return = PurchaseReturn {
            id,
            purchase_id: req.purchase_id,
            return_date: req.return_date,
            returned_qty,
            reason: req.reason,
            returned_cost,
            gross_returned,
            bags_returned,
            created_by: uow.user(),
            created_at: uow.now(),
        };
        uow.upsert(Row::PurchaseReturn(purchase_return.clone()));
        uow.audit(
            AuditAction::Create,
            "PurchaseReturn",
            id.into_inner(),
            None,
            snapshot(&purchase_return),
        );
        info!(
            purchase_return_id = %id,
            purchase_id = %purchase_return.purchase_id,
            returned_kg = %returned_qty,
            returned_cost = %returned_cost,
            "purchase return recorded"
        );
        Ok(purchase_return)
    }

    /// Undoes a purchase return, giving the quantity back to the purchase batch.
    pub fn delete_purchase_return(
        uow: &mut UnitOfWork<'_>,
        return_id: PurchaseReturnId,
    ) -> KernelResult<()> {
        let purchase_return = uow.book().purchase_return(return_id)?.clone();
        let mut purchase = uow.book().purchase(purchase_return.purchase_id)?.clone();
        InventoryEngine::restore_batch(uow, purchase.batch_id, purchase_return.returned_qty)?;
        InventoryEngine::adjust_physical(
            uow,
            purchase.crop_id,
            purchase_return.gross_returned,
            purchase_return.bags_returned,
        )?;
        LedgerService::reverse(
            uow,
            SourceKind::of(EventKind::PurchaseReturn),
            return_id.into_inner(),
            purchase_return.return_date,
        )?;

        purchase.net_quantity_kg += purchase_return.returned_qty;
        purchase.total_cost += purchase_return.returned_cost;
        purchase.gross_quantity += purchase_return.gross_returned;
        purchase.bag_count += purchase_return.bags_returned;
        purchase.returned_qty -= purchase_return.returned_qty;
        purchase.returned_cost -= purchase_return.returned_cost;
        purchase.payment_status = PaymentStatus::derive(purchase.amount_paid, purchase.total_cost);
        uow.upsert(Row::Purchase(purchase));
        uow.remove(&RowKey::PurchaseReturn(return_id));
        uow.audit(
            AuditAction::Delete,
            "PurchaseReturn",
            return_id.into_inner(),
            snapshot(&purchase_return),
            None,
        );
        info!(purchase_return_id = %return_id, "purchase return deleted");
        Ok(())
    }
}
