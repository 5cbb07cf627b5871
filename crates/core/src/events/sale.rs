//! Sale composer.

use granary_shared::types::{SaleId, round_internal};
use rust_decimal::Decimal;
use tracing::info;

use super::common::{
    active_crop, customer, quantity_for, require_non_negative, require_positive, season_tag,
};
use super::payment::PaymentService;
use super::types::{PaymentStatus, Sale, SaleRequest, TransactionType};
use crate::audit::{AuditAction, snapshot};
use crate::error::{KernelError, KernelResult};
use crate::inventory::{ConsumerKind, InventoryEngine};
use crate::ledger::{EventKind, LedgerService, PostingLeg, SourceKind};
use crate::settings::AccountRole;
use crate::store::{Row, RowKey, UnitOfWork};

const ENTITY: &str = "Sale";

/// Records, updates and deletes sales.
pub struct SaleService;

impl SaleService {
    /// Records a sale.
    ///
    /// Drains stock FIFO, then posts two groups under the sale id:
    /// `SALE` (`Dr Accounts Receivable, Cr Sales Revenue` for the total)
    /// and `SALE_COGS` (`Dr COGS, Cr Inventory` for the drained cost).
    /// A positive `amount_received` composes an inline payment
    /// `Dr Cash, Cr Accounts Receivable`.
    ///
    /// # Errors
    ///
    /// `InsufficientStock` when the crop holds less than the sold quantity.
    pub fn record(uow: &mut UnitOfWork<'_>, req: SaleRequest) -> KernelResult<Sale> {
        let sale = Self::compose(uow, SaleId::new(), req)?;
        uow.audit(
            AuditAction::Create,
            ENTITY,
            sale.id.into_inner(),
            None,
            snapshot(&sale),
        );
        Ok(sale)
    }

    /// Restores the sale's stock, reverses its groups and recomposes it
    /// from `req` under the same id.
    pub fn update(
        uow: &mut UnitOfWork<'_>,
        sale_id: SaleId,
        req: SaleRequest,
    ) -> KernelResult<Sale> {
        let before = Self::undo(uow, sale_id, true)?;
        Self::compose(uow, sale_id, req)?;
        PaymentService::resync_parent(uow, TransactionType::Sale, Some(sale_id.into_inner()))?;

        let mut after = uow.book().sale(sale_id)?.clone();
        after.created_at = before.created_at;
        uow.upsert(Row::Sale(after.clone()));
        uow.audit(
            AuditAction::Update,
            ENTITY,
            sale_id.into_inner(),
            snapshot(&before),
            snapshot(&after),
        );
        Ok(after)
    }

    /// Reverses and removes a sale, giving its slices back to their batches.
    ///
    /// # Errors
    ///
    /// `DependencyConflict` when returns or standalone payments reference it.
    pub fn delete(uow: &mut UnitOfWork<'_>, sale_id: SaleId) -> KernelResult<()> {
        let before = Self::undo(uow, sale_id, false)?;
        uow.audit(
            AuditAction::Delete,
            ENTITY,
            sale_id.into_inner(),
            snapshot(&before),
            None,
        );
        info!(%sale_id, "sale deleted");
        Ok(())
    }

    fn compose(uow: &mut UnitOfWork<'_>, id: SaleId, req: SaleRequest) -> KernelResult<Sale> {
        require_non_negative("amount_received", req.amount_received)?;
        let crop = active_crop(uow.book(), req.crop_id)?;
        let customer = customer(uow.book(), req.customer_id)?;
        let season_id = season_tag(uow, req.season_id)?;
        let (calc, pricing_unit) = quantity_for(&crop, &req.quantity)?;
        let sold_kg = round_internal(req.quantity_sold_kg.unwrap_or(calc.net_for_inventory_kg));
        require_positive("quantity_sold_kg", sold_kg)?;
        if req.amount_received > calc.total_amount {
            return Err(KernelError::validation(
                "amount_received",
                format!("cannot receive more than the invoice total {}", calc.total_amount),
            ));
        }

        let plan = InventoryEngine::consume(
            uow,
            crop.id,
            sold_kg,
            ConsumerKind::Sale,
            id.into_inner(),
            req.sale_date,
        )?;
        InventoryEngine::adjust_physical(
            uow,
            crop.id,
            -req.quantity.gross_weight_kg,
            -req.quantity.bag_count,
        )?;

        let receivable = uow.role(AccountRole::Receivable)?;
        let revenue = uow.role(AccountRole::SalesRevenue)?;
        let description = format!("Sale of {} to {}", crop.name, customer.name);
        LedgerService::post(
            uow,
            req.sale_date,
            SourceKind::of(EventKind::Sale),
            id.into_inner(),
            vec![
                PostingLeg::debit(receivable, calc.total_amount, description.clone()),
                PostingLeg::credit(revenue, calc.total_amount, description),
            ],
        )?;
        if plan.total_cost > Decimal::ZERO {
            let cogs = uow.role(AccountRole::Cogs)?;
            let inventory = uow.role(AccountRole::Inventory)?;
            let description = format!("Cost of {} kg {}", sold_kg, crop.name);
            LedgerService::post(
                uow,
                req.sale_date,
                SourceKind::of(EventKind::SaleCogs),
                id.into_inner(),
                vec![
                    PostingLeg::debit(cogs, plan.total_cost, description.clone()),
                    PostingLeg::credit(inventory, plan.total_cost, description),
                ],
            )?;
        }

        let sale = Sale {
            id,
            crop_id: crop.id,
            customer_id: customer.id,
            season_id,
            sale_date: req.sale_date,
            quantity_sold_kg: sold_kg,
            selling_unit_price: req.quantity.unit_price,
            selling_pricing_unit: pricing_unit,
            selling_factor: calc.conversion_factor,
            total_sale_amount: calc.total_amount,
            amount_received: Decimal::ZERO,
            payment_status: PaymentStatus::derive(Decimal::ZERO, calc.total_amount),
            gross_quantity: req.quantity.gross_weight_kg,
            tare_weight: calc.tare_weight_kg,
            bag_count: req.quantity.bag_count,
            calculation_formula: req.quantity.formula,
            cogs_total: plan.total_cost,
            returned_qty: Decimal::ZERO,
            returned_amount: Decimal::ZERO,
            notes: req.notes,
            created_by: uow.user(),
            created_at: uow.now(),
        };
        uow.upsert(Row::Sale(sale));

        if req.amount_received > Decimal::ZERO {
            let cash = uow.role(AccountRole::Cash)?;
            PaymentService::inline(
                uow,
                req.sale_date,
                req.amount_received,
                req.payment_method,
                cash,
                receivable,
                TransactionType::Sale,
                id.into_inner(),
            )?;
        }

        let sale = uow.book().sale(id)?.clone();
        info!(
            sale_id = %sale.id,
            crop = %crop.name,
            sold_kg = %sale.quantity_sold_kg,
            total = %sale.total_sale_amount,
            cogs = %sale.cogs_total,
            slices = plan.slices.len(),
            "sale recorded"
        );
        Ok(sale)
    }

    fn undo(
        uow: &mut UnitOfWork<'_>,
        sale_id: SaleId,
        keep_standalone_payments: bool,
    ) -> KernelResult<Sale> {
        let sale = uow.book().sale(sale_id)?.clone();
        let returns = uow
            .book()
            .sale_returns()
            .filter(|r| r.sale_id == sale_id)
            .count();
        if returns > 0 {
            return Err(KernelError::DependencyConflict {
                entity: ENTITY,
                id: sale_id.to_string(),
                dependents: format!("{returns} sale returns"),
            });
        }
        PaymentService::detach_inline(
            uow,
            ENTITY,
            TransactionType::Sale,
            sale_id.into_inner(),
            keep_standalone_payments,
        )?;
        InventoryEngine::restore_consumption(uow, ConsumerKind::Sale, sale_id.into_inner())?;
        InventoryEngine::adjust_physical(uow, sale.crop_id, sale.gross_quantity, sale.bag_count)?;
        LedgerService::reverse(
            uow,
            SourceKind::of(EventKind::Sale),
            sale_id.into_inner(),
            sale.sale_date,
        )?;
        LedgerService::reverse_if_posted(
            uow,
            SourceKind::of(EventKind::SaleCogs),
            sale_id.into_inner(),
            sale.sale_date,
        )?;
        uow.remove(&RowKey::Sale(sale_id));
        Ok(sale)
    }
}
