//! Stock count corrections.

use granary_shared::types::{AdjustmentId, round_internal};
use rust_decimal::Decimal;
use tracing::info;

use super::common::{active_crop, require_positive, season_tag};
use super::types::{AdjustmentRequest, InventoryAdjustment};
use crate::audit::{AuditAction, snapshot};
use crate::error::KernelResult;
use crate::inventory::{BatchOrigin, ConsumerKind, InventoryEngine, NewBatch, PhysicalDelta};
use crate::ledger::{EventKind, LedgerService, PostingLeg, SourceKind};
use crate::settings::AccountRole;
use crate::store::{Row, RowKey, UnitOfWork};

const ENTITY: &str = "InventoryAdjustment";

/// Records and deletes inventory adjustments.
pub struct AdjustmentService;

impl AdjustmentService {
    /// Records a shortage, spoilage or surplus valued at the crop's
    /// current average cost.
    ///
    /// Shortage and spoilage take stock from every active batch in
    /// proportion, which removes it at the average, and post the cost that
    /// left the batches as `Dr Inventory Loss, Cr Inventory`. A surplus adds
    /// a batch at the average and posts `Dr Inventory, Cr Inventory Gain`.
    /// A zero value posts nothing.
    pub fn record(
        uow: &mut UnitOfWork<'_>,
        req: AdjustmentRequest,
    ) -> KernelResult<InventoryAdjustment> {
        require_positive("quantity_kg", req.quantity_kg)?;
        let crop = active_crop(uow.book(), req.crop_id)?;
        let season_id = season_tag(uow, req.season_id)?;
        let quantity = round_internal(req.quantity_kg);
        let cost_per_kg = uow.book().inventory(crop.id)?.average_cost_per_kg;
        let id = AdjustmentId::new();

        let (signed, batch_id, total_value) = if req.adjustment_type.is_outbound() {
            let plan = InventoryEngine::consume_pro_rata(
                uow,
                crop.id,
                quantity,
                ConsumerKind::Adjustment,
                id.into_inner(),
                req.adjustment_date,
            )?;
            InventoryEngine::adjust_physical(uow, crop.id, -quantity, 0)?;
            (-quantity, None, plan.total_cost)
        } else {
            let batch = InventoryEngine::add_batch(
                uow,
                NewBatch {
                    crop_id: crop.id,
                    quantity_kg: quantity,
                    cost_per_kg,
                    purchase_date: req.adjustment_date,
                    purchase_id: None,
                    supplier_id: None,
                    expiry_date: None,
                    origin: BatchOrigin::Surplus,
                    origin_id: id.into_inner(),
                    physical: PhysicalDelta {
                        gross_kg: quantity,
                        bags: 0,
                    },
                },
            )?;
            (quantity, Some(batch.id), round_internal(quantity * cost_per_kg))
        };

        if total_value > Decimal::ZERO {
            let inventory = uow.role(AccountRole::Inventory)?;
            let description = format!(
                "{} of {quantity} kg {}",
                req.adjustment_type.as_str(),
                crop.name
            );
            let legs = if req.adjustment_type.is_outbound() {
                let loss = uow.role(AccountRole::InventoryLoss)?;
                vec![
                    PostingLeg::debit(loss, total_value, description.clone()),
                    PostingLeg::credit(inventory, total_value, description),
                ]
            } else {
                let gain = uow.role(AccountRole::InventoryGain)?;
                vec![
                    PostingLeg::debit(inventory, total_value, description.clone()),
                    PostingLeg::credit(gain, total_value, description),
                ]
            };
            LedgerService::post(
                uow,
                req.adjustment_date,
                SourceKind::of(EventKind::Adjustment),
                id.into_inner(),
                legs,
            )?;
        }

        let adjustment = InventoryAdjustment {
            id,
            crop_id: crop.id,
            adjustment_date: req.adjustment_date,
            adjustment_type: req.adjustment_type,
            quantity: signed,
            cost_per_kg,
            total_value,
            batch_id,
            season_id,
            notes: req.notes,
            created_by: uow.user(),
            created_at: uow.now(),
        };
        uow.upsert(Row::Adjustment(adjustment.clone()));
        uow.audit(
            AuditAction::Create,
            ENTITY,
            id.into_inner(),
            None,
            snapshot(&adjustment),
        );
        info!(
            adjustment_id = %id,
            kind = adjustment.adjustment_type.as_str(),
            quantity = %signed,
            value = %total_value,
            "inventory adjustment recorded"
        );
        Ok(adjustment)
    }

    /// Undoes an adjustment.
    ///
    /// # Errors
    ///
    /// `CascadeRequired` when a surplus batch has been drawn from.
    pub fn delete(uow: &mut UnitOfWork<'_>, adjustment_id: AdjustmentId) -> KernelResult<()> {
        let adjustment = uow.book().adjustment(adjustment_id)?.clone();
        match adjustment.batch_id {
            Some(batch_id) => {
                InventoryEngine::remove_batch(uow, batch_id, ENTITY, adjustment_id.into_inner())?;
            }
            None => {
                InventoryEngine::restore_consumption(
                    uow,
                    ConsumerKind::Adjustment,
                    adjustment_id.into_inner(),
                )?;
            }
        }
        InventoryEngine::adjust_physical(uow, adjustment.crop_id, -adjustment.quantity, 0)?;
        LedgerService::reverse_if_posted(
            uow,
            SourceKind::of(EventKind::Adjustment),
            adjustment_id.into_inner(),
            adjustment.adjustment_date,
        )?;
        uow.remove(&RowKey::Adjustment(adjustment_id));
        uow.audit(
            AuditAction::Delete,
            ENTITY,
            adjustment_id.into_inner(),
            snapshot(&adjustment),
            None,
        );
        info!(%adjustment_id, "inventory adjustment deleted");
        Ok(())
    }
}
