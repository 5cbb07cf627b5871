//! Opening stock and crop transformations.

use granary_shared::types::{BatchId, TransformationId, round_internal};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use super::common::{active_crop, require_non_negative, require_positive};
use super::types::{OpeningStockRequest, TransformRequest, Transformation};
use crate::audit::{AuditAction, snapshot};
use crate::error::{KernelError, KernelResult};
use crate::inventory::{
    BatchOrigin, ConsumerKind, InventoryBatch, InventoryEngine, NewBatch, PhysicalDelta,
};
use crate::ledger::{EventKind, LedgerService, PostingLeg, SourceKind};
use crate::settings::AccountRole;
use crate::store::{Row, RowKey, UnitOfWork};

/// Stock movements that are neither bought nor sold.
pub struct StockService;

impl StockService {
    /// Brings existing stock onto the books: a batch plus
    /// `Dr Inventory, Cr Owner Equity` under `OPENING_STOCK`.
    pub fn opening_stock(
        uow: &mut UnitOfWork<'_>,
        req: OpeningStockRequest,
    ) -> KernelResult<InventoryBatch> {
        require_positive("quantity_kg", req.quantity_kg)?;
        require_non_negative("cost_per_kg", req.cost_per_kg)?;
        let crop = active_crop(uow.book(), req.crop_id)?;
        let source_id = Uuid::now_v7();
        let batch = InventoryEngine::add_batch(
            uow,
            NewBatch {
                crop_id: crop.id,
                quantity_kg: req.quantity_kg,
                cost_per_kg: req.cost_per_kg,
                purchase_date: req.date,
                purchase_id: None,
                supplier_id: None,
                expiry_date: None,
                origin: BatchOrigin::Opening,
                origin_id: source_id,
                physical: PhysicalDelta {
                    gross_kg: round_internal(req.quantity_kg),
                    bags: 0,
                },
            },
        )?;

        let value = round_internal(batch.original_qty * batch.cost_per_kg);
        if value > Decimal::ZERO {
            let inventory = uow.role(AccountRole::Inventory)?;
            let equity = uow.role(AccountRole::OwnerEquity)?;
            let description = format!("Opening stock of {}", crop.name);
            LedgerService::post(
                uow,
                req.date,
                SourceKind::of(EventKind::OpeningStock),
                source_id,
                vec![
                    PostingLeg::debit(inventory, value, description.clone()),
                    PostingLeg::credit(equity, value, description),
                ],
            )?;
        }
        uow.audit(
            AuditAction::Create,
            "InventoryBatch",
            batch.id.into_inner(),
            None,
            snapshot(&batch),
        );
        info!(
            batch_id = %batch.id,
            crop = %crop.name,
            quantity = %batch.original_qty,
            value = %value,
            "opening stock recorded"
        );
        Ok(batch)
    }

    /// Removes an untouched opening-stock batch and reverses its posting.
    ///
    /// # Errors
    ///
    /// - `Validation` when the batch did not come from opening stock
    /// - `CascadeRequired` when it has been drawn from
    pub fn delete_opening_stock(uow: &mut UnitOfWork<'_>, batch_id: BatchId) -> KernelResult<()> {
        let batch = uow.book().batch(batch_id)?.clone();
        if batch.origin != BatchOrigin::Opening {
            return Err(KernelError::validation(
                "batch_id",
                format!("batch {batch_id} is not opening stock"),
            ));
        }
        InventoryEngine::remove_batch(uow, batch_id, "InventoryBatch", batch.origin_id)?;
        InventoryEngine::adjust_physical(uow, batch.crop_id, -batch.original_qty, 0)?;
        LedgerService::reverse_if_posted(
            uow,
            SourceKind::of(EventKind::OpeningStock),
            batch.origin_id,
            batch.purchase_date,
        )?;
        uow.audit(
            AuditAction::Delete,
            "InventoryBatch",
            batch_id.into_inner(),
            snapshot(&batch),
            None,
        );
        info!(%batch_id, "opening stock deleted");
        Ok(())
    }

    /// Turns one crop into another.
    ///
    /// The input is drained FIFO; the output batch is costed at the drained
    /// cost spread over the output quantity. Value stays inside the
    /// inventory account, so nothing is posted.
    ///
    /// # Errors
    ///
    /// `InsufficientStock` when the input crop holds less than requested.
    pub fn transform(
        uow: &mut UnitOfWork<'_>,
        req: TransformRequest,
    ) -> KernelResult<Transformation> {
        require_positive("input_qty", req.input_qty)?;
        require_positive("output_qty", req.output_qty)?;
        if req.input_crop_id == req.output_crop_id {
            return Err(KernelError::validation(
                "output_crop_id",
                "input and output crops must differ",
            ));
        }
        let input = active_crop(uow.book(), req.input_crop_id)?;
        let output = active_crop(uow.book(), req.output_crop_id)?;
        let input_qty = round_internal(req.input_qty);
        let output_qty = round_internal(req.output_qty);

        let id = TransformationId::new();
        let plan = InventoryEngine::consume(
            uow,
            input.id,
            input_qty,
            ConsumerKind::Transformation,
            id.into_inner(),
            req.transform_date,
        )?;
        InventoryEngine::adjust_physical(uow, input.id, -input_qty, 0)?;

        let output_cost_per_kg = round_internal(plan.total_cost / output_qty);
        let batch = InventoryEngine::add_batch(
            uow,
            NewBatch {
                crop_id: output.id,
                quantity_kg: output_qty,
                cost_per_kg: output_cost_per_kg,
                purchase_date: req.transform_date,
                purchase_id: None,
                supplier_id: None,
                expiry_date: None,
                origin: BatchOrigin::Transformation,
                origin_id: id.into_inner(),
                physical: PhysicalDelta {
                    gross_kg: output_qty,
                    bags: 0,
                },
            },
        )?;

        let transformation = Transformation {
            id,
            transform_date: req.transform_date,
            input_crop_id: input.id,
            input_qty,
            output_crop_id: output.id,
            output_qty,
            input_cost: plan.total_cost,
            output_cost_per_kg,
            output_batch_id: batch.id,
            notes: req.notes,
            created_by: uow.user(),
            created_at: uow.now(),
        };
        uow.upsert(Row::Transformation(transformation.clone()));
        uow.audit(
            AuditAction::Create,
            "Transformation",
            id.into_inner(),
            None,
            snapshot(&transformation),
        );
        info!(
            transformation_id = %id,
            input = %input.name,
            output = %output.name,
            input_cost = %plan.total_cost,
            output_cost_per_kg = %output_cost_per_kg,
            "transformation recorded"
        );
        Ok(transformation)
    }

    /// Undoes a transformation.
    ///
    /// # Errors
    ///
    /// `CascadeRequired` when the output batch has been drawn from.
    pub fn delete_transformation(
        uow: &mut UnitOfWork<'_>,
        transformation_id: TransformationId,
    ) -> KernelResult<()> {
        let transformation = uow.book().transformation(transformation_id)?.clone();
        InventoryEngine::remove_batch(
            uow,
            transformation.output_batch_id,
            "Transformation",
            transformation_id.into_inner(),
        )?;
        InventoryEngine::adjust_physical(
            uow,
            transformation.output_crop_id,
            -transformation.output_qty,
            0,
        )?;
        InventoryEngine::restore_consumption(
            uow,
            ConsumerKind::Transformation,
            transformation_id.into_inner(),
        )?;
        InventoryEngine::adjust_physical(
            uow,
            transformation.input_crop_id,
            transformation.input_qty,
            0,
        )?;
        uow.remove(&RowKey::Transformation(transformation_id));
        uow.audit(
            AuditAction::Delete,
            "Transformation",
            transformation_id.into_inner(),
            snapshot(&transformation),
            None,
        );
        info!(%transformation_id, "transformation deleted");
        Ok(())
    }
}
