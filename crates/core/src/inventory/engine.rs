//! Batch bookkeeping, FIFO consumption and aggregate maintenance.

use chrono::NaiveDate;
use granary_shared::types::{
    BatchId, ConsumptionId, ContactId, CropId, PurchaseId, QUANTITY_EPSILON, approx_eq,
    is_effectively_zero, round_internal,
};
use rust_decimal::Decimal;
use tracing::debug;
use uuid::Uuid;

use super::types::{
    BatchOrigin, ConsumerKind, ConsumptionPlan, ConsumptionSlice, Inventory, InventoryBatch,
    InventoryCheck, LowStockAlert, PhysicalDelta, StockConsumption,
};
use crate::error::{KernelError, KernelResult};
use crate::store::{Book, Row, RowKey, UnitOfWork};

/// Inbound lot description for [`InventoryEngine::add_batch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBatch {
    /// Crop.
    pub crop_id: CropId,
    /// Stock weight in kg.
    pub quantity_kg: Decimal,
    /// Fixed cost per kg.
    pub cost_per_kg: Decimal,
    /// FIFO date.
    pub purchase_date: NaiveDate,
    /// Source purchase.
    pub purchase_id: Option<PurchaseId>,
    /// Supplier.
    pub supplier_id: Option<ContactId>,
    /// Expiry.
    pub expiry_date: Option<NaiveDate>,
    /// How the lot came in.
    pub origin: BatchOrigin,
    /// Event that created the lot.
    pub origin_id: Uuid,
    /// Physical quantities added alongside.
    pub physical: PhysicalDelta,
}

/// Stateless inventory operations over a unit of work.
pub struct InventoryEngine;

impl InventoryEngine {
    /// Creates an active batch and folds it into the aggregate.
    ///
    /// The new average is computed from the aggregate's prior net stock
    /// and average, not from the batches.
    pub fn add_batch(uow: &mut UnitOfWork<'_>, new: NewBatch) -> KernelResult<InventoryBatch> {
        if new.quantity_kg <= Decimal::ZERO {
            return Err(KernelError::validation(
                "quantity_kg",
                "inbound quantity must be positive",
            ));
        }
        if new.cost_per_kg < Decimal::ZERO {
            return Err(KernelError::validation(
                "cost_per_kg",
                "cost per kg must not be negative",
            ));
        }
        uow.book().crop(new.crop_id)?;
        let mut inventory = uow.book().inventory(new.crop_id)?.clone();

        let quantity = round_internal(new.quantity_kg);
        let cost = round_internal(new.cost_per_kg);
        let batch = InventoryBatch {
            id: BatchId::new(),
            crop_id: new.crop_id,
            original_qty: quantity,
            remaining_qty: quantity,
            cost_per_kg: cost,
            purchase_date: new.purchase_date,
            purchase_id: new.purchase_id,
            supplier_id: new.supplier_id,
            expiry_date: new.expiry_date,
            origin: new.origin,
            origin_id: new.origin_id,
            is_active: true,
            created_at: uow.now(),
        };

        let prior_net = inventory.net_stock_kg;
        let new_net = prior_net + quantity;
        inventory.average_cost_per_kg =
            round_internal((prior_net * inventory.average_cost_per_kg + quantity * cost) / new_net);
        inventory.net_stock_kg = new_net;
        inventory.current_stock_kg += quantity;
        inventory.gross_stock_kg += new.physical.gross_kg;
        inventory.bag_count += new.physical.bags;
        inventory.updated_at = uow.now();

        uow.upsert(Row::Batch(batch.clone()));
        uow.upsert(Row::Inventory(inventory.clone()));
        debug!(
            batch_id = %batch.id,
            crop_id = %batch.crop_id,
            quantity = %quantity,
            cost_per_kg = %cost,
            average = %inventory.average_cost_per_kg,
            "batch added"
        );
        Ok(batch)
    }

    /// Drains `quantity_kg` from the crop's active batches, oldest first.
    ///
    /// Every slice is persisted as a [`StockConsumption`] tagged with the
    /// consuming event so that the consumption can be restored later.
    ///
    /// # Errors
    ///
    /// `InsufficientStock` when the aggregate holds less than requested.
    pub fn consume(
        uow: &mut UnitOfWork<'_>,
        crop_id: CropId,
        quantity_kg: Decimal,
        consumer_kind: ConsumerKind,
        consumer_id: Uuid,
        consumed_on: NaiveDate,
    ) -> KernelResult<ConsumptionPlan> {
        let target = Target {
            crop_id,
            consumer_kind,
            consumer_id,
            consumed_on,
        };
        Self::draw(uow, &target, quantity_kg, Draw::Fifo)
    }

    /// Drains `quantity_kg` from every active batch in proportion to what
    /// it holds, so the weighted average is left where it was.
    ///
    /// Used for count corrections, which are valued at the average rather
    /// than at the oldest lot.
    ///
    /// # Errors
    ///
    /// `InsufficientStock` when the aggregate holds less than requested.
    pub fn consume_pro_rata(
        uow: &mut UnitOfWork<'_>,
        crop_id: CropId,
        quantity_kg: Decimal,
        consumer_kind: ConsumerKind,
        consumer_id: Uuid,
        consumed_on: NaiveDate,
    ) -> KernelResult<ConsumptionPlan> {
        let target = Target {
            crop_id,
            consumer_kind,
            consumer_id,
            consumed_on,
        };
        Self::draw(uow, &target, quantity_kg, Draw::ProRata)
    }

    fn draw(
        uow: &mut UnitOfWork<'_>,
        target: &Target,
        quantity_kg: Decimal,
        draw: Draw,
    ) -> KernelResult<ConsumptionPlan> {
        let crop_id = target.crop_id;
        if quantity_kg <= Decimal::ZERO {
            return Err(KernelError::validation(
                "quantity_kg",
                "outbound quantity must be positive",
            ));
        }
        let quantity_kg = round_internal(quantity_kg);
        let mut inventory = uow.book().inventory(crop_id)?.clone();
        if inventory.net_stock_kg < quantity_kg {
            return Err(KernelError::InsufficientStock {
                crop_id,
                requested: quantity_kg,
                available: inventory.net_stock_kg,
            });
        }

        let batches = Self::fifo_batches(uow.book(), crop_id);
        let takes = match draw {
            Draw::Fifo => fifo_takes(&batches, quantity_kg),
            Draw::ProRata => pro_rata_takes(&batches, quantity_kg),
        };
        let mut left = quantity_kg;
        let mut slices = Vec::new();
        for (mut batch, take) in batches.into_iter().zip(takes) {
            if take <= Decimal::ZERO {
                continue;
            }
            batch.remaining_qty -= take;
            if is_effectively_zero(batch.remaining_qty) {
                batch.remaining_qty = Decimal::ZERO;
                batch.is_active = false;
            }
            left -= take;

            let slice = ConsumptionSlice {
                batch_id: batch.id,
                quantity_kg: take,
                cost_per_kg: batch.cost_per_kg,
            };
            debug!(
                batch_id = %batch.id,
                quantity = %take,
                cost_per_kg = %batch.cost_per_kg,
                ?draw,
                "slice taken"
            );
            uow.upsert(Row::Batch(batch));
            uow.upsert(Row::Consumption(StockConsumption {
                id: ConsumptionId::new(),
                consumer_kind: target.consumer_kind,
                consumer_id: target.consumer_id,
                batch_id: slice.batch_id,
                quantity_kg: take,
                cost_per_kg: slice.cost_per_kg,
                consumed_on: target.consumed_on,
            }));
            slices.push(slice);
        }
        if left > QUANTITY_EPSILON {
            return Err(KernelError::IntegrityViolation(format!(
                "crop {crop_id} aggregate shows {} kg but batches are short by {left} kg",
                inventory.net_stock_kg
            )));
        }

        Self::shift_net(&mut inventory, -quantity_kg);
        inventory.average_cost_per_kg = Self::batch_average(uow.book(), crop_id);
        inventory.updated_at = uow.now();
        uow.upsert(Row::Inventory(inventory));

        let total_cost = round_internal(slices.iter().map(ConsumptionSlice::cost).sum());
        Ok(ConsumptionPlan { slices, total_cost })
    }

    /// Puts back every slice taken by one consuming event and deletes the
    /// slice records. Returns the restored quantity and cost.
    pub fn restore_consumption(
        uow: &mut UnitOfWork<'_>,
        consumer_kind: ConsumerKind,
        consumer_id: Uuid,
    ) -> KernelResult<(Decimal, Decimal)> {
        let slices: Vec<StockConsumption> =
            Self::consumptions_of(uow.book(), consumer_kind, consumer_id)
                .cloned()
                .collect();
        let mut restored_qty = Decimal::ZERO;
        let mut restored_cost = Decimal::ZERO;
        let mut crops = Vec::new();
        for slice in slices {
            let mut batch = uow.book().batch(slice.batch_id).map_err(|_| {
                KernelError::IntegrityViolation(format!(
                    "consumption {} points at missing batch {}",
                    slice.id, slice.batch_id
                ))
            })?.clone();
            batch.remaining_qty += slice.quantity_kg;
            batch.is_active = true;
            let crop_id = batch.crop_id;
            uow.upsert(Row::Batch(batch));
            uow.remove(&RowKey::Consumption(slice.id));

            let mut inventory = uow.book().inventory(crop_id)?.clone();
            Self::shift_net(&mut inventory, slice.quantity_kg);
            uow.upsert(Row::Inventory(inventory));
            if !crops.contains(&crop_id) {
                crops.push(crop_id);
            }
            restored_qty += slice.quantity_kg;
            restored_cost += slice.quantity_kg * slice.cost_per_kg;
        }
        for crop_id in crops {
            Self::refresh_average(uow, crop_id)?;
        }
        Ok((restored_qty, round_internal(restored_cost)))
    }

    /// Moves the physical counters; both are floored at zero.
    pub fn adjust_physical(
        uow: &mut UnitOfWork<'_>,
        crop_id: CropId,
        gross_delta_kg: Decimal,
        bags_delta: i64,
    ) -> KernelResult<()> {
        let mut inventory = uow.book().inventory(crop_id)?.clone();
        inventory.gross_stock_kg = (inventory.gross_stock_kg + gross_delta_kg).max(Decimal::ZERO);
        inventory.bag_count = (inventory.bag_count + bags_delta).max(0);
        inventory.updated_at = uow.now();
        uow.upsert(Row::Inventory(inventory));
        Ok(())
    }

    /// Takes quantity out of one batch in place (purchase return).
    ///
    /// # Errors
    ///
    /// `InsufficientStock` when the batch holds less than requested.
    pub fn reduce_batch(
        uow: &mut UnitOfWork<'_>,
        batch_id: BatchId,
        quantity_kg: Decimal,
    ) -> KernelResult<InventoryBatch> {
        let mut batch = uow.book().batch(batch_id)?.clone();
        if batch.remaining_qty + QUANTITY_EPSILON < quantity_kg {
            return Err(KernelError::InsufficientStock {
                crop_id: batch.crop_id,
                requested: quantity_kg,
                available: batch.remaining_qty,
            });
        }
        let taken = quantity_kg.min(batch.remaining_qty);
        batch.remaining_qty -= taken;
        if is_effectively_zero(batch.remaining_qty) {
            batch.remaining_qty = Decimal::ZERO;
            batch.is_active = false;
        }
        uow.upsert(Row::Batch(batch.clone()));

        let mut inventory = uow.book().inventory(batch.crop_id)?.clone();
        Self::shift_net(&mut inventory, -taken);
        uow.upsert(Row::Inventory(inventory));
        Self::refresh_average(uow, batch.crop_id)?;
        Ok(batch)
    }

    /// Gives quantity back to one batch (undo of [`Self::reduce_batch`]).
    pub fn restore_batch(
        uow: &mut UnitOfWork<'_>,
        batch_id: BatchId,
        quantity_kg: Decimal,
    ) -> KernelResult<InventoryBatch> {
        let mut batch = uow.book().batch(batch_id)?.clone();
        if batch.remaining_qty + quantity_kg > batch.original_qty + QUANTITY_EPSILON {
            return Err(KernelError::IntegrityViolation(format!(
                "restoring {quantity_kg} kg would overfill batch {batch_id}"
            )));
        }
        batch.remaining_qty += quantity_kg;
        batch.is_active = batch.remaining_qty > QUANTITY_EPSILON;
        uow.upsert(Row::Batch(batch.clone()));

        let mut inventory = uow.book().inventory(batch.crop_id)?.clone();
        Self::shift_net(&mut inventory, quantity_kg);
        uow.upsert(Row::Inventory(inventory));
        Self::refresh_average(uow, batch.crop_id)?;
        Ok(batch)
    }

    /// Removes a batch created by an inbound event that is being undone.
    ///
    /// # Errors
    ///
    /// `CascadeRequired` when any quantity has left the batch.
    pub fn remove_batch(
        uow: &mut UnitOfWork<'_>,
        batch_id: BatchId,
        entity: &'static str,
        event_id: Uuid,
    ) -> KernelResult<InventoryBatch> {
        let batch = uow.book().batch(batch_id)?.clone();
        if !batch.is_untouched() {
            return Err(KernelError::CascadeRequired {
                entity,
                id: event_id.to_string(),
                reason: format!(
                    "batch {batch_id} has {} of {} kg left; downstream events consumed the rest",
                    batch.remaining_qty, batch.original_qty
                ),
            });
        }
        uow.remove(&RowKey::Batch(batch_id));

        let mut inventory = uow.book().inventory(batch.crop_id)?.clone();
        Self::shift_net(&mut inventory, -batch.remaining_qty);
        uow.upsert(Row::Inventory(inventory));
        Self::refresh_average(uow, batch.crop_id)?;
        Ok(batch)
    }

    /// Active batches of a crop in FIFO order.
    #[must_use]
    pub fn fifo_batches(book: &Book, crop_id: CropId) -> Vec<InventoryBatch> {
        let mut batches: Vec<InventoryBatch> = book
            .batches()
            .filter(|b| b.crop_id == crop_id && b.is_active)
            .cloned()
            .collect();
        batches.sort_by_key(InventoryBatch::fifo_key);
        batches
    }

    /// Slices recorded for one consuming event.
    pub fn consumptions_of(
        book: &Book,
        consumer_kind: ConsumerKind,
        consumer_id: Uuid,
    ) -> impl Iterator<Item = &StockConsumption> {
        book.consumptions()
            .filter(move |c| c.consumer_kind == consumer_kind && c.consumer_id == consumer_id)
    }

    /// Weighted-average cost over active batches, rounded to 4 dp.
    #[must_use]
    pub fn batch_average(book: &Book, crop_id: CropId) -> Decimal {
        let (qty, value) = book
            .batches()
            .filter(|b| b.crop_id == crop_id && b.is_active)
            .fold((Decimal::ZERO, Decimal::ZERO), |(q, v), b| {
                (q + b.remaining_qty, v + b.remaining_qty * b.cost_per_kg)
            });
        if qty > Decimal::ZERO {
            round_internal(value / qty)
        } else {
            Decimal::ZERO
        }
    }

    /// Recomputes the aggregate average from the batches.
    pub fn refresh_average(uow: &mut UnitOfWork<'_>, crop_id: CropId) -> KernelResult<()> {
        let mut inventory = uow.book().inventory(crop_id)?.clone();
        inventory.average_cost_per_kg = Self::batch_average(uow.book(), crop_id);
        inventory.updated_at = uow.now();
        uow.upsert(Row::Inventory(inventory));
        Ok(())
    }

    /// Checks the aggregate of one crop against its batches.
    pub fn verify(book: &Book, crop_id: CropId) -> KernelResult<InventoryCheck> {
        let inventory = book.inventory(crop_id)?;
        let active: Vec<&InventoryBatch> = book
            .batches()
            .filter(|b| b.crop_id == crop_id && b.is_active)
            .collect();
        let batch_stock: Decimal = active.iter().map(|b| b.remaining_qty).sum();
        let batch_average = Self::batch_average(book, crop_id);

        let mut problems = Vec::new();
        // One epsilon of drift per batch can come from snapping drained batches to zero.
        let lots = book.batches().filter(|b| b.crop_id == crop_id).count().max(1);
        let stock_tolerance = QUANTITY_EPSILON * Decimal::from(lots);
        if !approx_eq(inventory.net_stock_kg, batch_stock, stock_tolerance) {
            problems.push(format!(
                "net stock {} kg differs from active batches {} kg",
                inventory.net_stock_kg, batch_stock
            ));
        }
        if !approx_eq(inventory.average_cost_per_kg, batch_average, Decimal::new(1, 2)) {
            problems.push(format!(
                "average cost {} differs from batch average {}",
                inventory.average_cost_per_kg, batch_average
            ));
        }
        if inventory.net_stock_kg < Decimal::ZERO {
            problems.push(format!("net stock is negative: {}", inventory.net_stock_kg));
        }
        if let Some(bad) = active.iter().find(|b| b.remaining_qty > b.original_qty) {
            problems.push(format!("batch {} holds more than it started with", bad.id));
        }

        Ok(InventoryCheck {
            crop_id,
            net_stock_kg: inventory.net_stock_kg,
            batch_stock_kg: batch_stock,
            average_cost_per_kg: inventory.average_cost_per_kg,
            batch_average_cost_per_kg: batch_average,
            consistent: problems.is_empty(),
            problems,
        })
    }

    /// Active crops whose net stock is below their threshold.
    #[must_use]
    pub fn low_stock_alerts(book: &Book) -> Vec<LowStockAlert> {
        book.crops()
            .filter(|crop| crop.is_active)
            .filter_map(|crop| {
                let inventory = book.inventory(crop.id).ok()?;
                (inventory.net_stock_kg < inventory.low_stock_threshold_kg).then(|| LowStockAlert {
                    crop_id: crop.id,
                    crop_name: crop.name.clone(),
                    net_stock_kg: inventory.net_stock_kg,
                    threshold_kg: inventory.low_stock_threshold_kg,
                })
            })
            .collect()
    }

    fn shift_net(inventory: &mut Inventory, delta: Decimal) {
        inventory.net_stock_kg += delta;
        inventory.current_stock_kg += delta;
        if is_effectively_zero(inventory.net_stock_kg) {
            inventory.net_stock_kg = Decimal::ZERO;
        }
        if is_effectively_zero(inventory.current_stock_kg) {
            inventory.current_stock_kg = Decimal::ZERO;
        }
    }
}

/// Which batches an outbound draw takes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Draw {
    Fifo,
    ProRata,
}

/// The event a draw is recorded against.
struct Target {
    crop_id: CropId,
    consumer_kind: ConsumerKind,
    consumer_id: Uuid,
    consumed_on: NaiveDate,
}

/// Oldest batches first until `quantity` is covered.
fn fifo_takes(batches: &[InventoryBatch], quantity: Decimal) -> Vec<Decimal> {
    let mut left = quantity;
    batches
        .iter()
        .map(|batch| {
            let take = batch.remaining_qty.min(left).max(Decimal::ZERO);
            left -= take;
            take
        })
        .collect()
}

/// Each batch's share of `quantity` by remaining weight. Rounding leftovers
/// are then taken FIFO from whatever room is still in the batches.
fn pro_rata_takes(batches: &[InventoryBatch], quantity: Decimal) -> Vec<Decimal> {
    let held: Decimal = batches.iter().map(|b| b.remaining_qty).sum();
    if held <= Decimal::ZERO {
        return vec![Decimal::ZERO; batches.len()];
    }
    let mut takes: Vec<Decimal> = batches
        .iter()
        .map(|b| round_internal(quantity * b.remaining_qty / held).min(b.remaining_qty))
        .collect();
    let mut left = quantity - takes.iter().copied().sum::<Decimal>();
    if left < Decimal::ZERO {
        // shares rounded up past the request; trim from the newest
        for take in takes.iter_mut().rev() {
            let trim = (*take).min(-left);
            *take -= trim;
            left += trim;
            if left >= Decimal::ZERO {
                break;
            }
        }
    }
    for (take, batch) in takes.iter_mut().zip(batches) {
        if left <= Decimal::ZERO {
            break;
        }
        let extra = (batch.remaining_qty - *take).min(left);
        *take += extra;
        left -= extra;
    }
    takes
}
