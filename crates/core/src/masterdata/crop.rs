//! Crop master data.

use std::collections::BTreeMap;

use granary_shared::types::CropId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::DeleteMode;
use super::force;
use crate::audit::{AuditAction, snapshot};
use crate::error::{KernelError, KernelResult};
use crate::events::{AdjustmentService, StockService};
use crate::inventory::{BatchOrigin, Crop, Inventory, InventoryEngine};
use crate::settings::{SettingsService, Tunable};
use crate::store::{Book, Row, RowKey, UnitOfWork};

const ENTITY: &str = "Crop";

/// Input for creating or updating a crop.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CropRequest {
    /// Unique display name.
    pub name: String,
    /// Units the crop is priced in.
    pub pricing_units: Vec<String>,
    /// Unit-to-kg factors.
    pub conversion_factors: BTreeMap<String, Decimal>,
    /// Traded by gross weight and bag count.
    pub is_complex_unit: bool,
    /// Default tare per bag in kg.
    pub default_tare_per_bag: Decimal,
    /// Nominal unit weight in kg.
    pub standard_unit_weight: Option<Decimal>,
    /// Low-stock threshold; defaults to `LOW_STOCK_THRESHOLD_KG`.
    pub low_stock_threshold_kg: Option<Decimal>,
}

/// Creates, edits and deletes crops.
pub struct CropService;

impl CropService {
    /// Creates a crop and its empty stock aggregate.
    ///
    /// # Errors
    ///
    /// `IntegrityViolation` when another crop has the same name.
    pub fn create(uow: &mut UnitOfWork<'_>, req: CropRequest) -> KernelResult<Crop> {
        let name = Self::check(uow.book(), &req, None)?;
        let threshold = match req.low_stock_threshold_kg {
            Some(threshold) => threshold,
            None => SettingsService::tunable_decimal(
                uow.book(),
                Tunable::LowStockThresholdKg,
                Decimal::ONE_HUNDRED,
            ),
        };
        let crop = Crop {
            id: CropId::new(),
            name,
            pricing_units: req.pricing_units,
            conversion_factors: req.conversion_factors,
            is_active: true,
            is_complex_unit: req.is_complex_unit,
            default_tare_per_bag: req.default_tare_per_bag,
            standard_unit_weight: req.standard_unit_weight,
            created_at: uow.now(),
        };
        let mut inventory = Inventory::empty(crop.id, threshold);
        inventory.updated_at = uow.now();
        uow.upsert(Row::Crop(crop.clone()));
        uow.upsert(Row::Inventory(inventory));
        uow.audit(
            AuditAction::Create,
            ENTITY,
            crop.id.into_inner(),
            None,
            snapshot(&crop),
        );
        info!(crop_id = %crop.id, name = %crop.name, "crop created");
        Ok(crop)
    }

    /// Replaces a crop's attributes; batches keep their cost.
    pub fn update(
        uow: &mut UnitOfWork<'_>,
        crop_id: CropId,
        req: CropRequest,
    ) -> KernelResult<Crop> {
        let before = uow.book().crop(crop_id)?.clone();
        let name = Self::check(uow.book(), &req, Some(crop_id))?;
        let crop = Crop {
            name,
            pricing_units: req.pricing_units,
            conversion_factors: req.conversion_factors,
            is_complex_unit: req.is_complex_unit,
            default_tare_per_bag: req.default_tare_per_bag,
            standard_unit_weight: req.standard_unit_weight,
            ..before.clone()
        };
        if let Some(threshold) = req.low_stock_threshold_kg {
            let mut inventory = uow.book().inventory(crop_id)?.clone();
            inventory.low_stock_threshold_kg = threshold;
            uow.upsert(Row::Inventory(inventory));
        }
        uow.upsert(Row::Crop(crop.clone()));
        uow.audit(
            AuditAction::Update,
            ENTITY,
            crop_id.into_inner(),
            snapshot(&before),
            snapshot(&crop),
        );
        Ok(crop)
    }

    /// Hides or shows a crop for new events.
    pub fn set_active(
        uow: &mut UnitOfWork<'_>,
        crop_id: CropId,
        active: bool,
    ) -> KernelResult<Crop> {
        let before = uow.book().crop(crop_id)?.clone();
        let crop = Crop {
            is_active: active,
            ..before.clone()
        };
        uow.upsert(Row::Crop(crop.clone()));
        uow.audit(
            AuditAction::Update,
            ENTITY,
            crop_id.into_inner(),
            snapshot(&before),
            snapshot(&crop),
        );
        Ok(crop)
    }

    /// Deletes a crop and its stock aggregate.
    ///
    /// # Errors
    ///
    /// - `DependencyConflict` under `Restrict` when events reference the crop
    /// - `CascadeRequired` under `Force` when a dependent event cannot be undone
    pub fn delete(
        uow: &mut UnitOfWork<'_>,
        crop_id: CropId,
        mode: DeleteMode<CropId>,
    ) -> KernelResult<()> {
        let crop = uow.book().crop(crop_id)?.clone();
        match mode {
            DeleteMode::Restrict => {
                let dependents = Self::dependents(uow.book(), crop_id);
                if !dependents.is_empty() {
                    return Err(KernelError::DependencyConflict {
                        entity: ENTITY,
                        id: crop_id.to_string(),
                        dependents: dependents.join(", "),
                    });
                }
            }
            DeleteMode::MigrateTo(target) => Self::migrate(uow, crop_id, target)?,
            DeleteMode::Force => Self::force(uow, crop_id)?,
        }

        if uow.book().batches().any(|b| b.crop_id == crop_id) {
            return Err(KernelError::IntegrityViolation(format!(
                "crop {crop_id} still holds batches"
            )));
        }
        uow.remove(&RowKey::Inventory(crop_id));
        uow.remove(&RowKey::Crop(crop_id));
        uow.audit(
            AuditAction::Delete,
            ENTITY,
            crop_id.into_inner(),
            snapshot(&crop),
            None,
        );
        info!(%crop_id, name = %crop.name, "crop deleted");
        Ok(())
    }

    fn check(book: &Book, req: &CropRequest, own: Option<CropId>) -> KernelResult<String> {
        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(KernelError::validation("name", "crop name is required"));
        }
        if req.default_tare_per_bag < Decimal::ZERO {
            return Err(KernelError::validation(
                "default_tare_per_bag",
                "tare must not be negative",
            ));
        }
        if let Some((unit, _)) = req
            .conversion_factors
            .iter()
            .find(|(_, factor)| **factor <= Decimal::ZERO)
        {
            return Err(KernelError::validation(
                "conversion_factors",
                format!("factor for `{unit}` must be positive"),
            ));
        }
        if book
            .crops()
            .any(|c| Some(c.id) != own && c.name.eq_ignore_ascii_case(&name))
        {
            return Err(KernelError::IntegrityViolation(format!(
                "crop `{name}` already exists"
            )));
        }
        Ok(name)
    }

    fn dependents(book: &Book, crop_id: CropId) -> Vec<String> {
        let counts = [
            ("purchases", book.purchases().filter(|p| p.crop_id == crop_id).count()),
            ("sales", book.sales().filter(|s| s.crop_id == crop_id).count()),
            (
                "adjustments",
                book.adjustments().filter(|a| a.crop_id == crop_id).count(),
            ),
            (
                "transformations",
                book.transformations()
                    .filter(|t| t.input_crop_id == crop_id || t.output_crop_id == crop_id)
                    .count(),
            ),
            ("batches", book.batches().filter(|b| b.crop_id == crop_id).count()),
        ];
        counts
            .into_iter()
            .filter(|(_, n)| *n > 0)
            .map(|(what, n)| format!("{n} {what}"))
            .collect()
    }

    fn migrate(uow: &mut UnitOfWork<'_>, crop_id: CropId, target: CropId) -> KernelResult<()> {
        if target == crop_id {
            return Err(KernelError::validation(
                "target",
                "cannot migrate a crop onto itself",
            ));
        }
        uow.book().crop(target)?;

        let purchases: Vec<_> =
            uow.book().purchases().filter(|p| p.crop_id == crop_id).cloned().collect();
        for mut purchase in purchases {
            purchase.crop_id = target;
            uow.upsert(Row::Purchase(purchase));
        }
        let sales: Vec<_> = uow.book().sales().filter(|s| s.crop_id == crop_id).cloned().collect();
        for mut sale in sales {
            sale.crop_id = target;
            uow.upsert(Row::Sale(sale));
        }
        let adjustments: Vec<_> = uow
            .book()
            .adjustments()
            .filter(|a| a.crop_id == crop_id)
            .cloned()
            .collect();
        for mut adjustment in adjustments {
            adjustment.crop_id = target;
            uow.upsert(Row::Adjustment(adjustment));
        }
        let transformations: Vec<_> = uow
            .book()
            .transformations()
            .filter(|t| t.input_crop_id == crop_id || t.output_crop_id == crop_id)
            .cloned()
            .collect();
        for mut transformation in transformations {
            if transformation.input_crop_id == crop_id {
                transformation.input_crop_id = target;
            }
            if transformation.output_crop_id == crop_id {
                transformation.output_crop_id = target;
            }
            uow.upsert(Row::Transformation(transformation));
        }
        let batches: Vec<_> =
            uow.book().batches().filter(|b| b.crop_id == crop_id).cloned().collect();
        let moved = batches.len();
        for mut batch in batches {
            batch.crop_id = target;
            uow.upsert(Row::Batch(batch));
        }

        let source = uow.book().inventory(crop_id)?.clone();
        let mut merged = uow.book().inventory(target)?.clone();
        merged.net_stock_kg += source.net_stock_kg;
        merged.current_stock_kg += source.current_stock_kg;
        merged.gross_stock_kg += source.gross_stock_kg;
        merged.bag_count += source.bag_count;
        uow.upsert(Row::Inventory(merged));
        InventoryEngine::refresh_average(uow, target)?;
        info!(from = %crop_id, to = %target, batches = moved, "crop migrated");
        Ok(())
    }

    fn force(uow: &mut UnitOfWork<'_>, crop_id: CropId) -> KernelResult<()> {
        let mut sales: Vec<_> = uow
            .book()
            .sales()
            .filter(|s| s.crop_id == crop_id)
            .map(|s| (s.sale_date, s.created_at, s.id))
            .collect();
        sales.sort_unstable_by(|a, b| b.cmp(a));
        for (_, _, sale_id) in sales {
            force::delete_sale(uow, sale_id)?;
        }

        let transformations: Vec<_> = uow
            .book()
            .transformations()
            .filter(|t| t.input_crop_id == crop_id || t.output_crop_id == crop_id)
            .map(|t| t.id)
            .collect();
        for transformation_id in transformations {
            StockService::delete_transformation(uow, transformation_id)?;
        }

        let adjustments: Vec<_> = uow
            .book()
            .adjustments()
            .filter(|a| a.crop_id == crop_id)
            .map(|a| a.id)
            .collect();
        for adjustment_id in adjustments {
            AdjustmentService::delete(uow, adjustment_id)?;
        }

        let purchases: Vec<_> = uow
            .book()
            .purchases()
            .filter(|p| p.crop_id == crop_id)
            .map(|p| p.id)
            .collect();
        for purchase_id in purchases {
            force::delete_purchase(uow, purchase_id)?;
        }

        let openings: Vec<_> = uow
            .book()
            .batches()
            .filter(|b| b.crop_id == crop_id && b.origin == BatchOrigin::Opening)
            .map(|b| b.id)
            .collect();
        for batch_id in openings {
            StockService::delete_opening_stock(uow, batch_id)?;
        }
        Ok(())
    }
}
