//! Crop, stock aggregate and batch types.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use granary_shared::types::{BatchId, ConsumptionId, ContactId, CropId, PurchaseId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tradable crop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crop {
    /// Crop id.
    pub id: CropId,
    /// Unique display name.
    pub name: String,
    /// Units the crop is priced in.
    pub pricing_units: Vec<String>,
    /// Unit-to-kg factors; a unit listed here overrides the formula default.
    pub conversion_factors: BTreeMap<String, Decimal>,
    /// Inactive crops are hidden from new events.
    pub is_active: bool,
    /// True when the crop is traded by gross weight and bag count.
    pub is_complex_unit: bool,
    /// Default tare per bag in kg.
    pub default_tare_per_bag: Decimal,
    /// Nominal weight of one bag or unit in kg.
    pub standard_unit_weight: Option<Decimal>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Crop {
    /// Custom factor for a pricing unit, if the crop defines one.
    #[must_use]
    pub fn factor_for(&self, unit: &str) -> Option<Decimal> {
        self.conversion_factors.get(unit).copied()
    }
}

/// Per-crop stock aggregate.
///
/// `net_stock_kg` is the financial reference and always equals the sum of
/// active batch remainders. `current_stock_kg` tracks the same figure for
/// display. `gross_stock_kg` and `bag_count` are physical counters moved
/// by the event composers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    /// Owning crop.
    pub crop_id: CropId,
    /// Display stock in kg.
    pub current_stock_kg: Decimal,
    /// Financial stock in kg.
    pub net_stock_kg: Decimal,
    /// Physical stock in kg, tare included.
    pub gross_stock_kg: Decimal,
    /// Physical bag count.
    pub bag_count: i64,
    /// Weighted-average cost of the active batches.
    pub average_cost_per_kg: Decimal,
    /// Below this net stock a low-stock alert is raised.
    pub low_stock_threshold_kg: Decimal,
    /// Last mutation.
    pub updated_at: DateTime<Utc>,
}

impl Inventory {
    /// An empty aggregate.
    #[must_use]
    pub fn empty(crop_id: CropId, low_stock_threshold_kg: Decimal) -> Self {
        Self {
            crop_id,
            current_stock_kg: Decimal::ZERO,
            net_stock_kg: Decimal::ZERO,
            gross_stock_kg: Decimal::ZERO,
            bag_count: 0,
            average_cost_per_kg: Decimal::ZERO,
            low_stock_threshold_kg,
            updated_at: Utc::now(),
        }
    }

    /// Stock valuation at the average cost.
    #[must_use]
    pub fn value(&self) -> Decimal {
        self.net_stock_kg * self.average_cost_per_kg
    }
}

/// How a batch came into stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchOrigin {
    /// Bought from a supplier.
    Purchase,
    /// Returned by a customer.
    SaleReturn,
    /// Output of a transformation.
    Transformation,
    /// Opening stock.
    Opening,
    /// Counted surplus.
    Surplus,
}

impl BatchOrigin {
    /// Stable storage code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Purchase => "PURCHASE",
            Self::SaleReturn => "SALE_RETURN",
            Self::Transformation => "TRANSFORMATION",
            Self::Opening => "OPENING",
            Self::Surplus => "SURPLUS",
        }
    }
}

/// An inbound lot with an immutable cost per kg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryBatch {
    /// Batch id.
    pub id: BatchId,
    /// Crop of the lot.
    pub crop_id: CropId,
    /// Quantity at creation.
    pub original_qty: Decimal,
    /// Quantity still on hand.
    pub remaining_qty: Decimal,
    /// Fixed cost per kg.
    pub cost_per_kg: Decimal,
    /// FIFO ordering date.
    pub purchase_date: NaiveDate,
    /// Source purchase, for purchase batches.
    pub purchase_id: Option<PurchaseId>,
    /// Supplier of the lot.
    pub supplier_id: Option<ContactId>,
    /// Optional expiry.
    pub expiry_date: Option<NaiveDate>,
    /// How the lot came in.
    pub origin: BatchOrigin,
    /// Id of the event that created the batch.
    pub origin_id: Uuid,
    /// False once drained.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl InventoryBatch {
    /// True when no FIFO slice has been taken from the batch.
    #[must_use]
    pub fn is_untouched(&self) -> bool {
        self.remaining_qty == self.original_qty
    }

    /// FIFO ordering key.
    #[must_use]
    pub fn fifo_key(&self) -> (NaiveDate, BatchId) {
        (self.purchase_date, self.id)
    }
}

/// The event that consumed stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsumerKind {
    /// A sale.
    Sale,
    /// A shortage or spoilage adjustment.
    Adjustment,
    /// A transformation input.
    Transformation,
}

impl ConsumerKind {
    /// Stable storage code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sale => "SALE",
            Self::Adjustment => "ADJUSTMENT",
            Self::Transformation => "TRANSFORMATION",
        }
    }
}

/// One persisted FIFO slice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockConsumption {
    /// Slice id.
    pub id: ConsumptionId,
    /// Kind of consuming event.
    pub consumer_kind: ConsumerKind,
    /// Id of the consuming event.
    pub consumer_id: Uuid,
    /// Batch the slice was taken from.
    pub batch_id: BatchId,
    /// Quantity taken.
    pub quantity_kg: Decimal,
    /// Batch cost at the time.
    pub cost_per_kg: Decimal,
    /// Date of consumption.
    pub consumed_on: NaiveDate,
}

/// A slice taken during one FIFO run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionSlice {
    /// Batch the slice was taken from.
    pub batch_id: BatchId,
    /// Quantity taken.
    pub quantity_kg: Decimal,
    /// Batch cost per kg.
    pub cost_per_kg: Decimal,
}

impl ConsumptionSlice {
    /// Slice cost.
    #[must_use]
    pub fn cost(&self) -> Decimal {
        self.quantity_kg * self.cost_per_kg
    }
}

/// Result of a FIFO consumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionPlan {
    /// Slices in FIFO order.
    pub slices: Vec<ConsumptionSlice>,
    /// Sum of slice costs, rounded to 4 dp.
    pub total_cost: Decimal,
}

/// Physical quantities moved alongside an inbound or outbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PhysicalDelta {
    /// Gross kg.
    pub gross_kg: Decimal,
    /// Bags.
    pub bags: i64,
}

/// Result of [`crate::inventory::InventoryEngine::verify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryCheck {
    /// Crop checked.
    pub crop_id: CropId,
    /// Aggregate net stock.
    pub net_stock_kg: Decimal,
    /// Sum of active batch remainders.
    pub batch_stock_kg: Decimal,
    /// Aggregate average cost.
    pub average_cost_per_kg: Decimal,
    /// Weighted mean cost over active batches.
    pub batch_average_cost_per_kg: Decimal,
    /// True when every invariant holds.
    pub consistent: bool,
    /// Human readable problems.
    pub problems: Vec<String>,
}

/// A crop below its low-stock threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockAlert {
    /// Crop id.
    pub crop_id: CropId,
    /// Crop name.
    pub crop_name: String,
    /// Net stock.
    pub net_stock_kg: Decimal,
    /// Configured threshold.
    pub threshold_kg: Decimal,
}
