//! Inventory engine.
//!
//! Each crop has one stock aggregate and any number of append-only
//! batches. Inbound events create batches and move the weighted-average
//! cost; outbound events drain batches strictly first-in first-out.

pub mod engine;
pub mod types;

#[cfg(test)]
mod engine_props;

pub use engine::{InventoryEngine, NewBatch};
pub use types::{
    BatchOrigin, ConsumerKind, ConsumptionPlan, ConsumptionSlice, Crop, Inventory, InventoryBatch,
    InventoryCheck, LowStockAlert, PhysicalDelta, StockConsumption,
};
