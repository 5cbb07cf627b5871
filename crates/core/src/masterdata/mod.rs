//! Crops and contacts, and how they leave the book.

pub mod contact;
pub mod crop;
mod force;

#[cfg(test)]
mod tests;

pub use contact::ContactService;
pub use crop::{CropRequest, CropService};

use serde::{Deserialize, Serialize};

/// How a crop or contact with dependent events is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeleteMode<Id> {
    /// Refuse when any event references the entity.
    Restrict,
    /// Re-point every referencing event at another entity, then delete.
    MigrateTo(Id),
    /// Delete every dependent event through its normal delete path first.
    Force,
}
