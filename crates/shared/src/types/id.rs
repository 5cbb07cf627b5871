//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `CropId` where a `ContactId` is expected.
//! All IDs are UUID v7, so ordering by ID follows creation order.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new time-ordered ID (UUID v7).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(UserId, "Unique identifier for the user performing a kernel operation.");
typed_id!(AccountId, "Unique identifier for a financial account.");
typed_id!(LedgerEntryId, "Unique identifier for a ledger leg.");
typed_id!(CropId, "Unique identifier for a crop.");
typed_id!(BatchId, "Unique identifier for an inventory batch.");
typed_id!(ContactId, "Unique identifier for a supplier and/or customer.");
typed_id!(PurchaseId, "Unique identifier for a purchase.");
typed_id!(SaleId, "Unique identifier for a sale.");
typed_id!(ConsumptionId, "Unique identifier for a FIFO consumption slice of a sale.");
typed_id!(PaymentId, "Unique identifier for a payment.");
typed_id!(SaleReturnId, "Unique identifier for a sale return.");
typed_id!(PurchaseReturnId, "Unique identifier for a purchase return.");
typed_id!(AdjustmentId, "Unique identifier for an inventory adjustment.");
typed_id!(CapitalAllocationId, "Unique identifier for a capital contribution or withdrawal.");
typed_id!(ExpenseId, "Unique identifier for an expense.");
typed_id!(TransformationId, "Unique identifier for a crop transformation.");
typed_id!(JournalId, "Unique identifier for a manual journal or opening-stock group.");
typed_id!(SeasonId, "Unique identifier for a growing season.");
typed_id!(AuditLogId, "Unique identifier for an audit log record.");
