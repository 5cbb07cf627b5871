//! Kernel error taxonomy.
//!
//! Every error fails the surrounding unit of work. Boundary adapters map
//! them to protocol codes through [`KernelError::error_code`] and
//! [`KernelError::http_status_code`].

use granary_shared::types::{AccountId, CropId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Result type alias using `KernelError`.
pub type KernelResult<T> = Result<T, KernelError>;

/// Errors raised by kernel operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KernelError {
    /// A request field is missing, malformed, or out of range.
    #[error("Validation error on `{field}`: {message}")]
    Validation {
        /// The offending field.
        field: String,
        /// Human readable reason.
        message: String,
    },

    /// An entity referenced by id does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind.
        entity: &'static str,
        /// The id that was looked up.
        id: String,
    },

    /// The target account exists but is inactive.
    #[error("Account {0} is inactive")]
    InactiveAccount(AccountId),

    /// Posting legs do not balance within the tolerance.
    #[error("Posting is not balanced. Debit: {debit}, Credit: {credit}")]
    Unbalanced {
        /// Total debit.
        debit: Decimal,
        /// Total credit.
        credit: Decimal,
    },

    /// Outbound demand exceeds the available stock.
    #[error("Insufficient stock for {crop_id}: requested {requested} kg, available {available} kg")]
    InsufficientStock {
        /// The crop.
        crop_id: CropId,
        /// Requested quantity in kg.
        requested: Decimal,
        /// Available quantity in kg.
        available: Decimal,
    },

    /// A withdrawal exceeds the owner equity balance.
    #[error("Insufficient equity: requested {requested}, available {available}")]
    InsufficientEquity {
        /// Requested withdrawal.
        requested: Decimal,
        /// Owner equity balance.
        available: Decimal,
    },

    /// Deletion refused because dependents exist.
    #[error("Cannot delete {entity} {id}: {dependents}")]
    DependencyConflict {
        /// Entity kind.
        entity: &'static str,
        /// Entity id.
        id: String,
        /// Description of the dependents.
        dependents: String,
    },

    /// Reversal refused because downstream FIFO consumption already drained the stock.
    #[error("Cannot reverse {entity} {id}: {reason}")]
    CascadeRequired {
        /// Entity kind.
        entity: &'static str,
        /// Entity id.
        id: String,
        /// Why the cascade is needed.
        reason: String,
    },

    /// An upstream invariant is broken (duplicate, dangling reference).
    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),
}

impl KernelError {
    /// Builds a validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Builds a not-found error.
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::InactiveAccount(_) => "INACTIVE_ACCOUNT",
            Self::Unbalanced { .. } => "UNBALANCED",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::InsufficientEquity { .. } => "INSUFFICIENT_EQUITY",
            Self::DependencyConflict { .. } => "DEPENDENCY_CONFLICT",
            Self::CascadeRequired { .. } => "CASCADE_REQUIRED",
            Self::IntegrityViolation(_) => "INTEGRITY_VIOLATION",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } | Self::InactiveAccount(_) | Self::Unbalanced { .. } => 400,
            Self::NotFound { .. } => 404,
            Self::DependencyConflict { .. }
            | Self::CascadeRequired { .. }
            | Self::IntegrityViolation(_) => 409,
            Self::InsufficientStock { .. } | Self::InsufficientEquity { .. } => 422,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            KernelError::validation("amount", "must be positive").error_code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(KernelError::not_found("Crop", "x").error_code(), "NOT_FOUND");
        assert_eq!(
            KernelError::Unbalanced {
                debit: dec!(100),
                credit: dec!(50),
            }
            .error_code(),
            "UNBALANCED"
        );
        assert_eq!(
            KernelError::CascadeRequired {
                entity: "Purchase",
                id: "1".into(),
                reason: "consumed".into(),
            }
            .error_code(),
            "CASCADE_REQUIRED"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(KernelError::validation("x", "y").http_status_code(), 400);
        assert_eq!(KernelError::not_found("Sale", "1").http_status_code(), 404);
        assert_eq!(
            KernelError::IntegrityViolation("dup".into()).http_status_code(),
            409
        );
        assert_eq!(
            KernelError::InsufficientEquity {
                requested: dec!(12000),
                available: dec!(10000),
            }
            .http_status_code(),
            422
        );
    }

    #[test]
    fn test_error_display() {
        let err = KernelError::Unbalanced {
            debit: dec!(100.00),
            credit: dec!(50.00),
        };
        assert_eq!(
            err.to_string(),
            "Posting is not balanced. Debit: 100.00, Credit: 50.00"
        );
        assert_eq!(
            KernelError::validation("name", "must not be empty").to_string(),
            "Validation error on `name`: must not be empty"
        );
    }
}
