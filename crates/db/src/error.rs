//! Persistence errors.

use granary_core::KernelError;
use sea_orm::DbErr;
use thiserror::Error;

/// Result type alias using `StoreError`.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised while running or persisting a unit of work.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The kernel refused the operation; nothing was written.
    #[error(transparent)]
    Kernel(#[from] KernelError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// A stored row could not be turned back into a kernel row.
    #[error("Cannot decode {table}.{column}: {message}")]
    Decode {
        /// Table of the row.
        table: &'static str,
        /// Offending column.
        column: &'static str,
        /// What went wrong.
        message: String,
    },
}

impl StoreError {
    pub(crate) fn decode(
        table: &'static str,
        column: &'static str,
        message: impl ToString,
    ) -> Self {
        Self::Decode {
            table,
            column,
            message: message.to_string(),
        }
    }

    /// Stable error code, delegating to the kernel for kernel errors.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Kernel(err) => err.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
            Self::Decode { .. } => "DECODE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_code_passes_through() {
        let err = StoreError::from(KernelError::validation("amount", "must be positive"));
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert!(err.to_string().contains("amount"));
    }

    #[test]
    fn test_decode_message() {
        let err = StoreError::decode("sales", "payment_status", "unknown variant `LATE`");
        assert_eq!(err.error_code(), "DECODE_ERROR");
        assert_eq!(
            err.to_string(),
            "Cannot decode sales.payment_status: unknown variant `LATE`"
        );
    }
}
