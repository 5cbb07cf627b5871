//! Double-entry ledger engine.
//!
//! - Ledger legs and source kinds
//! - Leg validation (sides, accounts, balance)
//! - Posting with running-balance updates
//! - Reversal by compensating legs
//! - Balances derived from legs

pub mod balance;
pub mod entry;
pub mod service;
pub mod validation;

#[cfg(test)]
mod service_props;
#[cfg(test)]
mod validation_props;

pub use balance::{AccountBalance, balance_from_legs};
pub use entry::{EventKind, LedgerEntry, SourceKind};
pub use service::LedgerService;
pub use validation::{PostingLeg, PostingTotals, validate_legs};
