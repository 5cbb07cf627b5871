//! Bookkeeping kernel for Granary.
//!
//! This crate contains the trading and accounting logic with ZERO web or
//! database dependencies. Every business event is composed inside a
//! [`store::UnitOfWork`] and either commits completely or leaves the book
//! untouched.
//!
//! # Modules
//!
//! - `calculation` - Complex-unit (qantar, ton, kg) quantity and price math
//! - `accounts` - Chart of accounts and normal sides
//! - `ledger` - Double-entry posting and reversal
//! - `inventory` - Weighted-average stock and FIFO batches
//! - `events` - Purchases, sales, payments, returns and the other composers
//! - `masterdata` - Crops, contacts and their delete modes
//! - `contacts` - Event-derived contact statements and debts
//! - `season` - Season tagging and closing
//! - `reports` - Trial balance, statements, dual balance, profitability
//! - `settings` - Account roles and tunables
//! - `audit` - Append-only audit log
//! - `store` - In-memory book and units of work

pub mod accounts;
pub mod audit;
pub mod calculation;
pub mod contacts;
pub mod error;
pub mod events;
pub mod inventory;
pub mod kernel;
pub mod ledger;
pub mod masterdata;
pub mod reports;
pub mod season;
pub mod settings;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{KernelError, KernelResult};
pub use kernel::{Committed, Kernel};
