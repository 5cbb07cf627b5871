//! `SeaORM` entities, one module per kernel table.
//!
//! Money and quantity columns are `NUMERIC(19, 4)`; calendar dates are
//! `DATE`; enum columns hold the kernel's wire names as text.

pub mod prelude;

pub mod audit_logs;
pub mod capital_allocations;
pub mod contacts;
pub mod crops;
pub mod expenses;
pub mod financial_accounts;
pub mod inventories;
pub mod inventory_adjustments;
pub mod inventory_batches;
pub mod ledger_entries;
pub mod payments;
pub mod purchase_returns;
pub mod purchases;
pub mod sale_returns;
pub mod sales;
pub mod seasons;
pub mod settings;
pub mod stock_consumptions;
pub mod transformations;
