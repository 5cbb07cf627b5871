//! Financial report generation.
//!
//! Every report is a pure read of the book:
//! - Trial balance, income statement, balance sheet
//! - Equity statement and cash flow
//! - Dual-balance and capital-distribution checks
//! - Crop profitability, account ledger and treasury day

pub mod service;
pub mod types;


pub use service::ReportService;
pub use types::*;
