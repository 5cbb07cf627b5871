//! Event composers.
//!
//! Each composer turns one business event into its inventory effect and
//! its balanced posting groups inside the caller's unit of work. Deletes
//! and updates reverse what the composer wrote, dated on the original
//! event date, and refuse when downstream FIFO consumption depends on it.

pub mod adjustment;
pub mod capital;
pub mod cash;
mod common;
pub mod journal;
pub mod payment;
pub mod purchase;
pub mod returns;
pub mod sale;
pub mod stock;
pub mod types;

#[cfg(test)]
mod tests;

pub use adjustment::AdjustmentService;
pub use capital::CapitalService;
pub use cash::CashService;
pub use journal::JournalService;
pub use payment::PaymentService;
pub use purchase::PurchaseService;
pub use returns::ReturnService;
pub use sale::SaleService;
pub use stock::StockService;
pub use types::{
    AdjustmentRequest, AdjustmentType, CapitalAllocation, CapitalRequest, CapitalType, Expense,
    ExpenseRequest, ExpenseSource, InventoryAdjustment, JournalRequest, OpeningStockRequest,
    Payment, PaymentOrigin, PaymentRequest, PaymentStatus, Purchase, PurchaseRequest,
    PurchaseReturn, PurchaseReturnRequest, QuantityInput, QuickCashRequest, Sale, SaleRequest,
    SaleReturn, SaleReturnRequest, TransactionType, TransformRequest, Transformation,
};
