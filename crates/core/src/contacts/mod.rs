//! Contacts and their event-derived balances.
//!
//! A contact's balance is never read from the receivable or payable
//! accounts. It is rebuilt from the contact's sales, purchases, returns
//! and cash payments, the cash direction being read from which side of
//! the payment hits the cash account.

pub mod statement;
pub mod types;


pub use statement::StatementService;
pub use types::{
    Contact, ContactDebt, ContactRequest, ContactStatement, DebtSummary, StatementLine,
    StatementLineKind,
};
