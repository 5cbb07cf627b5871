//! Chart of accounts.
//!
//! Accounts carry a kind that fixes their normal side. The running balance
//! is only ever moved by the ledger engine.

pub mod chart;
pub mod service;
pub mod types;

pub use chart::{DefaultAccount, default_chart};
pub use service::AccountService;
pub use types::{AccountKind, FinancialAccount, NewAccount, NormalSide};

#[cfg(test)]
mod tests;
