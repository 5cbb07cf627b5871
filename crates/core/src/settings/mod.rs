//! Settings registry.
//!
//! A flat key/value map. Symbolic account roles (`CASH_ACCOUNT_ID`, ...)
//! resolve to account ids through [`SettingsResolver`], a read-through
//! cache that is invalidated whenever a unit of work commits.

pub mod resolver;
pub mod service;
pub mod types;

pub use resolver::SettingsResolver;
pub use service::SettingsService;
pub use types::{AccountRole, Setting, Tunable};

#[cfg(test)]
mod tests;
