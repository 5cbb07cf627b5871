//! In-memory book and units of work.
//!
//! The [`Book`] holds every table. All mutations go through a
//! [`UnitOfWork`], which keeps an undo log so that a failed or abandoned
//! operation leaves the book exactly as it found it, and a forward change
//! journal that persistence adapters replay inside their own transaction.

pub mod book;
pub mod uow;

pub use book::{Book, Row, RowKey};
pub use uow::{Change, ChangeSet, UnitOfWork};
