//! Database layer for Granary.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for every kernel table
//! - The relational schema migration
//! - [`KernelStore`], which persists each unit of work in one transaction

mod codec;
pub mod entities;
pub mod error;
pub mod migration;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use store::KernelStore;

use granary_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Establishes a pooled connection sized by the configuration.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_with(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .sqlx_logging(false);
    Database::connect(options).await
}
