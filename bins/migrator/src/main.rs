//! Database migration runner for Granary.
//!
//! Usage:
//!   migrator up      - Create the bookkeeping tables
//!   migrator down    - Drop them again
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop all tables and re-run migrations

use granary_db::migration::Migrator;
use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // reads DATABASE_URL and sets up its own tracing
    cli::run_cli(Migrator).await;
}
