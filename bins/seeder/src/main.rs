//! Database seeder for Granary development and testing.
//!
//! Opens the book (bootstrapping the chart of accounts and the settings
//! registry on an empty database), then adds a few demo crops and
//! contacts. Rows that already exist by name are skipped, so the seeder can
//! be run repeatedly.
//!
//! Usage: cargo run --bin seeder

use std::collections::BTreeMap;

use anyhow::Context;
use granary_core::contacts::ContactRequest;
use granary_core::masterdata::{ContactService, CropRequest, CropService};
use granary_db::KernelStore;
use granary_shared::config::AppConfig;
use granary_shared::types::UserId;
use rust_decimal::Decimal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Demo crops: name, complex-unit trading, custom unit factors.
const CROPS: &[(&str, bool, &[(&str, i64)])] = &[
    ("Wheat", false, &[]),
    ("Corn", false, &[("ardeb", 140)]),
    ("Cotton", true, &[]),
];

/// Demo contacts: name, supplier, customer.
const CONTACTS: &[(&str, bool, bool)] = &[
    ("Delta Growers", true, false),
    ("Cairo Mills", false, true),
    ("Nile Traders", true, true),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "granary=debug,sea_orm=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let db = granary_db::connect_with(&config.database).await?;
    info!("Connected to database");

    let user = UserId::new();
    let store = KernelStore::open(db, user, &config.kernel).await?;

    seed_crops(&store, user).await?;
    seed_contacts(&store, user).await?;

    let rows = store.read(granary_core::store::Book::row_count).await;
    info!(rows, "Seeding complete");
    Ok(())
}

async fn seed_crops(store: &KernelStore, user: UserId) -> anyhow::Result<()> {
    for (name, complex, factors) in CROPS {
        let exists = store
            .read(|book| book.crops().any(|c| c.name.eq_ignore_ascii_case(name)))
            .await;
        if exists {
            info!(crop = name, "crop already exists, skipping");
            continue;
        }
        let conversion_factors: BTreeMap<String, Decimal> = factors
            .iter()
            .map(|(unit, kg)| ((*unit).to_string(), Decimal::from(*kg)))
            .collect();
        let req = CropRequest {
            name: (*name).to_string(),
            pricing_units: conversion_factors.keys().cloned().collect(),
            conversion_factors,
            is_complex_unit: *complex,
            ..CropRequest::default()
        };
        let crop = store
            .execute(user, |uow| CropService::create(uow, req))
            .await
            .with_context(|| format!("failed to seed crop {name}"))?;
        info!(crop = %crop.name, id = %crop.id, "created crop");
    }
    Ok(())
}

async fn seed_contacts(store: &KernelStore, user: UserId) -> anyhow::Result<()> {
    for (name, supplier, customer) in CONTACTS {
        let exists = store
            .read(|book| book.contacts().any(|c| c.name.eq_ignore_ascii_case(name)))
            .await;
        if exists {
            info!(contact = name, "contact already exists, skipping");
            continue;
        }
        let req = ContactRequest {
            name: (*name).to_string(),
            is_supplier: *supplier,
            is_customer: *customer,
            ..ContactRequest::default()
        };
        let contact = store
            .execute(user, |uow| ContactService::create(uow, req))
            .await
            .with_context(|| format!("failed to seed contact {name}"))?;
        info!(contact = %contact.name, id = %contact.id, "created contact");
    }
    Ok(())
}
