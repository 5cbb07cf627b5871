//! Database-backed kernel.
//!
//! [`KernelStore`] keeps the whole book in memory behind an async mutex,
//! so operations run one at a time. A unit of work is staged in memory,
//! its change set is written in one database transaction, and only then is
//! the in-memory unit committed. A failed write rolls the unit back.

use granary_core::kernel::Kernel;
use granary_core::store::{Book, Change, ChangeSet, Row, RowKey, UnitOfWork};
use granary_core::KernelResult;
use granary_shared::config::KernelConfig;
use granary_shared::types::UserId;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    IdenStatic, IntoActiveModel, Iterable, PrimaryKeyToColumn, TransactionTrait,
    sea_query::OnConflict,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::codec;
use crate::entities::prelude::*;
use crate::error::StoreResult;

/// A kernel whose book is mirrored in the database.
pub struct KernelStore {
    db: DatabaseConnection,
    kernel: Mutex<Kernel>,
}

impl KernelStore {
    /// Loads the book; an empty database is bootstrapped and persisted.
    ///
    /// # Errors
    ///
    /// Returns an error if the book cannot be read, decoded, or seeded.
    pub async fn open(
        db: DatabaseConnection,
        user: UserId,
        config: &KernelConfig,
    ) -> StoreResult<Self> {
        let book = load_book(&db).await?;
        let mut kernel = Kernel::new(book);
        if kernel.book().is_empty() {
            let changes = kernel.bootstrap(user, config)?;
            persist(&db, &changes).await?;
            info!(rows = changes.len(), "empty database bootstrapped");
        } else {
            info!(rows = kernel.book().row_count(), "book loaded");
        }
        Ok(Self {
            db,
            kernel: Mutex::new(kernel),
        })
    }

    /// The database connection.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Runs `op` in a unit of work and persists its changes.
    ///
    /// The kernel is locked for the whole call, including the database
    /// write.
    ///
    /// # Errors
    ///
    /// Returns the kernel error when `op` fails, or the database error when
    /// the change set cannot be written; in both cases the book is
    /// unchanged.
    pub async fn execute<T, F>(&self, user: UserId, op: F) -> StoreResult<T>
    where
        F: FnOnce(&mut UnitOfWork<'_>) -> KernelResult<T>,
    {
        let mut kernel = self.kernel.lock().await;
        let mut uow = kernel.begin(user);
        let value = match op(&mut uow) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, code = err.error_code(), "operation failed");
                uow.rollback();
                return Err(err.into());
            }
        };
        let changes = uow.stage();
        if let Err(err) = persist(&self.db, &changes).await {
            warn!(error = %err, rows = changes.len(), "persisting unit of work failed");
            uow.rollback();
            return Err(err);
        }
        uow.commit();
        Ok(value)
    }

    /// Runs a read-only query against the book.
    pub async fn read<T, F>(&self, query: F) -> T
    where
        F: FnOnce(&Book) -> T,
    {
        let kernel = self.kernel.lock().await;
        query(kernel.book())
    }
}

/// Reads every table into a book.
///
/// # Errors
///
/// Returns an error if a query fails or a row cannot be decoded.
pub async fn load_book<C: ConnectionTrait>(db: &C) -> StoreResult<Book> {
    let mut rows: Vec<Row> = Vec::new();
    for m in FinancialAccounts::find().all(db).await? {
        rows.push(codec::account_row(m)?);
    }
    for m in LedgerEntries::find().all(db).await? {
        rows.push(codec::ledger_row(m)?);
    }
    rows.extend(Settings::find().all(db).await?.into_iter().map(codec::setting_row));
    for m in Crops::find().all(db).await? {
        rows.push(codec::crop_row(m)?);
    }
    rows.extend(Inventories::find().all(db).await?.into_iter().map(codec::inventory_row));
    for m in InventoryBatches::find().all(db).await? {
        rows.push(codec::batch_row(m)?);
    }
    rows.extend(Contacts::find().all(db).await?.into_iter().map(codec::contact_row));
    for m in Purchases::find().all(db).await? {
        rows.push(codec::purchase_row(m)?);
    }
    for m in Sales::find().all(db).await? {
        rows.push(codec::sale_row(m)?);
    }
    for m in StockConsumptions::find().all(db).await? {
        rows.push(codec::consumption_row(m)?);
    }
    for m in Payments::find().all(db).await? {
        rows.push(codec::payment_row(m)?);
    }
    rows.extend(SaleReturns::find().all(db).await?.into_iter().map(codec::sale_return_row));
    rows.extend(
        PurchaseReturns::find()
            .all(db)
            .await?
            .into_iter()
            .map(codec::purchase_return_row),
    );
    for m in InventoryAdjustments::find().all(db).await? {
        rows.push(codec::adjustment_row(m)?);
    }
    for m in CapitalAllocations::find().all(db).await? {
        rows.push(codec::capital_row(m)?);
    }
    for m in Expenses::find().all(db).await? {
        rows.push(codec::expense_row(m)?);
    }
    rows.extend(
        Transformations::find()
            .all(db)
            .await?
            .into_iter()
            .map(codec::transformation_row),
    );
    for m in Seasons::find().all(db).await? {
        rows.push(codec::season_row(m)?);
    }
    for m in AuditLogs::find().all(db).await? {
        rows.push(codec::audit_row(m)?);
    }
    debug!(rows = rows.len(), "rows decoded");
    Ok(Book::from_rows(rows))
}

/// Writes a change set in one transaction.
///
/// # Errors
///
/// Returns an error if any write fails; the transaction is then rolled back.
pub async fn persist(db: &DatabaseConnection, changes: &ChangeSet) -> StoreResult<()> {
    if changes.is_empty() {
        return Ok(());
    }
    let txn = db.begin().await?;
    txn.execute_unprepared("SET CONSTRAINTS ALL DEFERRED").await?;
    for change in changes.changes() {
        match change {
            Change::Upsert(row) => write_row(&txn, row).await?,
            Change::Delete(key) => delete_row(&txn, key).await?,
        }
    }
    txn.commit().await?;
    debug!(rows = changes.len(), "change set persisted");
    Ok(())
}

async fn write_row(txn: &DatabaseTransaction, row: &Row) -> StoreResult<()> {
    match row {
        Row::Account(r) => upsert(txn, codec::account_model(r)?.into_active_model()).await?,
        Row::LedgerEntry(r) => upsert(txn, codec::ledger_model(r)?.into_active_model()).await?,
        Row::Setting(r) => upsert(txn, codec::setting_model(r).into_active_model()).await?,
        Row::Crop(r) => upsert(txn, codec::crop_model(r)?.into_active_model()).await?,
        Row::Inventory(r) => upsert(txn, codec::inventory_model(r).into_active_model()).await?,
        Row::Batch(r) => upsert(txn, codec::batch_model(r)?.into_active_model()).await?,
        Row::Contact(r) => upsert(txn, codec::contact_model(r).into_active_model()).await?,
        Row::Purchase(r) => upsert(txn, codec::purchase_model(r)?.into_active_model()).await?,
        Row::Sale(r) => upsert(txn, codec::sale_model(r)?.into_active_model()).await?,
        Row::Consumption(r) => upsert(txn, codec::consumption_model(r)?.into_active_model()).await?,
        Row::Payment(r) => upsert(txn, codec::payment_model(r)?.into_active_model()).await?,
        Row::SaleReturn(r) => upsert(txn, codec::sale_return_model(r).into_active_model()).await?,
        Row::PurchaseReturn(r) => {
            upsert(txn, codec::purchase_return_model(r).into_active_model()).await?;
        }
        Row::Adjustment(r) => upsert(txn, codec::adjustment_model(r)?.into_active_model()).await?,
        Row::Capital(r) => upsert(txn, codec::capital_model(r)?.into_active_model()).await?,
        Row::Expense(r) => upsert(txn, codec::expense_model(r)?.into_active_model()).await?,
        Row::Transformation(r) => {
            upsert(txn, codec::transformation_model(r).into_active_model()).await?;
        }
        Row::Season(r) => upsert(txn, codec::season_model(r)?.into_active_model()).await?,
        Row::Audit(r) => upsert(txn, codec::audit_model(r)?.into_active_model()).await?,
    }
    Ok(())
}

async fn delete_row(txn: &DatabaseTransaction, key: &RowKey) -> Result<(), DbErr> {
    match key {
        RowKey::Account(id) => FinancialAccounts::delete_by_id(id.into_inner()).exec(txn).await?,
        RowKey::LedgerEntry(id) => LedgerEntries::delete_by_id(id.into_inner()).exec(txn).await?,
        RowKey::Setting(k) => Settings::delete_by_id(k.clone()).exec(txn).await?,
        RowKey::Crop(id) => Crops::delete_by_id(id.into_inner()).exec(txn).await?,
        RowKey::Inventory(id) => Inventories::delete_by_id(id.into_inner()).exec(txn).await?,
        RowKey::Batch(id) => InventoryBatches::delete_by_id(id.into_inner()).exec(txn).await?,
        RowKey::Contact(id) => Contacts::delete_by_id(id.into_inner()).exec(txn).await?,
        RowKey::Purchase(id) => Purchases::delete_by_id(id.into_inner()).exec(txn).await?,
        RowKey::Sale(id) => Sales::delete_by_id(id.into_inner()).exec(txn).await?,
        RowKey::Consumption(id) => {
            StockConsumptions::delete_by_id(id.into_inner()).exec(txn).await?
        }
        RowKey::Payment(id) => Payments::delete_by_id(id.into_inner()).exec(txn).await?,
        RowKey::SaleReturn(id) => SaleReturns::delete_by_id(id.into_inner()).exec(txn).await?,
        RowKey::PurchaseReturn(id) => {
            PurchaseReturns::delete_by_id(id.into_inner()).exec(txn).await?
        }
        RowKey::Adjustment(id) => {
            InventoryAdjustments::delete_by_id(id.into_inner()).exec(txn).await?
        }
        RowKey::Capital(id) => CapitalAllocations::delete_by_id(id.into_inner()).exec(txn).await?,
        RowKey::Expense(id) => Expenses::delete_by_id(id.into_inner()).exec(txn).await?,
        RowKey::Transformation(id) => {
            Transformations::delete_by_id(id.into_inner()).exec(txn).await?
        }
        RowKey::Season(id) => Seasons::delete_by_id(id.into_inner()).exec(txn).await?,
        RowKey::Audit(id) => AuditLogs::delete_by_id(id.into_inner()).exec(txn).await?,
    };
    Ok(())
}

/// Inserts a row, replacing every non-key column on primary-key conflict.
async fn upsert<A>(txn: &DatabaseTransaction, model: A) -> Result<(), DbErr>
where
    A: ActiveModelTrait + Send,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
{
    let keys: Vec<_> = <A::Entity as EntityTrait>::PrimaryKey::iter()
        .map(PrimaryKeyToColumn::into_column)
        .collect();
    let key_names: Vec<&str> = keys.iter().map(IdenStatic::as_str).collect();
    let mut conflict = OnConflict::columns(keys.clone());
    conflict.update_columns(
        <A::Entity as EntityTrait>::Column::iter().filter(|c| !key_names.contains(&c.as_str())),
    );
    <A::Entity as EntityTrait>::insert(model)
        .on_conflict(conflict)
        .exec_without_returning(txn)
        .await?;
    Ok(())
}
