//! Table storage.

use std::collections::BTreeMap;

use granary_shared::types::{
    AccountId, AdjustmentId, AuditLogId, BatchId, CapitalAllocationId, ConsumptionId, ContactId,
    CropId, ExpenseId, LedgerEntryId, PaymentId, PurchaseId, PurchaseReturnId, SaleId,
    SaleReturnId, SeasonId, TransformationId,
};

use crate::accounts::FinancialAccount;
use crate::audit::AuditLog;
use crate::contacts::Contact;
use crate::error::{KernelError, KernelResult};
use crate::events::types::{
    CapitalAllocation, Expense, InventoryAdjustment, Payment, Purchase, PurchaseReturn, Sale,
    SaleReturn, Transformation,
};
use crate::inventory::{Crop, Inventory, InventoryBatch, StockConsumption};
use crate::ledger::LedgerEntry;
use crate::season::Season;
use crate::settings::Setting;

/// One row of any table.
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    /// Chart-of-accounts entry.
    Account(FinancialAccount),
    /// Ledger leg.
    LedgerEntry(LedgerEntry),
    /// Setting.
    Setting(Setting),
    /// Crop.
    Crop(Crop),
    /// Per-crop stock aggregate.
    Inventory(Inventory),
    /// Inventory batch.
    Batch(InventoryBatch),
    /// Contact.
    Contact(Contact),
    /// Purchase.
    Purchase(Purchase),
    /// Sale.
    Sale(Sale),
    /// FIFO slice.
    Consumption(StockConsumption),
    /// Payment.
    Payment(Payment),
    /// Sale return.
    SaleReturn(SaleReturn),
    /// Purchase return.
    PurchaseReturn(PurchaseReturn),
    /// Inventory adjustment.
    Adjustment(InventoryAdjustment),
    /// Capital movement.
    Capital(CapitalAllocation),
    /// Expense.
    Expense(Expense),
    /// Transformation.
    Transformation(Transformation),
    /// Season.
    Season(Season),
    /// Audit record.
    Audit(AuditLog),
}

/// Primary key of a [`Row`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RowKey {
    /// Account id.
    Account(AccountId),
    /// Ledger leg id.
    LedgerEntry(LedgerEntryId),
    /// Setting key.
    Setting(String),
    /// Crop id.
    Crop(CropId),
    /// Inventory aggregate, keyed by crop.
    Inventory(CropId),
    /// Batch id.
    Batch(BatchId),
    /// Contact id.
    Contact(ContactId),
    /// Purchase id.
    Purchase(PurchaseId),
    /// Sale id.
    Sale(SaleId),
    /// Consumption id.
    Consumption(ConsumptionId),
    /// Payment id.
    Payment(PaymentId),
    /// Sale return id.
    SaleReturn(SaleReturnId),
    /// Purchase return id.
    PurchaseReturn(PurchaseReturnId),
    /// Adjustment id.
    Adjustment(AdjustmentId),
    /// Capital movement id.
    Capital(CapitalAllocationId),
    /// Expense id.
    Expense(ExpenseId),
    /// Transformation id.
    Transformation(TransformationId),
    /// Season id.
    Season(SeasonId),
    /// Audit record id.
    Audit(AuditLogId),
}

impl Row {
    /// Primary key of the row.
    #[must_use]
    pub fn key(&self) -> RowKey {
        match self {
            Self::Account(r) => RowKey::Account(r.id),
            Self::LedgerEntry(r) => RowKey::LedgerEntry(r.id),
            Self::Setting(r) => RowKey::Setting(r.key.clone()),
            Self::Crop(r) => RowKey::Crop(r.id),
            Self::Inventory(r) => RowKey::Inventory(r.crop_id),
            Self::Batch(r) => RowKey::Batch(r.id),
            Self::Contact(r) => RowKey::Contact(r.id),
            Self::Purchase(r) => RowKey::Purchase(r.id),
            Self::Sale(r) => RowKey::Sale(r.id),
            Self::Consumption(r) => RowKey::Consumption(r.id),
            Self::Payment(r) => RowKey::Payment(r.id),
            Self::SaleReturn(r) => RowKey::SaleReturn(r.id),
            Self::PurchaseReturn(r) => RowKey::PurchaseReturn(r.id),
            Self::Adjustment(r) => RowKey::Adjustment(r.id),
            Self::Capital(r) => RowKey::Capital(r.id),
            Self::Expense(r) => RowKey::Expense(r.id),
            Self::Transformation(r) => RowKey::Transformation(r.id),
            Self::Season(r) => RowKey::Season(r.id),
            Self::Audit(r) => RowKey::Audit(r.id),
        }
    }
}

impl RowKey {
    /// Table name of the key.
    #[must_use]
    pub fn table(&self) -> &'static str {
        match self {
            Self::Account(_) => "financial_accounts",
            Self::LedgerEntry(_) => "ledger_entries",
            Self::Setting(_) => "settings",
            Self::Crop(_) => "crops",
            Self::Inventory(_) => "inventories",
            Self::Batch(_) => "inventory_batches",
            Self::Contact(_) => "contacts",
            Self::Purchase(_) => "purchases",
            Self::Sale(_) => "sales",
            Self::Consumption(_) => "stock_consumptions",
            Self::Payment(_) => "payments",
            Self::SaleReturn(_) => "sale_returns",
            Self::PurchaseReturn(_) => "purchase_returns",
            Self::Adjustment(_) => "inventory_adjustments",
            Self::Capital(_) => "capital_allocations",
            Self::Expense(_) => "expenses",
            Self::Transformation(_) => "transformations",
            Self::Season(_) => "seasons",
            Self::Audit(_) => "audit_logs",
        }
    }
}

/// Generates a by-id lookup and an iterator for one table.
macro_rules! table_access {
    ($get:ident, $iter:ident, $field:ident, $id:ty, $row:ty, $entity:literal $(,)?) => {
        #[doc = concat!("Looks up a ", $entity, " by id.")]
        pub fn $get(&self, id: $id) -> KernelResult<&$row> {
            self.$field
                .get(&id)
                .ok_or_else(|| KernelError::not_found($entity, id))
        }

        #[doc = concat!("Iterates every ", $entity, " in id order.")]
        pub fn $iter(&self) -> impl Iterator<Item = &$row> {
            self.$field.values()
        }
    };
}

/// Every table of the kernel, held in memory.
#[derive(Debug, Clone, Default)]
pub struct Book {
    accounts: BTreeMap<AccountId, FinancialAccount>,
    ledger: BTreeMap<LedgerEntryId, LedgerEntry>,
    settings: BTreeMap<String, Setting>,
    crops: BTreeMap<CropId, Crop>,
    inventories: BTreeMap<CropId, Inventory>,
    batches: BTreeMap<BatchId, InventoryBatch>,
    contacts: BTreeMap<ContactId, Contact>,
    purchases: BTreeMap<PurchaseId, Purchase>,
    sales: BTreeMap<SaleId, Sale>,
    consumptions: BTreeMap<ConsumptionId, StockConsumption>,
    payments: BTreeMap<PaymentId, Payment>,
    sale_returns: BTreeMap<SaleReturnId, SaleReturn>,
    purchase_returns: BTreeMap<PurchaseReturnId, PurchaseReturn>,
    adjustments: BTreeMap<AdjustmentId, InventoryAdjustment>,
    capital: BTreeMap<CapitalAllocationId, CapitalAllocation>,
    expenses: BTreeMap<ExpenseId, Expense>,
    transformations: BTreeMap<TransformationId, Transformation>,
    seasons: BTreeMap<SeasonId, Season>,
    audit: BTreeMap<AuditLogId, AuditLog>,
}

impl Book {
    /// Creates an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a book from loaded rows.
    pub fn from_rows(rows: impl IntoIterator<Item = Row>) -> Self {
        let mut book = Self::new();
        for row in rows {
            book.put(row);
        }
        book
    }

    /// True when neither accounts nor settings exist yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty() && self.settings.is_empty()
    }

    /// Returns a copy of the row stored under `key`.
    #[must_use]
    pub fn get(&self, key: &RowKey) -> Option<Row> {
        match key {
            RowKey::Account(id) => self.accounts.get(id).cloned().map(Row::Account),
            RowKey::LedgerEntry(id) => self.ledger.get(id).cloned().map(Row::LedgerEntry),
            RowKey::Setting(k) => self.settings.get(k).cloned().map(Row::Setting),
            RowKey::Crop(id) => self.crops.get(id).cloned().map(Row::Crop),
            RowKey::Inventory(id) => self.inventories.get(id).cloned().map(Row::Inventory),
            RowKey::Batch(id) => self.batches.get(id).cloned().map(Row::Batch),
            RowKey::Contact(id) => self.contacts.get(id).cloned().map(Row::Contact),
            RowKey::Purchase(id) => self.purchases.get(id).cloned().map(Row::Purchase),
            RowKey::Sale(id) => self.sales.get(id).cloned().map(Row::Sale),
            RowKey::Consumption(id) => self.consumptions.get(id).cloned().map(Row::Consumption),
            RowKey::Payment(id) => self.payments.get(id).cloned().map(Row::Payment),
            RowKey::SaleReturn(id) => self.sale_returns.get(id).cloned().map(Row::SaleReturn),
            RowKey::PurchaseReturn(id) => {
                self.purchase_returns.get(id).cloned().map(Row::PurchaseReturn)
            }
            RowKey::Adjustment(id) => self.adjustments.get(id).cloned().map(Row::Adjustment),
            RowKey::Capital(id) => self.capital.get(id).cloned().map(Row::Capital),
            RowKey::Expense(id) => self.expenses.get(id).cloned().map(Row::Expense),
            RowKey::Transformation(id) => {
                self.transformations.get(id).cloned().map(Row::Transformation)
            }
            RowKey::Season(id) => self.seasons.get(id).cloned().map(Row::Season),
            RowKey::Audit(id) => self.audit.get(id).cloned().map(Row::Audit),
        }
    }

    /// Stores a row, returning the previous image.
    pub(crate) fn put(&mut self, row: Row) -> Option<Row> {
        match row {
            Row::Account(r) => self.accounts.insert(r.id, r).map(Row::Account),
            Row::LedgerEntry(r) => self.ledger.insert(r.id, r).map(Row::LedgerEntry),
            Row::Setting(r) => self.settings.insert(r.key.clone(), r).map(Row::Setting),
            Row::Crop(r) => self.crops.insert(r.id, r).map(Row::Crop),
            Row::Inventory(r) => self.inventories.insert(r.crop_id, r).map(Row::Inventory),
            Row::Batch(r) => self.batches.insert(r.id, r).map(Row::Batch),
            Row::Contact(r) => self.contacts.insert(r.id, r).map(Row::Contact),
            Row::Purchase(r) => self.purchases.insert(r.id, r).map(Row::Purchase),
            Row::Sale(r) => self.sales.insert(r.id, r).map(Row::Sale),
            Row::Consumption(r) => self.consumptions.insert(r.id, r).map(Row::Consumption),
            Row::Payment(r) => self.payments.insert(r.id, r).map(Row::Payment),
            Row::SaleReturn(r) => self.sale_returns.insert(r.id, r).map(Row::SaleReturn),
            Row::PurchaseReturn(r) => {
                self.purchase_returns.insert(r.id, r).map(Row::PurchaseReturn)
            }
            Row::Adjustment(r) => self.adjustments.insert(r.id, r).map(Row::Adjustment),
            Row::Capital(r) => self.capital.insert(r.id, r).map(Row::Capital),
            Row::Expense(r) => self.expenses.insert(r.id, r).map(Row::Expense),
            Row::Transformation(r) => self.transformations.insert(r.id, r).map(Row::Transformation),
            Row::Season(r) => self.seasons.insert(r.id, r).map(Row::Season),
            Row::Audit(r) => self.audit.insert(r.id, r).map(Row::Audit),
        }
    }

    /// Removes a row, returning it.
    pub(crate) fn take(&mut self, key: &RowKey) -> Option<Row> {
        match key {
            RowKey::Account(id) => self.accounts.remove(id).map(Row::Account),
            RowKey::LedgerEntry(id) => self.ledger.remove(id).map(Row::LedgerEntry),
            RowKey::Setting(k) => self.settings.remove(k).map(Row::Setting),
            RowKey::Crop(id) => self.crops.remove(id).map(Row::Crop),
            RowKey::Inventory(id) => self.inventories.remove(id).map(Row::Inventory),
            RowKey::Batch(id) => self.batches.remove(id).map(Row::Batch),
            RowKey::Contact(id) => self.contacts.remove(id).map(Row::Contact),
            RowKey::Purchase(id) => self.purchases.remove(id).map(Row::Purchase),
            RowKey::Sale(id) => self.sales.remove(id).map(Row::Sale),
            RowKey::Consumption(id) => self.consumptions.remove(id).map(Row::Consumption),
            RowKey::Payment(id) => self.payments.remove(id).map(Row::Payment),
            RowKey::SaleReturn(id) => self.sale_returns.remove(id).map(Row::SaleReturn),
            RowKey::PurchaseReturn(id) => self.purchase_returns.remove(id).map(Row::PurchaseReturn),
            RowKey::Adjustment(id) => self.adjustments.remove(id).map(Row::Adjustment),
            RowKey::Capital(id) => self.capital.remove(id).map(Row::Capital),
            RowKey::Expense(id) => self.expenses.remove(id).map(Row::Expense),
            RowKey::Transformation(id) => self.transformations.remove(id).map(Row::Transformation),
            RowKey::Season(id) => self.seasons.remove(id).map(Row::Season),
            RowKey::Audit(id) => self.audit.remove(id).map(Row::Audit),
        }
    }

    table_access!(account, accounts, accounts, AccountId, FinancialAccount, "Account");
    table_access!(ledger_entry, ledger_entries, ledger, LedgerEntryId, LedgerEntry, "Ledger entry");
    table_access!(crop, crops, crops, CropId, Crop, "Crop");
    table_access!(inventory, inventories, inventories, CropId, Inventory, "Inventory");
    table_access!(batch, batches, batches, BatchId, InventoryBatch, "Batch");
    table_access!(contact, contacts, contacts, ContactId, Contact, "Contact");
    table_access!(purchase, purchases, purchases, PurchaseId, Purchase, "Purchase");
    table_access!(sale, sales, sales, SaleId, Sale, "Sale");
    table_access!(
        consumption,
        consumptions,
        consumptions,
        ConsumptionId,
        StockConsumption,
        "Consumption",
    );
    table_access!(payment, payments, payments, PaymentId, Payment, "Payment");
    table_access!(sale_return, sale_returns, sale_returns, SaleReturnId, SaleReturn, "Sale return");
    table_access!(
        purchase_return,
        purchase_returns,
        purchase_returns,
        PurchaseReturnId,
        PurchaseReturn,
        "Purchase return",
    );
    table_access!(
        adjustment,
        adjustments,
        adjustments,
        AdjustmentId,
        InventoryAdjustment,
        "Adjustment",
    );
    table_access!(
        capital_allocation,
        capital_allocations,
        capital,
        CapitalAllocationId,
        CapitalAllocation,
        "Capital allocation",
    );
    table_access!(expense, expenses, expenses, ExpenseId, Expense, "Expense");
    table_access!(
        transformation,
        transformations,
        transformations,
        TransformationId,
        Transformation,
        "Transformation",
    );
    table_access!(season, seasons, seasons, SeasonId, Season, "Season");
    table_access!(audit_log, audit_logs, audit, AuditLogId, AuditLog, "Audit log");

    /// Looks up a setting by key.
    #[must_use]
    pub fn setting(&self, key: &str) -> Option<&Setting> {
        self.settings.get(key)
    }

    /// Iterates every setting in key order.
    pub fn settings(&self) -> impl Iterator<Item = &Setting> {
        self.settings.values()
    }

    /// Total number of rows across every table.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.accounts.len()
            + self.ledger.len()
            + self.settings.len()
            + self.crops.len()
            + self.inventories.len()
            + self.batches.len()
            + self.contacts.len()
            + self.purchases.len()
            + self.sales.len()
            + self.consumptions.len()
            + self.payments.len()
            + self.sale_returns.len()
            + self.purchase_returns.len()
            + self.adjustments.len()
            + self.capital.len()
            + self.expenses.len()
            + self.transformations.len()
            + self.seasons.len()
            + self.audit.len()
    }
}
