//! Entity aliases.

pub use super::audit_logs::Entity as AuditLogs;
pub use super::capital_allocations::Entity as CapitalAllocations;
pub use super::contacts::Entity as Contacts;
pub use super::crops::Entity as Crops;
pub use super::expenses::Entity as Expenses;
pub use super::financial_accounts::Entity as FinancialAccounts;
pub use super::inventories::Entity as Inventories;
pub use super::inventory_adjustments::Entity as InventoryAdjustments;
pub use super::inventory_batches::Entity as InventoryBatches;
pub use super::ledger_entries::Entity as LedgerEntries;
pub use super::payments::Entity as Payments;
pub use super::purchase_returns::Entity as PurchaseReturns;
pub use super::purchases::Entity as Purchases;
pub use super::sale_returns::Entity as SaleReturns;
pub use super::sales::Entity as Sales;
pub use super::seasons::Entity as Seasons;
pub use super::settings::Entity as Settings;
pub use super::stock_consumptions::Entity as StockConsumptions;
pub use super::transformations::Entity as Transformations;
