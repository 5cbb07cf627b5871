//! Conversion between kernel rows and entity models.
//!
//! Enum columns hold the kernel's serde names (`PAID`, `SALE_COGS`,
//! `qantar_government`, ...), so a row written by one build decodes in the
//! next as long as the names are stable.

use granary_core::accounts::FinancialAccount;
use granary_core::audit::AuditLog;
use granary_core::contacts::Contact;
use granary_core::events::{
    CapitalAllocation, Expense, InventoryAdjustment, Payment, Purchase, PurchaseReturn, Sale,
    SaleReturn, Transformation,
};
use granary_core::inventory::{Crop, Inventory, InventoryBatch, StockConsumption};
use granary_core::ledger::LedgerEntry;
use granary_core::season::Season;
use granary_core::settings::Setting;
use granary_core::store::Row;
use granary_shared::types::{
    AccountId, AdjustmentId, AuditLogId, BatchId, CapitalAllocationId, ConsumptionId, ContactId,
    CropId, ExpenseId, LedgerEntryId, PaymentId, PurchaseId, PurchaseReturnId, SaleId,
    SaleReturnId, SeasonId, TransformationId, UserId,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::entities::{
    audit_logs, capital_allocations, contacts, crops, expenses, financial_accounts, inventories,
    inventory_adjustments, inventory_batches, ledger_entries, payments, purchase_returns,
    purchases, sale_returns, sales, seasons, settings, stock_consumptions, transformations,
};
use crate::error::{StoreError, StoreResult};

/// Wire name of a unit enum.
fn text<T: Serialize>(table: &'static str, column: &'static str, value: &T) -> StoreResult<String> {
    match serde_json::to_value(value) {
        Ok(Value::String(name)) => Ok(name),
        Ok(other) => Err(StoreError::decode(table, column, format!("not a unit variant: {other}"))),
        Err(err) => Err(StoreError::decode(table, column, err)),
    }
}

/// Parses a unit enum from its wire name.
fn parse<T: DeserializeOwned>(
    table: &'static str,
    column: &'static str,
    raw: &str,
) -> StoreResult<T> {
    serde_json::from_value(Value::String(raw.to_owned()))
        .map_err(|err| StoreError::decode(table, column, err))
}

fn json<T: Serialize>(table: &'static str, column: &'static str, value: &T) -> StoreResult<Value> {
    serde_json::to_value(value).map_err(|err| StoreError::decode(table, column, err))
}

fn from_json<T: DeserializeOwned>(
    table: &'static str,
    column: &'static str,
    value: Value,
) -> StoreResult<T> {
    serde_json::from_value(value).map_err(|err| StoreError::decode(table, column, err))
}

// ============================================================================
// Accounts, ledger, settings
// ============================================================================

pub(crate) fn account_model(r: &FinancialAccount) -> StoreResult<financial_accounts::Model> {
    Ok(financial_accounts::Model {
        id: r.id.into_inner(),
        name: r.name.clone(),
        account_type: text("financial_accounts", "account_type", &r.account_type)?,
        is_active: r.is_active,
        balance: r.balance,
        created_at: r.created_at,
    })
}

pub(crate) fn account_row(m: financial_accounts::Model) -> StoreResult<Row> {
    Ok(Row::Account(FinancialAccount {
        id: AccountId::from_uuid(m.id),
        account_type: parse("financial_accounts", "account_type", &m.account_type)?,
        name: m.name,
        is_active: m.is_active,
        balance: m.balance,
        created_at: m.created_at,
    }))
}

pub(crate) fn ledger_model(r: &LedgerEntry) -> StoreResult<ledger_entries::Model> {
    Ok(ledger_entries::Model {
        id: r.id.into_inner(),
        entry_date: r.entry_date,
        account_id: r.account_id.into_inner(),
        debit: r.debit,
        credit: r.credit,
        description: r.description.clone(),
        source_kind: r.source_kind.to_string(),
        source_id: r.source_id,
        reversal_of: r.reversal_of.map(LedgerEntryId::into_inner),
        created_by: r.created_by.into_inner(),
        created_at: r.created_at,
    })
}

pub(crate) fn ledger_row(m: ledger_entries::Model) -> StoreResult<Row> {
    let source_kind = m
        .source_kind
        .parse()
        .map_err(|err| StoreError::decode("ledger_entries", "source_kind", err))?;
    Ok(Row::LedgerEntry(LedgerEntry {
        id: LedgerEntryId::from_uuid(m.id),
        entry_date: m.entry_date,
        account_id: AccountId::from_uuid(m.account_id),
        debit: m.debit,
        credit: m.credit,
        description: m.description,
        source_kind,
        source_id: m.source_id,
        reversal_of: m.reversal_of.map(LedgerEntryId::from_uuid),
        created_by: UserId::from_uuid(m.created_by),
        created_at: m.created_at,
    }))
}

pub(crate) fn setting_model(r: &Setting) -> settings::Model {
    settings::Model {
        key: r.key.clone(),
        value: r.value.clone(),
        updated_at: r.updated_at,
    }
}

pub(crate) fn setting_row(m: settings::Model) -> Row {
    Row::Setting(Setting {
        key: m.key,
        value: m.value,
        updated_at: m.updated_at,
    })
}

// ============================================================================
// Crops and stock
// ============================================================================

pub(crate) fn crop_model(r: &Crop) -> StoreResult<crops::Model> {
    Ok(crops::Model {
        id: r.id.into_inner(),
        name: r.name.clone(),
        pricing_units: json("crops", "pricing_units", &r.pricing_units)?,
        conversion_factors: json("crops", "conversion_factors", &r.conversion_factors)?,
        is_active: r.is_active,
        is_complex_unit: r.is_complex_unit,
        default_tare_per_bag: r.default_tare_per_bag,
        standard_unit_weight: r.standard_unit_weight,
        created_at: r.created_at,
    })
}

pub(crate) fn crop_row(m: crops::Model) -> StoreResult<Row> {
    Ok(Row::Crop(Crop {
        id: CropId::from_uuid(m.id),
        name: m.name,
        pricing_units: from_json("crops", "pricing_units", m.pricing_units)?,
        conversion_factors: from_json("crops", "conversion_factors", m.conversion_factors)?,
        is_active: m.is_active,
        is_complex_unit: m.is_complex_unit,
        default_tare_per_bag: m.default_tare_per_bag,
        standard_unit_weight: m.standard_unit_weight,
        created_at: m.created_at,
    }))
}

pub(crate) fn inventory_model(r: &Inventory) -> inventories::Model {
    inventories::Model {
        crop_id: r.crop_id.into_inner(),
        current_stock_kg: r.current_stock_kg,
        net_stock_kg: r.net_stock_kg,
        gross_stock_kg: r.gross_stock_kg,
        bag_count: r.bag_count,
        average_cost_per_kg: r.average_cost_per_kg,
        low_stock_threshold_kg: r.low_stock_threshold_kg,
        updated_at: r.updated_at,
    }
}

pub(crate) fn inventory_row(m: inventories::Model) -> Row {
    Row::Inventory(Inventory {
        crop_id: CropId::from_uuid(m.crop_id),
        current_stock_kg: m.current_stock_kg,
        net_stock_kg: m.net_stock_kg,
        gross_stock_kg: m.gross_stock_kg,
        bag_count: m.bag_count,
        average_cost_per_kg: m.average_cost_per_kg,
        low_stock_threshold_kg: m.low_stock_threshold_kg,
        updated_at: m.updated_at,
    })
}

pub(crate) fn batch_model(r: &InventoryBatch) -> StoreResult<inventory_batches::Model> {
    Ok(inventory_batches::Model {
        id: r.id.into_inner(),
        crop_id: r.crop_id.into_inner(),
        original_qty: r.original_qty,
        remaining_qty: r.remaining_qty,
        cost_per_kg: r.cost_per_kg,
        purchase_date: r.purchase_date,
        purchase_id: r.purchase_id.map(PurchaseId::into_inner),
        supplier_id: r.supplier_id.map(ContactId::into_inner),
        expiry_date: r.expiry_date,
        origin: text("inventory_batches", "origin", &r.origin)?,
        origin_id: r.origin_id,
        is_active: r.is_active,
        created_at: r.created_at,
    })
}

pub(crate) fn batch_row(m: inventory_batches::Model) -> StoreResult<Row> {
    Ok(Row::Batch(InventoryBatch {
        id: BatchId::from_uuid(m.id),
        crop_id: CropId::from_uuid(m.crop_id),
        original_qty: m.original_qty,
        remaining_qty: m.remaining_qty,
        cost_per_kg: m.cost_per_kg,
        purchase_date: m.purchase_date,
        purchase_id: m.purchase_id.map(PurchaseId::from_uuid),
        supplier_id: m.supplier_id.map(ContactId::from_uuid),
        expiry_date: m.expiry_date,
        origin: parse("inventory_batches", "origin", &m.origin)?,
        origin_id: m.origin_id,
        is_active: m.is_active,
        created_at: m.created_at,
    }))
}

pub(crate) fn consumption_model(r: &StockConsumption) -> StoreResult<stock_consumptions::Model> {
    Ok(stock_consumptions::Model {
        id: r.id.into_inner(),
        consumer_kind: text("stock_consumptions", "consumer_kind", &r.consumer_kind)?,
        consumer_id: r.consumer_id,
        batch_id: r.batch_id.into_inner(),
        quantity_kg: r.quantity_kg,
        cost_per_kg: r.cost_per_kg,
        consumed_on: r.consumed_on,
    })
}

pub(crate) fn consumption_row(m: stock_consumptions::Model) -> StoreResult<Row> {
    Ok(Row::Consumption(StockConsumption {
        id: ConsumptionId::from_uuid(m.id),
        consumer_kind: parse("stock_consumptions", "consumer_kind", &m.consumer_kind)?,
        consumer_id: m.consumer_id,
        batch_id: BatchId::from_uuid(m.batch_id),
        quantity_kg: m.quantity_kg,
        cost_per_kg: m.cost_per_kg,
        consumed_on: m.consumed_on,
    }))
}

// ============================================================================
// Contacts and trade events
// ============================================================================

pub(crate) fn contact_model(r: &Contact) -> contacts::Model {
    contacts::Model {
        id: r.id.into_inner(),
        name: r.name.clone(),
        phone: r.phone.clone(),
        email: r.email.clone(),
        address: r.address.clone(),
        is_supplier: r.is_supplier,
        is_customer: r.is_customer,
        created_at: r.created_at,
    }
}

pub(crate) fn contact_row(m: contacts::Model) -> Row {
    Row::Contact(Contact {
        id: ContactId::from_uuid(m.id),
        name: m.name,
        phone: m.phone,
        email: m.email,
        address: m.address,
        is_supplier: m.is_supplier,
        is_customer: m.is_customer,
        created_at: m.created_at,
    })
}

pub(crate) fn purchase_model(r: &Purchase) -> StoreResult<purchases::Model> {
    Ok(purchases::Model {
        id: r.id.into_inner(),
        crop_id: r.crop_id.into_inner(),
        supplier_id: r.supplier_id.into_inner(),
        season_id: r.season_id.map(SeasonId::into_inner),
        purchase_date: r.purchase_date,
        net_quantity_kg: r.net_quantity_kg,
        unit_price: r.unit_price,
        total_cost: r.total_cost,
        gross_quantity: r.gross_quantity,
        tare_weight: r.tare_weight,
        bag_count: r.bag_count,
        pricing_unit: r.pricing_unit.clone(),
        conversion_factor: r.conversion_factor,
        calculation_formula: text("purchases", "calculation_formula", &r.calculation_formula)?,
        amount_paid: r.amount_paid,
        payment_status: text("purchases", "payment_status", &r.payment_status)?,
        returned_qty: r.returned_qty,
        returned_cost: r.returned_cost,
        batch_id: r.batch_id.into_inner(),
        notes: r.notes.clone(),
        created_by: r.created_by.into_inner(),
        created_at: r.created_at,
    })
}

pub(crate) fn purchase_row(m: purchases::Model) -> StoreResult<Row> {
    Ok(Row::Purchase(Purchase {
        id: PurchaseId::from_uuid(m.id),
        crop_id: CropId::from_uuid(m.crop_id),
        supplier_id: ContactId::from_uuid(m.supplier_id),
        season_id: m.season_id.map(SeasonId::from_uuid),
        purchase_date: m.purchase_date,
        net_quantity_kg: m.net_quantity_kg,
        unit_price: m.unit_price,
        total_cost: m.total_cost,
        gross_quantity: m.gross_quantity,
        tare_weight: m.tare_weight,
        bag_count: m.bag_count,
        calculation_formula: parse("purchases", "calculation_formula", &m.calculation_formula)?,
        payment_status: parse("purchases", "payment_status", &m.payment_status)?,
        pricing_unit: m.pricing_unit,
        conversion_factor: m.conversion_factor,
        amount_paid: m.amount_paid,
        returned_qty: m.returned_qty,
        returned_cost: m.returned_cost,
        batch_id: BatchId::from_uuid(m.batch_id),
        notes: m.notes,
        created_by: UserId::from_uuid(m.created_by),
        created_at: m.created_at,
    }))
}

pub(crate) fn sale_model(r: &Sale) -> StoreResult<sales::Model> {
    Ok(sales::Model {
        id: r.id.into_inner(),
        crop_id: r.crop_id.into_inner(),
        customer_id: r.customer_id.into_inner(),
        season_id: r.season_id.map(SeasonId::into_inner),
        sale_date: r.sale_date,
        quantity_sold_kg: r.quantity_sold_kg,
        selling_unit_price: r.selling_unit_price,
        selling_pricing_unit: r.selling_pricing_unit.clone(),
        selling_factor: r.selling_factor,
        total_sale_amount: r.total_sale_amount,
        amount_received: r.amount_received,
        payment_status: text("sales", "payment_status", &r.payment_status)?,
        gross_quantity: r.gross_quantity,
        tare_weight: r.tare_weight,
        bag_count: r.bag_count,
        calculation_formula: text("sales", "calculation_formula", &r.calculation_formula)?,
        cogs_total: r.cogs_total,
        returned_qty: r.returned_qty,
        returned_amount: r.returned_amount,
        notes: r.notes.clone(),
        created_by: r.created_by.into_inner(),
        created_at: r.created_at,
    })
}

pub(crate) fn sale_row(m: sales::Model) -> StoreResult<Row> {
    Ok(Row::Sale(Sale {
        id: SaleId::from_uuid(m.id),
        crop_id: CropId::from_uuid(m.crop_id),
        customer_id: ContactId::from_uuid(m.customer_id),
        season_id: m.season_id.map(SeasonId::from_uuid),
        sale_date: m.sale_date,
        quantity_sold_kg: m.quantity_sold_kg,
        selling_unit_price: m.selling_unit_price,
        payment_status: parse("sales", "payment_status", &m.payment_status)?,
        calculation_formula: parse("sales", "calculation_formula", &m.calculation_formula)?,
        selling_pricing_unit: m.selling_pricing_unit,
        selling_factor: m.selling_factor,
        total_sale_amount: m.total_sale_amount,
        amount_received: m.amount_received,
        gross_quantity: m.gross_quantity,
        tare_weight: m.tare_weight,
        bag_count: m.bag_count,
        cogs_total: m.cogs_total,
        returned_qty: m.returned_qty,
        returned_amount: m.returned_amount,
        notes: m.notes,
        created_by: UserId::from_uuid(m.created_by),
        created_at: m.created_at,
    }))
}

pub(crate) fn payment_model(r: &Payment) -> StoreResult<payments::Model> {
    Ok(payments::Model {
        id: r.id.into_inner(),
        payment_date: r.payment_date,
        amount: r.amount,
        contact_id: r.contact_id.map(ContactId::into_inner),
        method: r.method.clone(),
        credit_account_id: r.credit_account_id.into_inner(),
        debit_account_id: r.debit_account_id.into_inner(),
        transaction_type: text("payments", "transaction_type", &r.transaction_type)?,
        transaction_id: r.transaction_id,
        origin: text("payments", "origin", &r.origin)?,
        notes: r.notes.clone(),
        created_by: r.created_by.into_inner(),
        created_at: r.created_at,
    })
}

pub(crate) fn payment_row(m: payments::Model) -> StoreResult<Row> {
    Ok(Row::Payment(Payment {
        id: PaymentId::from_uuid(m.id),
        payment_date: m.payment_date,
        amount: m.amount,
        contact_id: m.contact_id.map(ContactId::from_uuid),
        transaction_type: parse("payments", "transaction_type", &m.transaction_type)?,
        origin: parse("payments", "origin", &m.origin)?,
        method: m.method,
        credit_account_id: AccountId::from_uuid(m.credit_account_id),
        debit_account_id: AccountId::from_uuid(m.debit_account_id),
        transaction_id: m.transaction_id,
        notes: m.notes,
        created_by: UserId::from_uuid(m.created_by),
        created_at: m.created_at,
    }))
}

pub(crate) fn sale_return_model(r: &SaleReturn) -> sale_returns::Model {
    sale_returns::Model {
        id: r.id.into_inner(),
        sale_id: r.sale_id.into_inner(),
        return_date: r.return_date,
        returned_qty: r.returned_qty,
        reason: r.reason.clone(),
        refund_amount: r.refund_amount,
        cost_per_kg: r.cost_per_kg,
        restocked_cost: r.restocked_cost,
        reverses_cogs: r.reverses_cogs,
        batch_id: r.batch_id.into_inner(),
        created_by: r.created_by.into_inner(),
        created_at: r.created_at,
    }
}

pub(crate) fn sale_return_row(m: sale_returns::Model) -> Row {
    Row::SaleReturn(SaleReturn {
        id: SaleReturnId::from_uuid(m.id),
        sale_id: SaleId::from_uuid(m.sale_id),
        return_date: m.return_date,
        returned_qty: m.returned_qty,
        reason: m.reason,
        refund_amount: m.refund_amount,
        cost_per_kg: m.cost_per_kg,
        restocked_cost: m.restocked_cost,
        reverses_cogs: m.reverses_cogs,
        batch_id: BatchId::from_uuid(m.batch_id),
        created_by: UserId::from_uuid(m.created_by),
        created_at: m.created_at,
    })
}

pub(crate) fn purchase_return_model(r: &PurchaseReturn) -> purchase_returns::Model {
    purchase_returns::Model {
        id: r.id.into_inner(),
        purchase_id: r.purchase_id.into_inner(),
        return_date: r.return_date,
        returned_qty: r.returned_qty,
        reason: r.reason.clone(),
        returned_cost: r.returned_cost,
        gross_returned: r.gross_returned,
        bags_returned: r.bags_returned,
        created_by: r.created_by.into_inner(),
        created_at: r.created_at,
    }
}

pub(crate) fn purchase_return_row(m: purchase_returns::Model) -> Row {
    Row::PurchaseReturn(PurchaseReturn {
        id: PurchaseReturnId::from_uuid(m.id),
        purchase_id: PurchaseId::from_uuid(m.purchase_id),
        return_date: m.return_date,
        returned_qty: m.returned_qty,
        reason: m.reason,
        returned_cost: m.returned_cost,
        gross_returned: m.gross_returned,
        bags_returned: m.bags_returned,
        created_by: UserId::from_uuid(m.created_by),
        created_at: m.created_at,
    })
}

// ============================================================================
// Stock corrections, capital, expenses, transformations
// ============================================================================

pub(crate) fn adjustment_model(
    r: &InventoryAdjustment,
) -> StoreResult<inventory_adjustments::Model> {
    Ok(inventory_adjustments::Model {
        id: r.id.into_inner(),
        crop_id: r.crop_id.into_inner(),
        adjustment_date: r.adjustment_date,
        adjustment_type: text("inventory_adjustments", "adjustment_type", &r.adjustment_type)?,
        quantity: r.quantity,
        cost_per_kg: r.cost_per_kg,
        total_value: r.total_value,
        batch_id: r.batch_id.map(BatchId::into_inner),
        season_id: r.season_id.map(SeasonId::into_inner),
        notes: r.notes.clone(),
        created_by: r.created_by.into_inner(),
        created_at: r.created_at,
    })
}

pub(crate) fn adjustment_row(m: inventory_adjustments::Model) -> StoreResult<Row> {
    Ok(Row::Adjustment(InventoryAdjustment {
        id: AdjustmentId::from_uuid(m.id),
        crop_id: CropId::from_uuid(m.crop_id),
        adjustment_date: m.adjustment_date,
        adjustment_type: parse("inventory_adjustments", "adjustment_type", &m.adjustment_type)?,
        quantity: m.quantity,
        cost_per_kg: m.cost_per_kg,
        total_value: m.total_value,
        batch_id: m.batch_id.map(BatchId::from_uuid),
        season_id: m.season_id.map(SeasonId::from_uuid),
        notes: m.notes,
        created_by: UserId::from_uuid(m.created_by),
        created_at: m.created_at,
    }))
}

pub(crate) fn capital_model(r: &CapitalAllocation) -> StoreResult<capital_allocations::Model> {
    Ok(capital_allocations::Model {
        id: r.id.into_inner(),
        allocation_date: r.allocation_date,
        allocation_type: text("capital_allocations", "allocation_type", &r.allocation_type)?,
        amount: r.amount,
        owner_name: r.owner_name.clone(),
        season_id: r.season_id.map(SeasonId::into_inner),
        notes: r.notes.clone(),
        created_by: r.created_by.into_inner(),
        created_at: r.created_at,
    })
}

pub(crate) fn capital_row(m: capital_allocations::Model) -> StoreResult<Row> {
    Ok(Row::Capital(CapitalAllocation {
        id: CapitalAllocationId::from_uuid(m.id),
        allocation_date: m.allocation_date,
        allocation_type: parse("capital_allocations", "allocation_type", &m.allocation_type)?,
        amount: m.amount,
        owner_name: m.owner_name,
        season_id: m.season_id.map(SeasonId::from_uuid),
        notes: m.notes,
        created_by: UserId::from_uuid(m.created_by),
        created_at: m.created_at,
    }))
}

pub(crate) fn expense_model(r: &Expense) -> StoreResult<expenses::Model> {
    Ok(expenses::Model {
        id: r.id.into_inner(),
        expense_date: r.expense_date,
        amount: r.amount,
        category: r.category.clone(),
        description: r.description.clone(),
        expense_account_id: r.expense_account_id.into_inner(),
        paid_from_account_id: r.paid_from_account_id.into_inner(),
        season_id: r.season_id.map(SeasonId::into_inner),
        source: text("expenses", "source", &r.source)?,
        created_by: r.created_by.into_inner(),
        created_at: r.created_at,
    })
}

pub(crate) fn expense_row(m: expenses::Model) -> StoreResult<Row> {
    Ok(Row::Expense(Expense {
        id: ExpenseId::from_uuid(m.id),
        expense_date: m.expense_date,
        amount: m.amount,
        source: parse("expenses", "source", &m.source)?,
        category: m.category,
        description: m.description,
        expense_account_id: AccountId::from_uuid(m.expense_account_id),
        paid_from_account_id: AccountId::from_uuid(m.paid_from_account_id),
        season_id: m.season_id.map(SeasonId::from_uuid),
        created_by: UserId::from_uuid(m.created_by),
        created_at: m.created_at,
    }))
}

pub(crate) fn transformation_model(r: &Transformation) -> transformations::Model {
    transformations::Model {
        id: r.id.into_inner(),
        transform_date: r.transform_date,
        input_crop_id: r.input_crop_id.into_inner(),
        input_qty: r.input_qty,
        output_crop_id: r.output_crop_id.into_inner(),
        output_qty: r.output_qty,
        input_cost: r.input_cost,
        output_cost_per_kg: r.output_cost_per_kg,
        output_batch_id: r.output_batch_id.into_inner(),
        notes: r.notes.clone(),
        created_by: r.created_by.into_inner(),
        created_at: r.created_at,
    }
}

pub(crate) fn transformation_row(m: transformations::Model) -> Row {
    Row::Transformation(Transformation {
        id: TransformationId::from_uuid(m.id),
        transform_date: m.transform_date,
        input_crop_id: CropId::from_uuid(m.input_crop_id),
        input_qty: m.input_qty,
        output_crop_id: CropId::from_uuid(m.output_crop_id),
        output_qty: m.output_qty,
        input_cost: m.input_cost,
        output_cost_per_kg: m.output_cost_per_kg,
        output_batch_id: BatchId::from_uuid(m.output_batch_id),
        notes: m.notes,
        created_by: UserId::from_uuid(m.created_by),
        created_at: m.created_at,
    })
}

// ============================================================================
// Seasons and audit
// ============================================================================

pub(crate) fn season_model(r: &Season) -> StoreResult<seasons::Model> {
    Ok(seasons::Model {
        id: r.id.into_inner(),
        name: r.name.clone(),
        start_date: r.start_date,
        end_date: r.end_date,
        status: text("seasons", "status", &r.status)?,
        closed_at: r.closed_at,
        closing_net_profit: r.closing_net_profit,
        created_at: r.created_at,
    })
}

pub(crate) fn season_row(m: seasons::Model) -> StoreResult<Row> {
    Ok(Row::Season(Season {
        id: SeasonId::from_uuid(m.id),
        status: parse("seasons", "status", &m.status)?,
        name: m.name,
        start_date: m.start_date,
        end_date: m.end_date,
        closed_at: m.closed_at,
        closing_net_profit: m.closing_net_profit,
        created_at: m.created_at,
    }))
}

pub(crate) fn audit_model(r: &AuditLog) -> StoreResult<audit_logs::Model> {
    Ok(audit_logs::Model {
        id: r.id.into_inner(),
        action: text("audit_logs", "action", &r.action)?,
        entity_kind: r.entity_kind.clone(),
        entity_id: r.entity_id,
        before: r.before.clone(),
        after: r.after.clone(),
        user_id: r.user_id.into_inner(),
        timestamp: r.timestamp,
    })
}

pub(crate) fn audit_row(m: audit_logs::Model) -> StoreResult<Row> {
    Ok(Row::Audit(AuditLog {
        id: AuditLogId::from_uuid(m.id),
        action: parse("audit_logs", "action", &m.action)?,
        entity_kind: m.entity_kind,
        entity_id: m.entity_id,
        before: m.before,
        after: m.after,
        user_id: UserId::from_uuid(m.user_id),
        timestamp: m.timestamp,
    }))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{NaiveDate, Utc};
    use granary_core::accounts::AccountKind;
    use granary_core::calculation::FormulaKey;
    use granary_core::events::{PaymentStatus, TransactionType};
    use granary_core::ledger::{EventKind, SourceKind};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn test_enum_columns_use_wire_names() {
        assert_eq!(text("t", "c", &PaymentStatus::Partial).unwrap(), "PARTIAL");
        assert_eq!(text("t", "c", &AccountKind::Receivable).unwrap(), "RECEIVABLE");
        assert_eq!(text("t", "c", &TransactionType::General).unwrap(), "GENERAL");
        let status: PaymentStatus = parse("t", "c", "PAID").unwrap();
        assert_eq!(status, PaymentStatus::Paid);
    }

    #[test]
    fn test_unknown_enum_is_decode_error() {
        let err = parse::<PaymentStatus>("sales", "payment_status", "LATE").unwrap_err();
        assert!(matches!(
            err,
            StoreError::Decode { table: "sales", column: "payment_status", .. }
        ));
    }

    #[test]
    fn test_reversal_source_kind_survives() {
        let leg = LedgerEntry {
            id: LedgerEntryId::new(),
            entry_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            account_id: AccountId::new(),
            debit: Decimal::ZERO,
            credit: dec!(125.5),
            description: "undo".into(),
            source_kind: SourceKind::of(EventKind::SaleCogs).reversed(),
            source_id: Uuid::now_v7(),
            reversal_of: Some(LedgerEntryId::new()),
            created_by: UserId::new(),
            created_at: Utc::now(),
        };

        let model = ledger_model(&leg).unwrap();
        assert_eq!(model.source_kind, "SALE_COGS_REVERSAL");
        assert_eq!(ledger_row(model).unwrap(), Row::LedgerEntry(leg));
    }

    #[test]
    fn test_crop_factors_stored_as_json() {
        let crop = Crop {
            id: CropId::new(),
            name: "Wheat".into(),
            pricing_units: vec!["ardeb".into()],
            conversion_factors: BTreeMap::from([("ardeb".to_string(), dec!(150))]),
            is_active: true,
            is_complex_unit: true,
            default_tare_per_bag: dec!(2),
            standard_unit_weight: None,
            created_at: Utc::now(),
        };

        let model = crop_model(&crop).unwrap();
        assert_eq!(model.pricing_units, serde_json::json!(["ardeb"]));
        assert_eq!(crop_row(model).unwrap(), Row::Crop(crop));
    }

    #[test]
    fn test_purchase_formula_column() {
        let purchase = Purchase {
            id: PurchaseId::new(),
            crop_id: CropId::new(),
            supplier_id: ContactId::new(),
            season_id: None,
            purchase_date: NaiveDate::from_ymd_opt(2025, 1, 5).unwrap(),
            net_quantity_kg: dec!(2375),
            unit_price: dec!(2000),
            total_cost: dec!(120634.9206),
            gross_quantity: dec!(2400),
            tare_weight: dec!(25),
            bag_count: 10,
            pricing_unit: "qantar_government".into(),
            conversion_factor: dec!(157.5),
            calculation_formula: FormulaKey::QantarGovernment,
            amount_paid: Decimal::ZERO,
            payment_status: PaymentStatus::Pending,
            returned_qty: Decimal::ZERO,
            returned_cost: Decimal::ZERO,
            batch_id: BatchId::new(),
            notes: None,
            created_by: UserId::new(),
            created_at: Utc::now(),
        };

        let model = purchase_model(&purchase).unwrap();
        assert_eq!(model.calculation_formula, "qantar_government");
        assert_eq!(model.payment_status, "PENDING");
        assert_eq!(purchase_row(model).unwrap(), Row::Purchase(purchase));
    }
}
