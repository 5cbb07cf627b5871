//! Initial schema: one table per kernel entity.
//!
//! Foreign keys are `DEFERRABLE INITIALLY DEFERRED` because a change set
//! is written in first-touch order, which can put a child row before its
//! parent inside the same transaction.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(TABLES_SQL).await?;
        db.execute_unprepared(INDEXES_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const TABLES_SQL: &str = r"
CREATE TABLE financial_accounts (
    id UUID PRIMARY KEY,
    name VARCHAR(200) NOT NULL,
    account_type VARCHAR(20) NOT NULL CHECK (account_type IN (
        'ASSET', 'CASH', 'INVENTORY', 'RECEIVABLE', 'LIABILITY',
        'PAYABLE', 'EQUITY', 'REVENUE', 'EXPENSE'
    )),
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE ledger_entries (
    id UUID PRIMARY KEY,
    entry_date DATE NOT NULL,
    account_id UUID NOT NULL REFERENCES financial_accounts(id) DEFERRABLE INITIALLY DEFERRED,
    debit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    credit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    description TEXT NOT NULL,
    source_kind VARCHAR(40) NOT NULL,
    source_id UUID NOT NULL,
    reversal_of UUID,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_one_side CHECK (
        debit >= 0 AND credit >= 0 AND ((debit > 0) <> (credit > 0))
    )
);

CREATE TABLE settings (
    key VARCHAR(100) PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE crops (
    id UUID PRIMARY KEY,
    name VARCHAR(200) NOT NULL UNIQUE,
    pricing_units JSONB NOT NULL DEFAULT '[]',
    conversion_factors JSONB NOT NULL DEFAULT '{}',
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    is_complex_unit BOOLEAN NOT NULL DEFAULT FALSE,
    default_tare_per_bag NUMERIC(19, 4) NOT NULL DEFAULT 0,
    standard_unit_weight NUMERIC(19, 4),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE inventories (
    crop_id UUID PRIMARY KEY REFERENCES crops(id) DEFERRABLE INITIALLY DEFERRED,
    current_stock_kg NUMERIC(19, 4) NOT NULL DEFAULT 0,
    net_stock_kg NUMERIC(19, 4) NOT NULL DEFAULT 0 CHECK (net_stock_kg >= 0),
    gross_stock_kg NUMERIC(19, 4) NOT NULL DEFAULT 0,
    bag_count BIGINT NOT NULL DEFAULT 0,
    average_cost_per_kg NUMERIC(19, 4) NOT NULL DEFAULT 0,
    low_stock_threshold_kg NUMERIC(19, 4) NOT NULL DEFAULT 100,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE contacts (
    id UUID PRIMARY KEY,
    name VARCHAR(200) NOT NULL,
    phone VARCHAR(50),
    email VARCHAR(200),
    address TEXT,
    is_supplier BOOLEAN NOT NULL DEFAULT FALSE,
    is_customer BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_contact_role CHECK (is_supplier OR is_customer)
);

CREATE TABLE seasons (
    id UUID PRIMARY KEY,
    name VARCHAR(200) NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    status VARCHAR(20) NOT NULL CHECK (status IN ('UPCOMING', 'ACTIVE', 'COMPLETED')),
    closed_at TIMESTAMPTZ,
    closing_net_profit NUMERIC(19, 4),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_season_dates CHECK (end_date >= start_date)
);

CREATE TABLE inventory_batches (
    id UUID PRIMARY KEY,
    crop_id UUID NOT NULL REFERENCES crops(id) DEFERRABLE INITIALLY DEFERRED,
    original_qty NUMERIC(19, 4) NOT NULL,
    remaining_qty NUMERIC(19, 4) NOT NULL CHECK (remaining_qty >= 0),
    cost_per_kg NUMERIC(19, 4) NOT NULL,
    purchase_date DATE NOT NULL,
    purchase_id UUID,
    supplier_id UUID REFERENCES contacts(id) DEFERRABLE INITIALLY DEFERRED,
    expiry_date DATE,
    origin VARCHAR(30) NOT NULL,
    origin_id UUID NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE purchases (
    id UUID PRIMARY KEY,
    crop_id UUID NOT NULL REFERENCES crops(id) DEFERRABLE INITIALLY DEFERRED,
    supplier_id UUID NOT NULL REFERENCES contacts(id) DEFERRABLE INITIALLY DEFERRED,
    season_id UUID REFERENCES seasons(id) DEFERRABLE INITIALLY DEFERRED,
    purchase_date DATE NOT NULL,
    net_quantity_kg NUMERIC(19, 4) NOT NULL,
    unit_price NUMERIC(19, 4) NOT NULL,
    total_cost NUMERIC(19, 4) NOT NULL,
    gross_quantity NUMERIC(19, 4) NOT NULL,
    tare_weight NUMERIC(19, 4) NOT NULL DEFAULT 0,
    bag_count BIGINT NOT NULL DEFAULT 0,
    pricing_unit VARCHAR(50) NOT NULL,
    conversion_factor NUMERIC(19, 4) NOT NULL,
    calculation_formula VARCHAR(30) NOT NULL,
    amount_paid NUMERIC(19, 4) NOT NULL DEFAULT 0,
    payment_status VARCHAR(20) NOT NULL CHECK (payment_status IN ('PENDING', 'PARTIAL', 'PAID')),
    returned_qty NUMERIC(19, 4) NOT NULL DEFAULT 0,
    returned_cost NUMERIC(19, 4) NOT NULL DEFAULT 0,
    batch_id UUID NOT NULL REFERENCES inventory_batches(id) DEFERRABLE INITIALLY DEFERRED,
    notes TEXT,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE sales (
    id UUID PRIMARY KEY,
    crop_id UUID NOT NULL REFERENCES crops(id) DEFERRABLE INITIALLY DEFERRED,
    customer_id UUID NOT NULL REFERENCES contacts(id) DEFERRABLE INITIALLY DEFERRED,
    season_id UUID REFERENCES seasons(id) DEFERRABLE INITIALLY DEFERRED,
    sale_date DATE NOT NULL,
    quantity_sold_kg NUMERIC(19, 4) NOT NULL,
    selling_unit_price NUMERIC(19, 4) NOT NULL,
    selling_pricing_unit VARCHAR(50) NOT NULL,
    selling_factor NUMERIC(19, 4) NOT NULL,
    total_sale_amount NUMERIC(19, 4) NOT NULL,
    amount_received NUMERIC(19, 4) NOT NULL DEFAULT 0,
    payment_status VARCHAR(20) NOT NULL CHECK (payment_status IN ('PENDING', 'PARTIAL', 'PAID')),
    gross_quantity NUMERIC(19, 4) NOT NULL,
    tare_weight NUMERIC(19, 4) NOT NULL DEFAULT 0,
    bag_count BIGINT NOT NULL DEFAULT 0,
    calculation_formula VARCHAR(30) NOT NULL,
    cogs_total NUMERIC(19, 4) NOT NULL,
    returned_qty NUMERIC(19, 4) NOT NULL DEFAULT 0,
    returned_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    notes TEXT,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE stock_consumptions (
    id UUID PRIMARY KEY,
    consumer_kind VARCHAR(30) NOT NULL,
    consumer_id UUID NOT NULL,
    batch_id UUID NOT NULL REFERENCES inventory_batches(id) DEFERRABLE INITIALLY DEFERRED,
    quantity_kg NUMERIC(19, 4) NOT NULL CHECK (quantity_kg > 0),
    cost_per_kg NUMERIC(19, 4) NOT NULL,
    consumed_on DATE NOT NULL
);

CREATE TABLE payments (
    id UUID PRIMARY KEY,
    payment_date DATE NOT NULL,
    amount NUMERIC(19, 4) NOT NULL CHECK (amount > 0),
    contact_id UUID REFERENCES contacts(id) DEFERRABLE INITIALLY DEFERRED,
    method VARCHAR(50) NOT NULL,
    credit_account_id UUID NOT NULL REFERENCES financial_accounts(id) DEFERRABLE INITIALLY DEFERRED,
    debit_account_id UUID NOT NULL REFERENCES financial_accounts(id) DEFERRABLE INITIALLY DEFERRED,
    transaction_type VARCHAR(20) NOT NULL
        CHECK (transaction_type IN ('SALE', 'PURCHASE', 'GENERAL')),
    transaction_id UUID,
    origin VARCHAR(20) NOT NULL,
    notes TEXT,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE sale_returns (
    id UUID PRIMARY KEY,
    sale_id UUID NOT NULL REFERENCES sales(id) DEFERRABLE INITIALLY DEFERRED,
    return_date DATE NOT NULL,
    returned_qty NUMERIC(19, 4) NOT NULL CHECK (returned_qty > 0),
    reason TEXT,
    refund_amount NUMERIC(19, 4) NOT NULL,
    cost_per_kg NUMERIC(19, 4) NOT NULL,
    restocked_cost NUMERIC(19, 4) NOT NULL,
    reverses_cogs BOOLEAN NOT NULL,
    batch_id UUID NOT NULL REFERENCES inventory_batches(id) DEFERRABLE INITIALLY DEFERRED,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE purchase_returns (
    id UUID PRIMARY KEY,
    purchase_id UUID NOT NULL REFERENCES purchases(id) DEFERRABLE INITIALLY DEFERRED,
    return_date DATE NOT NULL,
    returned_qty NUMERIC(19, 4) NOT NULL CHECK (returned_qty > 0),
    reason TEXT,
    returned_cost NUMERIC(19, 4) NOT NULL,
    gross_returned NUMERIC(19, 4) NOT NULL,
    bags_returned BIGINT NOT NULL DEFAULT 0,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE inventory_adjustments (
    id UUID PRIMARY KEY,
    crop_id UUID NOT NULL REFERENCES crops(id) DEFERRABLE INITIALLY DEFERRED,
    adjustment_date DATE NOT NULL,
    adjustment_type VARCHAR(20) NOT NULL
        CHECK (adjustment_type IN ('SHORTAGE', 'SURPLUS', 'SPOILAGE')),
    quantity NUMERIC(19, 4) NOT NULL,
    cost_per_kg NUMERIC(19, 4) NOT NULL,
    total_value NUMERIC(19, 4) NOT NULL,
    batch_id UUID,
    season_id UUID REFERENCES seasons(id) DEFERRABLE INITIALLY DEFERRED,
    notes TEXT,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE capital_allocations (
    id UUID PRIMARY KEY,
    allocation_date DATE NOT NULL,
    allocation_type VARCHAR(20) NOT NULL CHECK (allocation_type IN ('CONTRIBUTION', 'WITHDRAWAL')),
    amount NUMERIC(19, 4) NOT NULL CHECK (amount > 0),
    owner_name VARCHAR(200) NOT NULL,
    season_id UUID REFERENCES seasons(id) DEFERRABLE INITIALLY DEFERRED,
    notes TEXT,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE expenses (
    id UUID PRIMARY KEY,
    expense_date DATE NOT NULL,
    amount NUMERIC(19, 4) NOT NULL CHECK (amount > 0),
    category VARCHAR(100) NOT NULL,
    description TEXT NOT NULL,
    expense_account_id UUID NOT NULL
        REFERENCES financial_accounts(id) DEFERRABLE INITIALLY DEFERRED,
    paid_from_account_id UUID NOT NULL
        REFERENCES financial_accounts(id) DEFERRABLE INITIALLY DEFERRED,
    season_id UUID REFERENCES seasons(id) DEFERRABLE INITIALLY DEFERRED,
    source VARCHAR(20) NOT NULL,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE transformations (
    id UUID PRIMARY KEY,
    transform_date DATE NOT NULL,
    input_crop_id UUID NOT NULL REFERENCES crops(id) DEFERRABLE INITIALLY DEFERRED,
    input_qty NUMERIC(19, 4) NOT NULL,
    output_crop_id UUID NOT NULL REFERENCES crops(id) DEFERRABLE INITIALLY DEFERRED,
    output_qty NUMERIC(19, 4) NOT NULL,
    input_cost NUMERIC(19, 4) NOT NULL,
    output_cost_per_kg NUMERIC(19, 4) NOT NULL,
    output_batch_id UUID NOT NULL REFERENCES inventory_batches(id) DEFERRABLE INITIALLY DEFERRED,
    notes TEXT,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE audit_logs (
    id UUID PRIMARY KEY,
    action VARCHAR(20) NOT NULL,
    entity_kind VARCHAR(50) NOT NULL,
    entity_id UUID NOT NULL,
    before JSONB,
    after JSONB,
    user_id UUID NOT NULL,
    timestamp TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const INDEXES_SQL: &str = r"
-- Ledger reads: period reports, account ledgers, group lookups
CREATE INDEX idx_ledger_entry_date ON ledger_entries(entry_date);
CREATE INDEX idx_ledger_account ON ledger_entries(account_id);
CREATE INDEX idx_ledger_source ON ledger_entries(source_kind, source_id);

-- FIFO scan
CREATE INDEX idx_batches_fifo ON inventory_batches(crop_id, is_active, purchase_date);

CREATE INDEX idx_sales_date ON sales(sale_date);
CREATE INDEX idx_purchases_date ON purchases(purchase_date);
CREATE INDEX idx_payments_contact ON payments(contact_id);
CREATE INDEX idx_payments_parent ON payments(transaction_type, transaction_id);
CREATE INDEX idx_consumptions_consumer ON stock_consumptions(consumer_kind, consumer_id);
CREATE INDEX idx_audit_entity ON audit_logs(entity_kind, entity_id);
CREATE UNIQUE INDEX idx_seasons_name ON seasons(lower(name));
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS audit_logs CASCADE;
DROP TABLE IF EXISTS transformations CASCADE;
DROP TABLE IF EXISTS expenses CASCADE;
DROP TABLE IF EXISTS capital_allocations CASCADE;
DROP TABLE IF EXISTS inventory_adjustments CASCADE;
DROP TABLE IF EXISTS purchase_returns CASCADE;
DROP TABLE IF EXISTS sale_returns CASCADE;
DROP TABLE IF EXISTS payments CASCADE;
DROP TABLE IF EXISTS stock_consumptions CASCADE;
DROP TABLE IF EXISTS sales CASCADE;
DROP TABLE IF EXISTS purchases CASCADE;
DROP TABLE IF EXISTS inventory_batches CASCADE;
DROP TABLE IF EXISTS seasons CASCADE;
DROP TABLE IF EXISTS contacts CASCADE;
DROP TABLE IF EXISTS inventories CASCADE;
DROP TABLE IF EXISTS crops CASCADE;
DROP TABLE IF EXISTS settings CASCADE;
DROP TABLE IF EXISTS ledger_entries CASCADE;
DROP TABLE IF EXISTS financial_accounts CASCADE;
";
