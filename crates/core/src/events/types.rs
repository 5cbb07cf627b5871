//! Event rows and composer requests.

use chrono::{DateTime, NaiveDate, Utc};
use granary_shared::types::{
    AccountId, AdjustmentId, BatchId, CapitalAllocationId, ContactId, CropId, ExpenseId,
    PaymentId, PurchaseId, PurchaseReturnId, SaleId, SaleReturnId, SeasonId, TransformationId,
    UserId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculation::FormulaKey;
use crate::ledger::PostingLeg;

/// Settlement state of a purchase or sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Nothing settled.
    Pending,
    /// Partly settled.
    Partial,
    /// Fully settled.
    Paid,
}

impl PaymentStatus {
    /// Derives the status from the settled amount and the total.
    #[must_use]
    pub fn derive(settled: Decimal, total: Decimal) -> Self {
        if settled >= total && settled > Decimal::ZERO {
            Self::Paid
        } else if settled > Decimal::ZERO {
            Self::Partial
        } else if total <= Decimal::ZERO {
            Self::Paid
        } else {
            Self::Pending
        }
    }

    /// Stable storage code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Partial => "PARTIAL",
            Self::Paid => "PAID",
        }
    }
}

/// Physical and pricing payload shared by purchases and sales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityInput {
    /// Trading-unit formula.
    pub formula: FormulaKey,
    /// Gross weight in kg.
    pub gross_weight_kg: Decimal,
    /// Number of bags.
    pub bag_count: i64,
    /// Tare per bag; defaults to the crop's default tare.
    pub tare_per_bag_kg: Option<Decimal>,
    /// Price per trading unit.
    pub unit_price: Decimal,
    /// Pricing unit label; a unit with a crop conversion factor overrides the formula factor.
    pub pricing_unit: Option<String>,
}

impl QuantityInput {
    /// A plain kilogram payload.
    #[must_use]
    pub fn kg(quantity_kg: Decimal, price_per_kg: Decimal) -> Self {
        Self {
            formula: FormulaKey::Kg,
            gross_weight_kg: quantity_kg,
            bag_count: 0,
            tare_per_bag_kg: None,
            unit_price: price_per_kg,
            pricing_unit: None,
        }
    }
}

/// A purchase from a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    /// Purchase id.
    pub id: PurchaseId,
    /// Crop bought.
    pub crop_id: CropId,
    /// Supplier.
    pub supplier_id: ContactId,
    /// Season tag.
    pub season_id: Option<SeasonId>,
    /// Purchase date.
    pub purchase_date: NaiveDate,
    /// Stock weight still attributed to the purchase.
    pub net_quantity_kg: Decimal,
    /// Price per trading unit.
    pub unit_price: Decimal,
    /// Invoice total still attributed to the purchase.
    pub total_cost: Decimal,
    /// Gross weight.
    pub gross_quantity: Decimal,
    /// Total tare.
    pub tare_weight: Decimal,
    /// Bags.
    pub bag_count: i64,
    /// Pricing unit label.
    pub pricing_unit: String,
    /// Factor applied.
    pub conversion_factor: Decimal,
    /// Formula applied.
    pub calculation_formula: FormulaKey,
    /// Settled so far.
    pub amount_paid: Decimal,
    /// Derived settlement state.
    pub payment_status: PaymentStatus,
    /// Quantity returned to the supplier.
    pub returned_qty: Decimal,
    /// Cost returned to the supplier.
    pub returned_cost: Decimal,
    /// Batch created by the purchase.
    pub batch_id: BatchId,
    /// Free text.
    pub notes: Option<String>,
    /// Author.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Input for [`crate::events::PurchaseService::record`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRequest {
    /// Crop bought.
    pub crop_id: CropId,
    /// Supplier.
    pub supplier_id: ContactId,
    /// Purchase date.
    pub purchase_date: NaiveDate,
    /// Season tag; defaults to the active season.
    pub season_id: Option<SeasonId>,
    /// Physical and pricing payload.
    pub quantity: QuantityInput,
    /// Paid on the spot.
    pub amount_paid: Decimal,
    /// Method of the inline payment.
    pub payment_method: Option<String>,
    /// Batch expiry.
    pub expiry_date: Option<NaiveDate>,
    /// Free text.
    pub notes: Option<String>,
}

/// A sale to a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    /// Sale id.
    pub id: SaleId,
    /// Crop sold.
    pub crop_id: CropId,
    /// Customer.
    pub customer_id: ContactId,
    /// Season tag.
    pub season_id: Option<SeasonId>,
    /// Sale date.
    pub sale_date: NaiveDate,
    /// Stock weight still attributed to the sale.
    pub quantity_sold_kg: Decimal,
    /// Price per trading unit.
    pub selling_unit_price: Decimal,
    /// Pricing unit label.
    pub selling_pricing_unit: String,
    /// Factor applied.
    pub selling_factor: Decimal,
    /// Invoice total still attributed to the sale.
    pub total_sale_amount: Decimal,
    /// Settled so far.
    pub amount_received: Decimal,
    /// Derived settlement state.
    pub payment_status: PaymentStatus,
    /// Gross weight.
    pub gross_quantity: Decimal,
    /// Total tare.
    pub tare_weight: Decimal,
    /// Bags.
    pub bag_count: i64,
    /// Formula applied.
    pub calculation_formula: FormulaKey,
    /// FIFO cost still attributed to the sale.
    pub cogs_total: Decimal,
    /// Quantity returned by the customer.
    pub returned_qty: Decimal,
    /// Refunds granted on returns.
    pub returned_amount: Decimal,
    /// Free text.
    pub notes: Option<String>,
    /// Author.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Input for [`crate::events::SaleService::record`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRequest {
    /// Crop sold.
    pub crop_id: CropId,
    /// Customer.
    pub customer_id: ContactId,
    /// Sale date.
    pub sale_date: NaiveDate,
    /// Season tag; defaults to the active season.
    pub season_id: Option<SeasonId>,
    /// Physical and pricing payload.
    pub quantity: QuantityInput,
    /// Stock to consume; defaults to the calculated stock weight.
    pub quantity_sold_kg: Option<Decimal>,
    /// Received on the spot.
    pub amount_received: Decimal,
    /// Method of the inline payment.
    pub payment_method: Option<String>,
    /// Free text.
    pub notes: Option<String>,
}

/// What a payment settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// A sale.
    Sale,
    /// A purchase.
    Purchase,
    /// Nothing in particular.
    General,
}

impl TransactionType {
    /// Stable storage code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sale => "SALE",
            Self::Purchase => "PURCHASE",
            Self::General => "GENERAL",
        }
    }
}

/// How a payment row came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentOrigin {
    /// Recorded on its own.
    Standalone,
    /// Composed by a purchase or sale.
    Inline,
    /// Quick cash receipt.
    QuickReceipt,
    /// Quick cash payment.
    QuickPayment,
}

impl PaymentOrigin {
    /// Stable storage code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standalone => "STANDALONE",
            Self::Inline => "INLINE",
            Self::QuickReceipt => "QUICK_RECEIPT",
            Self::QuickPayment => "QUICK_PAYMENT",
        }
    }
}

/// A settlement between two accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Payment id.
    pub id: PaymentId,
    /// Payment date.
    pub payment_date: NaiveDate,
    /// Amount.
    pub amount: Decimal,
    /// Counterparty.
    pub contact_id: Option<ContactId>,
    /// Cash, transfer, cheque...
    pub method: String,
    /// Account credited.
    pub credit_account_id: AccountId,
    /// Account debited.
    pub debit_account_id: AccountId,
    /// What it settles.
    pub transaction_type: TransactionType,
    /// Settled sale or purchase.
    pub transaction_id: Option<Uuid>,
    /// How the row came to exist.
    pub origin: PaymentOrigin,
    /// Free text.
    pub notes: Option<String>,
    /// Author.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Input for [`crate::events::PaymentService::record`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Payment date.
    pub payment_date: NaiveDate,
    /// Amount.
    pub amount: Decimal,
    /// Counterparty.
    pub contact_id: Option<ContactId>,
    /// Method label.
    pub method: String,
    /// Account debited.
    pub debit_account_id: AccountId,
    /// Account credited.
    pub credit_account_id: AccountId,
    /// What it settles.
    pub transaction_type: TransactionType,
    /// Settled sale or purchase.
    pub transaction_id: Option<Uuid>,
    /// Free text.
    pub notes: Option<String>,
}

/// Goods returned by a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleReturn {
    /// Return id.
    pub id: SaleReturnId,
    /// Original sale.
    pub sale_id: SaleId,
    /// Return date.
    pub return_date: NaiveDate,
    /// Quantity returned.
    pub returned_qty: Decimal,
    /// Reason given.
    pub reason: Option<String>,
    /// Revenue reversed.
    pub refund_amount: Decimal,
    /// Cost per kg of the restock batch.
    pub cost_per_kg: Decimal,
    /// Total cost put back into stock.
    pub restocked_cost: Decimal,
    /// Whether the restocked cost was moved out of COGS.
    pub reverses_cogs: bool,
    /// Restock batch.
    pub batch_id: BatchId,
    /// Author.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Input for [`crate::events::ReturnService::record_sale_return`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleReturnRequest {
    /// Original sale.
    pub sale_id: SaleId,
    /// Return date.
    pub return_date: NaiveDate,
    /// Quantity returned.
    pub returned_qty: Decimal,
    /// Reason given.
    pub reason: Option<String>,
}

/// Goods returned to a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseReturn {
    /// Return id.
    pub id: PurchaseReturnId,
    /// Original purchase.
    pub purchase_id: PurchaseId,
    /// Return date.
    pub return_date: NaiveDate,
    /// Quantity returned.
    pub returned_qty: Decimal,
    /// Reason given.
    pub reason: Option<String>,
    /// Cost taken off the payable.
    pub returned_cost: Decimal,
    /// Gross weight taken out of physical stock.
    pub gross_returned: Decimal,
    /// Bags taken out of physical stock.
    pub bags_returned: i64,
    /// Author.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Input for [`crate::events::ReturnService::record_purchase_return`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseReturnRequest {
    /// Original purchase.
    pub purchase_id: PurchaseId,
    /// Return date.
    pub return_date: NaiveDate,
    /// Quantity returned.
    pub returned_qty: Decimal,
    /// Reason given.
    pub reason: Option<String>,
}

/// Kind of stock count correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentType {
    /// Counted less than booked.
    Shortage,
    /// Counted more than booked.
    Surplus,
    /// Goods spoiled.
    Spoilage,
}

impl AdjustmentType {
    /// Stable storage code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Shortage => "SHORTAGE",
            Self::Surplus => "SURPLUS",
            Self::Spoilage => "SPOILAGE",
        }
    }

    /// True when the adjustment removes stock.
    #[must_use]
    pub fn is_outbound(self) -> bool {
        matches!(self, Self::Shortage | Self::Spoilage)
    }
}

/// A stock count correction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryAdjustment {
    /// Adjustment id.
    pub id: AdjustmentId,
    /// Crop adjusted.
    pub crop_id: CropId,
    /// Adjustment date.
    pub adjustment_date: NaiveDate,
    /// Kind.
    pub adjustment_type: AdjustmentType,
    /// Signed quantity: negative for shortage and spoilage.
    pub quantity: Decimal,
    /// Average cost captured at the time.
    pub cost_per_kg: Decimal,
    /// Posted value.
    pub total_value: Decimal,
    /// Batch created by a surplus.
    pub batch_id: Option<BatchId>,
    /// Season tag.
    pub season_id: Option<SeasonId>,
    /// Free text.
    pub notes: Option<String>,
    /// Author.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Input for [`crate::events::AdjustmentService::record`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentRequest {
    /// Crop adjusted.
    pub crop_id: CropId,
    /// Adjustment date.
    pub adjustment_date: NaiveDate,
    /// Kind.
    pub adjustment_type: AdjustmentType,
    /// Unsigned quantity in kg.
    pub quantity_kg: Decimal,
    /// Season tag; defaults to the active season.
    pub season_id: Option<SeasonId>,
    /// Free text.
    pub notes: Option<String>,
}

/// Direction of a capital movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CapitalType {
    /// Owner puts money in.
    Contribution,
    /// Owner takes money out.
    Withdrawal,
}

impl CapitalType {
    /// Stable storage code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Contribution => "CONTRIBUTION",
            Self::Withdrawal => "WITHDRAWAL",
        }
    }
}

/// An owner capital movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapitalAllocation {
    /// Allocation id.
    pub id: CapitalAllocationId,
    /// Movement date.
    pub allocation_date: NaiveDate,
    /// Direction.
    pub allocation_type: CapitalType,
    /// Amount.
    pub amount: Decimal,
    /// Owner name.
    pub owner_name: String,
    /// Season tag.
    pub season_id: Option<SeasonId>,
    /// Free text.
    pub notes: Option<String>,
    /// Author.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Input for capital contributions and withdrawals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapitalRequest {
    /// Movement date.
    pub allocation_date: NaiveDate,
    /// Amount.
    pub amount: Decimal,
    /// Owner name.
    pub owner_name: String,
    /// Season tag; defaults to the active season.
    pub season_id: Option<SeasonId>,
    /// Free text.
    pub notes: Option<String>,
}

/// How an expense row came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpenseSource {
    /// Recorded with explicit accounts.
    Recorded,
    /// Quick expense from cash.
    Quick,
}

impl ExpenseSource {
    /// Stable storage code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Recorded => "RECORDED",
            Self::Quick => "QUICK",
        }
    }
}

/// An operating expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    /// Expense id.
    pub id: ExpenseId,
    /// Expense date.
    pub expense_date: NaiveDate,
    /// Amount.
    pub amount: Decimal,
    /// Category label.
    pub category: String,
    /// Description.
    pub description: String,
    /// Account debited.
    pub expense_account_id: AccountId,
    /// Account credited.
    pub paid_from_account_id: AccountId,
    /// Season tag.
    pub season_id: Option<SeasonId>,
    /// How the row came to exist.
    pub source: ExpenseSource,
    /// Author.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Input for [`crate::events::CashService::record_expense`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRequest {
    /// Expense date.
    pub expense_date: NaiveDate,
    /// Amount.
    pub amount: Decimal,
    /// Category label.
    pub category: String,
    /// Description.
    pub description: String,
    /// Account debited; defaults to general expenses.
    pub expense_account_id: Option<AccountId>,
    /// Account credited; defaults to cash.
    pub paid_from_account_id: Option<AccountId>,
    /// Season tag; defaults to the active season.
    pub season_id: Option<SeasonId>,
}

/// Input for quick cash receipts, payments and expenses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickCashRequest {
    /// Date.
    pub date: NaiveDate,
    /// Amount.
    pub amount: Decimal,
    /// Counterparty.
    pub contact_id: Option<ContactId>,
    /// Method label.
    pub method: Option<String>,
    /// Description.
    pub description: String,
}

/// Input for manual journals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalRequest {
    /// Posting date.
    pub entry_date: NaiveDate,
    /// Legs, already balanced.
    pub legs: Vec<PostingLeg>,
}

/// Input for opening stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningStockRequest {
    /// Crop.
    pub crop_id: CropId,
    /// Stock date.
    pub date: NaiveDate,
    /// Quantity in kg.
    pub quantity_kg: Decimal,
    /// Cost per kg.
    pub cost_per_kg: Decimal,
}

/// Conversion of one crop into another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transformation {
    /// Transformation id.
    pub id: TransformationId,
    /// Date.
    pub transform_date: NaiveDate,
    /// Consumed crop.
    pub input_crop_id: CropId,
    /// Consumed kg.
    pub input_qty: Decimal,
    /// Produced crop.
    pub output_crop_id: CropId,
    /// Produced kg.
    pub output_qty: Decimal,
    /// FIFO cost of the input.
    pub input_cost: Decimal,
    /// Cost per kg of the output batch.
    pub output_cost_per_kg: Decimal,
    /// Output batch.
    pub output_batch_id: BatchId,
    /// Free text.
    pub notes: Option<String>,
    /// Author.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Input for [`crate::events::StockService::transform`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformRequest {
    /// Date.
    pub transform_date: NaiveDate,
    /// Consumed crop.
    pub input_crop_id: CropId,
    /// Consumed kg.
    pub input_qty: Decimal,
    /// Produced crop.
    pub output_crop_id: CropId,
    /// Produced kg.
    pub output_qty: Decimal,
    /// Free text.
    pub notes: Option<String>,
}
