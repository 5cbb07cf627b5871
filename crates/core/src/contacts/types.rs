//! Contact and statement types.

use chrono::{DateTime, NaiveDate, Utc};
use granary_shared::types::ContactId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A trading partner. Either or both capability flags are set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Contact id.
    pub id: ContactId,
    /// Display name.
    pub name: String,
    /// Phone number.
    pub phone: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Postal address.
    pub address: Option<String>,
    /// We buy from this contact.
    pub is_supplier: bool,
    /// We sell to this contact.
    pub is_customer: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Input for creating or updating a contact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactRequest {
    /// Display name.
    pub name: String,
    /// Phone number.
    pub phone: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Postal address.
    pub address: Option<String>,
    /// Supplier capability.
    pub is_supplier: bool,
    /// Customer capability.
    pub is_customer: bool,
}

/// Kind of event on a statement line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatementLineKind {
    /// Sale to the contact.
    Sale,
    /// Goods the contact returned.
    SaleReturn,
    /// Purchase from the contact.
    Purchase,
    /// Goods we returned to the contact.
    PurchaseReturn,
    /// Cash the contact paid us.
    CashReceived,
    /// Cash we paid the contact.
    CashPaid,
}

/// One statement line.
///
/// `debit` raises what the contact owes us, `credit` lowers it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementLine {
    /// Event date.
    pub date: NaiveDate,
    /// Event kind.
    pub kind: StatementLineKind,
    /// Event id.
    pub reference: Uuid,
    /// Line description.
    pub description: String,
    /// Amount raising the balance.
    pub debit: Decimal,
    /// Amount lowering the balance.
    pub credit: Decimal,
    /// Balance after this line.
    pub running_balance: Decimal,
}

/// Event-derived statement of one contact over a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactStatement {
    /// Contact id.
    pub contact_id: ContactId,
    /// Contact name.
    pub contact_name: String,
    /// First day (inclusive).
    pub start_date: NaiveDate,
    /// Last day (inclusive).
    pub end_date: NaiveDate,
    /// Balance from events strictly before `start_date`.
    pub opening_balance: Decimal,
    /// Lines in date order.
    pub lines: Vec<StatementLine>,
    /// Sum of line debits.
    pub total_debit: Decimal,
    /// Sum of line credits.
    pub total_credit: Decimal,
    /// Balance after the last line. Positive means the contact owes us.
    pub closing_balance: Decimal,
}

/// One contact's outstanding balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDebt {
    /// Contact id.
    pub contact_id: ContactId,
    /// Contact name.
    pub contact_name: String,
    /// Event-derived balance.
    pub balance: Decimal,
}

/// Every contact's balance split by direction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DebtSummary {
    /// Contacts that owe us.
    pub receivables: Vec<ContactDebt>,
    /// Contacts we owe, with positive amounts.
    pub payables: Vec<ContactDebt>,
    /// Sum of receivables.
    pub total_receivable: Decimal,
    /// Sum of payables.
    pub total_payable: Decimal,
}
