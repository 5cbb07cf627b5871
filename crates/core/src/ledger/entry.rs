//! Ledger leg and source-kind types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use granary_shared::types::{AccountId, LedgerEntryId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::KernelError;

const REVERSAL_SUFFIX: &str = "_REVERSAL";

/// The business event behind a posting group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Stock bought from a supplier.
    Purchase,
    /// Revenue side of a sale.
    Sale,
    /// Cost side of a sale.
    SaleCogs,
    /// Cash or account settlement.
    Payment,
    /// Goods returned by a customer.
    SaleReturn,
    /// Goods returned to a supplier.
    PurchaseReturn,
    /// Shortage, spoilage or surplus.
    Adjustment,
    /// Owner puts money in.
    CapitalContribution,
    /// Owner takes money out.
    CapitalWithdrawal,
    /// Quick cash receipt.
    CashReceipt,
    /// Quick cash payment.
    CashPayment,
    /// Quick expense.
    QuickExpense,
    /// Recorded expense.
    Expense,
    /// Manual journal.
    Journal,
    /// Season profit transfer.
    SeasonClosing,
    /// Stock brought in at go-live.
    OpeningStock,
}

impl EventKind {
    /// Every kind.
    pub const ALL: [Self; 16] = [
        Self::Purchase,
        Self::Sale,
        Self::SaleCogs,
        Self::Payment,
        Self::SaleReturn,
        Self::PurchaseReturn,
        Self::Adjustment,
        Self::CapitalContribution,
        Self::CapitalWithdrawal,
        Self::CashReceipt,
        Self::CashPayment,
        Self::QuickExpense,
        Self::Expense,
        Self::Journal,
        Self::SeasonClosing,
        Self::OpeningStock,
    ];

    /// Stable code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Purchase => "PURCHASE",
            Self::Sale => "SALE",
            Self::SaleCogs => "SALE_COGS",
            Self::Payment => "PAYMENT",
            Self::SaleReturn => "SALE_RETURN",
            Self::PurchaseReturn => "PURCHASE_RETURN",
            Self::Adjustment => "ADJUSTMENT",
            Self::CapitalContribution => "CAPITAL_CONTRIBUTION",
            Self::CapitalWithdrawal => "CAPITAL_WITHDRAWAL",
            Self::CashReceipt => "CASH_RECEIPT",
            Self::CashPayment => "CASH_PAYMENT",
            Self::QuickExpense => "QUICK_EXPENSE",
            Self::Expense => "EXPENSE",
            Self::Journal => "JOURNAL",
            Self::SeasonClosing => "SEASON_CLOSING",
            Self::OpeningStock => "OPENING_STOCK",
        }
    }
}

/// The `source_kind` of a posting group: an event kind, optionally as its reversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceKind {
    /// The underlying event.
    pub event: EventKind,
    /// True for `<EVENT>_REVERSAL` groups.
    pub reversal: bool,
}

impl SourceKind {
    /// A forward posting of `event`.
    #[must_use]
    pub const fn of(event: EventKind) -> Self {
        Self {
            event,
            reversal: false,
        }
    }

    /// The reversal counterpart of this kind.
    #[must_use]
    pub const fn reversed(self) -> Self {
        Self {
            event: self.event,
            reversal: true,
        }
    }
}

impl From<EventKind> for SourceKind {
    fn from(event: EventKind) -> Self {
        Self::of(event)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event.as_str())?;
        if self.reversal {
            f.write_str(REVERSAL_SUFFIX)?;
        }
        Ok(())
    }
}

impl FromStr for SourceKind {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (base, reversal) = match s.strip_suffix(REVERSAL_SUFFIX) {
            Some(base) => (base, true),
            None => (s, false),
        };
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == base)
            .map(|event| Self { event, reversal })
            .ok_or_else(|| {
                KernelError::validation("source_kind", format!("unknown source kind `{s}`"))
            })
    }
}

impl Serialize for SourceKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SourceKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A single posted ledger leg.
///
/// Exactly one of `debit`/`credit` is positive. Legs are never deleted;
/// corrections are compensating reversal legs pointing back through
/// `reversal_of`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique identifier for this leg.
    pub id: LedgerEntryId,
    /// Posting date.
    pub entry_date: NaiveDate,
    /// The account affected by this leg.
    pub account_id: AccountId,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Line description.
    pub description: String,
    /// Event kind of the posting group.
    pub source_kind: SourceKind,
    /// Event id of the posting group.
    pub source_id: Uuid,
    /// The leg this one compensates, for reversal legs.
    pub reversal_of: Option<LedgerEntryId>,
    /// Who posted it.
    pub created_by: UserId,
    /// When it was posted.
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Returns the signed amount (positive for debit, negative for credit).
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.debit - self.credit
    }

    /// True when the leg belongs to the given group.
    #[must_use]
    pub fn in_group(&self, source_kind: SourceKind, source_id: Uuid) -> bool {
        self.source_kind == source_kind && self.source_id == source_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("PURCHASE", EventKind::Purchase, false)]
    #[case("SALE_COGS", EventKind::SaleCogs, false)]
    #[case("SALE_COGS_REVERSAL", EventKind::SaleCogs, true)]
    #[case("CAPITAL_WITHDRAWAL_REVERSAL", EventKind::CapitalWithdrawal, true)]
    #[case("OPENING_STOCK", EventKind::OpeningStock, false)]
    fn test_source_kind_parse(#[case] raw: &str, #[case] event: EventKind, #[case] reversal: bool) {
        let kind: SourceKind = raw.parse().unwrap();
        assert_eq!(kind.event, event);
        assert_eq!(kind.reversal, reversal);
        assert_eq!(kind.to_string(), raw);
    }

    #[test]
    fn test_unknown_source_kind() {
        assert!("REFUND".parse::<SourceKind>().is_err());
        assert!("_REVERSAL".parse::<SourceKind>().is_err());
    }

    #[test]
    fn test_reversed() {
        let kind = SourceKind::of(EventKind::Sale).reversed();
        assert_eq!(kind.to_string(), "SALE_REVERSAL");
    }

    #[test]
    fn test_serde_as_string() {
        let kind = SourceKind::of(EventKind::PurchaseReturn).reversed();
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, "\"PURCHASE_RETURN_REVERSAL\"");
        let back: SourceKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, kind);
    }
}
