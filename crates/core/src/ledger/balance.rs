//! Account balances derived from ledger legs.

use chrono::NaiveDate;
use granary_shared::types::AccountId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::entry::LedgerEntry;
use crate::accounts::NormalSide;

/// Debit and credit totals of one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// The account ID.
    pub account_id: AccountId,
    /// Total debit amount.
    pub debit_total: Decimal,
    /// Total credit amount.
    pub credit_total: Decimal,
}

impl AccountBalance {
    /// Creates a zero balance.
    #[must_use]
    pub fn new(account_id: AccountId) -> Self {
        Self {
            account_id,
            debit_total: Decimal::ZERO,
            credit_total: Decimal::ZERO,
        }
    }

    /// Adds one leg.
    pub fn add(&mut self, debit: Decimal, credit: Decimal) {
        self.debit_total += debit;
        self.credit_total += credit;
    }

    /// Balance in the direction of `side`.
    #[must_use]
    pub fn balance(&self, side: NormalSide) -> Decimal {
        side.balance_change(self.debit_total, self.credit_total)
    }
}

/// Sums the legs of one account, optionally restricted to a date window.
///
/// Both bounds are inclusive.
pub fn balance_from_legs<'a>(
    legs: impl Iterator<Item = &'a LedgerEntry>,
    account_id: AccountId,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> AccountBalance {
    let mut balance = AccountBalance::new(account_id);
    for leg in legs.filter(|leg| leg.account_id == account_id) {
        if from.is_some_and(|start| leg.entry_date < start) {
            continue;
        }
        if to.is_some_and(|end| leg.entry_date > end) {
            continue;
        }
        balance.add(leg.debit, leg.credit);
    }
    balance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::entry::{EventKind, SourceKind};
    use chrono::Utc;
    use granary_shared::types::{LedgerEntryId, UserId};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn leg(account_id: AccountId, day: u32, debit: Decimal, credit: Decimal) -> LedgerEntry {
        LedgerEntry {
            id: LedgerEntryId::new(),
            entry_date: NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
            account_id,
            debit,
            credit,
            description: String::new(),
            source_kind: SourceKind::of(EventKind::Journal),
            source_id: Uuid::nil(),
            reversal_of: None,
            created_by: UserId::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_balance_window() {
        let cash = AccountId::new();
        let other = AccountId::new();
        let legs = vec![
            leg(cash, 1, dec!(100), Decimal::ZERO),
            leg(cash, 5, Decimal::ZERO, dec!(30)),
            leg(other, 5, dec!(999), Decimal::ZERO),
            leg(cash, 9, dec!(10), Decimal::ZERO),
        ];

        let all = balance_from_legs(legs.iter(), cash, None, None);
        assert_eq!(all.balance(NormalSide::Debit), dec!(80));

        let upto = balance_from_legs(
            legs.iter(),
            cash,
            None,
            NaiveDate::from_ymd_opt(2026, 3, 5),
        );
        assert_eq!(upto.debit_total, dec!(100));
        assert_eq!(upto.credit_total, dec!(30));

        let window = balance_from_legs(
            legs.iter(),
            cash,
            NaiveDate::from_ymd_opt(2026, 3, 2),
            NaiveDate::from_ymd_opt(2026, 3, 9),
        );
        assert_eq!(window.balance(NormalSide::Credit), dec!(20));
    }
}
