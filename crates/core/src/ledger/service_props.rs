//! Property-based tests for LedgerService.
//!
//! - Every posted group nets to zero
//! - Running balances agree with a replay of the legs
//! - A reversal returns every touched account to where it started

use granary_shared::types::AccountId;
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::balance::balance_from_legs;
use super::entry::{EventKind, SourceKind};
use super::service::LedgerService;
use super::validation::PostingLeg;
use crate::settings::{AccountRole, SettingsResolver};
use crate::store::Book;
use crate::testing::{Fixture, day};

/// Strategy to generate positive decimal amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to pick a debit-side role.
fn debit_role() -> impl Strategy<Value = AccountRole> {
    prop_oneof![
        Just(AccountRole::Cash),
        Just(AccountRole::Receivable),
        Just(AccountRole::GeneralExpenses),
        Just(AccountRole::InventoryLoss),
    ]
}

fn account(book: &Book, role: AccountRole) -> AccountId {
    SettingsResolver::resolve_uncached(book, role).unwrap()
}

/// Debits spread over roles, one balancing credit to owner equity.
fn journal_legs(book: &Book, parts: &[(AccountRole, Decimal)]) -> Vec<PostingLeg> {
    let total: Decimal = parts.iter().map(|(_, amount)| *amount).sum();
    let mut legs: Vec<PostingLeg> = parts
        .iter()
        .map(|(role, amount)| PostingLeg::debit(account(book, *role), *amount, "part"))
        .collect();
    legs.push(PostingLeg::credit(
        account(book, AccountRole::OwnerEquity),
        total,
        "contribution",
    ));
    legs
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A posted group always nets to zero and keeps the book balanced.
    #[test]
    fn prop_posted_group_nets_to_zero(
        parts in prop::collection::vec((debit_role(), positive_amount()), 1..6)
    ) {
        let mut fx = Fixture::new();
        let legs = journal_legs(fx.book(), &parts);
        let source_id = Uuid::now_v7();

        let posted = fx
            .run(|uow| {
                LedgerService::post(
                    uow,
                    day(2, 1),
                    SourceKind::of(EventKind::Journal),
                    source_id,
                    legs,
                )
            })
            .unwrap();

        let net: Decimal = posted.iter().map(super::entry::LedgerEntry::signed_amount).sum();
        prop_assert_eq!(net, Decimal::ZERO);
        prop_assert_eq!(posted.len(), parts.len() + 1);
        fx.assert_consistent();
    }

    /// Each account's running balance equals a replay of its legs.
    #[test]
    fn prop_running_balance_matches_replay(
        groups in prop::collection::vec(
            prop::collection::vec((debit_role(), positive_amount()), 1..4),
            1..5,
        )
    ) {
        let mut fx = Fixture::new();
        for parts in &groups {
            let legs = journal_legs(fx.book(), parts);
            fx.run(|uow| {
                LedgerService::post(
                    uow,
                    day(2, 1),
                    SourceKind::of(EventKind::Journal),
                    Uuid::now_v7(),
                    legs,
                )
            })
            .unwrap();
        }

        for acct in fx.book().accounts() {
            let replay = balance_from_legs(fx.book().ledger_entries(), acct.id, None, None);
            prop_assert_eq!(acct.balance, replay.balance(acct.normal_side()));
        }
    }

    /// Reversing a group puts every touched account back to zero.
    #[test]
    fn prop_reversal_restores_balances(
        parts in prop::collection::vec((debit_role(), positive_amount()), 1..6)
    ) {
        let mut fx = Fixture::new();
        let legs = journal_legs(fx.book(), &parts);
        let source_id = Uuid::now_v7();
        let kind = SourceKind::of(EventKind::Journal);
        fx.run(|uow| LedgerService::post(uow, day(2, 1), kind, source_id, legs)).unwrap();

        let reversed = fx
            .run(|uow| LedgerService::reverse(uow, kind, source_id, day(2, 3)))
            .unwrap();

        prop_assert_eq!(reversed.len(), parts.len() + 1);
        prop_assert!(reversed.iter().all(|leg| leg.source_kind == kind.reversed()));
        for acct in fx.book().accounts() {
            prop_assert_eq!(acct.balance, Decimal::ZERO);
        }
        let again = fx.run(|uow| LedgerService::reverse(uow, kind, source_id, day(2, 4)));
        prop_assert!(again.is_err());
    }
}
