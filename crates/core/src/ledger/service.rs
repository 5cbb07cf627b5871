//! Ledger service: posting and reversal.

use std::collections::HashSet;

use chrono::NaiveDate;
use granary_shared::types::{AccountId, LedgerEntryId, round_internal};
use rust_decimal::Decimal;
use tracing::debug;
use uuid::Uuid;

use super::entry::{LedgerEntry, SourceKind};
use super::validation::{PostingLeg, validate_legs};
use crate::error::{KernelError, KernelResult};
use crate::store::{Book, Row, UnitOfWork};

/// Posts and reverses balanced leg groups.
pub struct LedgerService;

impl LedgerService {
    /// Posts one balanced group.
    ///
    /// Amounts are rounded to four digits, the legs are validated, then
    /// each leg is written and its account's running balance moved by the
    /// account's normal side, in leg order.
    ///
    /// # Errors
    ///
    /// See [`validate_legs`].
    pub fn post(
        uow: &mut UnitOfWork<'_>,
        entry_date: NaiveDate,
        source_kind: SourceKind,
        source_id: Uuid,
        legs: Vec<PostingLeg>,
    ) -> KernelResult<Vec<LedgerEntry>> {
        let legs: Vec<PostingLeg> = legs
            .into_iter()
            .map(|leg| PostingLeg {
                debit: round_internal(leg.debit),
                credit: round_internal(leg.credit),
                ..leg
            })
            .collect();

        let book = uow.book();
        let totals = validate_legs(&legs, |id| book.account(id).ok().map(|a| a.is_active))?;

        let entries = Self::write_legs(uow, entry_date, source_kind, source_id, legs, None)?;
        debug!(
            source_kind = %source_kind,
            %source_id,
            legs = entries.len(),
            total = %totals.total_debit,
            "posting group written"
        );
        Ok(entries)
    }

    /// Reverses every outstanding leg of a group.
    ///
    /// Compensating legs swap debit and credit, carry the
    /// `<KIND>_REVERSAL` source kind and point back at the leg they undo.
    /// Legs already compensated by an earlier reversal are skipped, so a
    /// group re-posted under the same id can be reversed again.
    ///
    /// # Errors
    ///
    /// - `Validation` when asked to reverse a reversal, or when nothing
    ///   is left to reverse
    /// - `NotFound` when the group has no legs
    pub fn reverse(
        uow: &mut UnitOfWork<'_>,
        source_kind: SourceKind,
        source_id: Uuid,
        reversal_date: NaiveDate,
    ) -> KernelResult<Vec<LedgerEntry>> {
        if source_kind.reversal {
            return Err(KernelError::validation(
                "source_kind",
                "a reversal group cannot itself be reversed",
            ));
        }
        let originals: Vec<LedgerEntry> = Self::group_legs(uow.book(), source_kind, source_id)
            .cloned()
            .collect();
        if originals.is_empty() {
            return Err(KernelError::not_found(
                "Posting group",
                format!("{source_kind}/{source_id}"),
            ));
        }
        let outstanding = Self::outstanding(uow.book(), source_kind, source_id, originals);
        if outstanding.is_empty() {
            return Err(KernelError::validation(
                "source_id",
                format!("posting group {source_kind}/{source_id} is already reversed"),
            ));
        }
        Self::write_reversal(uow, source_kind, source_id, reversal_date, outstanding)
    }

    /// Reverses the group if it has outstanding legs; a no-op otherwise.
    pub fn reverse_if_posted(
        uow: &mut UnitOfWork<'_>,
        source_kind: SourceKind,
        source_id: Uuid,
        reversal_date: NaiveDate,
    ) -> KernelResult<Vec<LedgerEntry>> {
        let originals: Vec<LedgerEntry> = Self::group_legs(uow.book(), source_kind, source_id)
            .cloned()
            .collect();
        let outstanding = Self::outstanding(uow.book(), source_kind, source_id, originals);
        if outstanding.is_empty() {
            return Ok(Vec::new());
        }
        Self::write_reversal(uow, source_kind, source_id, reversal_date, outstanding)
    }

    /// Legs of one group in posting order.
    pub fn group_legs(
        book: &Book,
        source_kind: SourceKind,
        source_id: Uuid,
    ) -> impl Iterator<Item = &LedgerEntry> {
        book.ledger_entries()
            .filter(move |leg| leg.in_group(source_kind, source_id))
    }

    /// Net (debit − credit) of the legs hitting `account_id` in every
    /// group of `source_id` whose kind matches `event`, reversals included.
    pub fn net_on_account(
        book: &Book,
        account_id: AccountId,
        source_id: Uuid,
        event: super::entry::EventKind,
    ) -> Decimal {
        book.ledger_entries()
            .filter(|leg| {
                leg.account_id == account_id
                    && leg.source_id == source_id
                    && leg.source_kind.event == event
            })
            .map(LedgerEntry::signed_amount)
            .sum()
    }

    fn outstanding(
        book: &Book,
        source_kind: SourceKind,
        source_id: Uuid,
        originals: Vec<LedgerEntry>,
    ) -> Vec<LedgerEntry> {
        let compensated: HashSet<LedgerEntryId> =
            Self::group_legs(book, source_kind.reversed(), source_id)
                .filter_map(|leg| leg.reversal_of)
                .collect();
        originals
            .into_iter()
            .filter(|leg| !compensated.contains(&leg.id))
            .collect()
    }

    fn write_reversal(
        uow: &mut UnitOfWork<'_>,
        source_kind: SourceKind,
        source_id: Uuid,
        reversal_date: NaiveDate,
        outstanding: Vec<LedgerEntry>,
    ) -> KernelResult<Vec<LedgerEntry>> {
        let mut written = Vec::with_capacity(outstanding.len());
        // Compensating legs bypass the active-account check.
        for original in outstanding {
            let leg = PostingLeg {
                account_id: original.account_id,
                debit: original.credit,
                credit: original.debit,
                description: format!("Reversal: {}", original.description),
            };
            written.extend(Self::write_legs(
                uow,
                reversal_date,
                source_kind.reversed(),
                source_id,
                vec![leg],
                Some(original.id),
            )?);
        }
        debug!(
            source_kind = %source_kind.reversed(),
            %source_id,
            legs = written.len(),
            "reversal group written"
        );
        Ok(written)
    }

    fn write_legs(
        uow: &mut UnitOfWork<'_>,
        entry_date: NaiveDate,
        source_kind: SourceKind,
        source_id: Uuid,
        legs: Vec<PostingLeg>,
        reversal_of: Option<LedgerEntryId>,
    ) -> KernelResult<Vec<LedgerEntry>> {
        let mut entries = Vec::with_capacity(legs.len());
        for leg in legs {
            let mut account = uow.book().account(leg.account_id)?.clone();
            let entry = LedgerEntry {
                id: LedgerEntryId::new(),
                entry_date,
                account_id: leg.account_id,
                debit: leg.debit,
                credit: leg.credit,
                description: leg.description,
                source_kind,
                source_id,
                reversal_of,
                created_by: uow.user(),
                created_at: uow.now(),
            };
            account.apply(entry.debit, entry.credit);
            uow.upsert(Row::LedgerEntry(entry.clone()));
            uow.upsert(Row::Account(account));
            entries.push(entry);
        }
        Ok(entries)
    }
}
