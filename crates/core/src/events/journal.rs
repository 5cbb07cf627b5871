//! Manual journals.

use chrono::NaiveDate;
use granary_shared::types::JournalId;
use tracing::info;

use super::types::JournalRequest;
use crate::audit::{AuditAction, snapshot};
use crate::error::KernelResult;
use crate::ledger::{EventKind, LedgerEntry, LedgerService, SourceKind};
use crate::store::UnitOfWork;

/// Posts and reverses manual journals.
pub struct JournalService;

impl JournalService {
    /// Posts already balanced legs under `JOURNAL`.
    pub fn post(
        uow: &mut UnitOfWork<'_>,
        req: JournalRequest,
    ) -> KernelResult<(JournalId, Vec<LedgerEntry>)> {
        let id = JournalId::new();
        let entries = LedgerService::post(
            uow,
            req.entry_date,
            SourceKind::of(EventKind::Journal),
            id.into_inner(),
            req.legs,
        )?;
        uow.audit(
            AuditAction::Post,
            "Journal",
            id.into_inner(),
            None,
            snapshot(&entries),
        );
        info!(journal_id = %id, legs = entries.len(), "journal posted");
        Ok((id, entries))
    }

    /// Posts the `JOURNAL_REVERSAL` of a journal.
    pub fn reverse(
        uow: &mut UnitOfWork<'_>,
        journal_id: JournalId,
        reversal_date: NaiveDate,
    ) -> KernelResult<Vec<LedgerEntry>> {
        let entries = LedgerService::reverse(
            uow,
            SourceKind::of(EventKind::Journal),
            journal_id.into_inner(),
            reversal_date,
        )?;
        uow.audit(
            AuditAction::Reverse,
            "Journal",
            journal_id.into_inner(),
            None,
            snapshot(&entries),
        );
        info!(%journal_id, legs = entries.len(), "journal reversed");
        Ok(entries)
    }
}
