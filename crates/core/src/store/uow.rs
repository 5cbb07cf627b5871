//! Units of work.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use granary_shared::types::{AccountId, AuditLogId, SeasonId, UserId};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use super::book::{Book, Row, RowKey};
use crate::audit::{AuditAction, AuditLog};
use crate::error::KernelResult;
use crate::settings::{AccountRole, SettingsResolver};

/// One forward mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Insert or replace the row.
    Upsert(Row),
    /// Delete the row with this key.
    Delete(RowKey),
}

impl Change {
    /// Key of the affected row.
    #[must_use]
    pub fn key(&self) -> RowKey {
        match self {
            Self::Upsert(row) => row.key(),
            Self::Delete(key) => key.clone(),
        }
    }
}

/// The net effect of a committed unit of work.
///
/// Holds the last image of every touched row, in first-touch order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    /// Collapses a change journal to one change per row.
    #[must_use]
    pub fn compact(journal: Vec<Change>) -> Self {
        let mut order: Vec<RowKey> = Vec::new();
        let mut latest: HashMap<RowKey, Change> = HashMap::new();
        for change in journal {
            let key = change.key();
            if !latest.contains_key(&key) {
                order.push(key.clone());
            }
            latest.insert(key, change);
        }
        let changes = order
            .into_iter()
            .filter_map(|key| latest.remove(&key))
            .collect();
        Self { changes }
    }

    /// The changes, in first-touch order.
    #[must_use]
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// Consumes the set.
    #[must_use]
    pub fn into_changes(self) -> Vec<Change> {
        self.changes
    }

    /// Number of rows touched.
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// True when nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Exclusive, transactional access to the book.
///
/// Dropping a unit of work without [`UnitOfWork::commit`] rolls every
/// mutation back.
pub struct UnitOfWork<'a> {
    book: &'a mut Book,
    settings: &'a SettingsResolver,
    user: UserId,
    started_at: DateTime<Utc>,
    undo: Vec<(RowKey, Option<Row>)>,
    journal: Vec<Change>,
    pending_audit: Vec<AuditLog>,
    settings_written: bool,
    finished: bool,
}

impl<'a> UnitOfWork<'a> {
    pub(crate) fn begin(book: &'a mut Book, settings: &'a SettingsResolver, user: UserId) -> Self {
        Self {
            book,
            settings,
            user,
            started_at: Utc::now(),
            undo: Vec::new(),
            journal: Vec::new(),
            pending_audit: Vec::new(),
            settings_written: false,
            finished: false,
        }
    }

    /// Read access to the book, including this unit's own writes.
    #[must_use]
    pub fn book(&self) -> &Book {
        &*self.book
    }

    /// The acting user.
    #[must_use]
    pub fn user(&self) -> UserId {
        self.user
    }

    /// Timestamp stamped on rows created by this unit.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Inserts or replaces a row.
    pub fn upsert(&mut self, row: Row) {
        let key = row.key();
        if matches!(key, RowKey::Setting(_)) {
            self.settings_written = true;
        }
        let previous = self.book.put(row.clone());
        self.undo.push((key, previous));
        self.journal.push(Change::Upsert(row));
    }

    /// Removes a row, returning it if it existed.
    pub fn remove(&mut self, key: &RowKey) -> Option<Row> {
        let previous = self.book.take(key)?;
        if matches!(key, RowKey::Setting(_)) {
            self.settings_written = true;
        }
        self.undo.push((key.clone(), Some(previous.clone())));
        self.journal.push(Change::Delete(key.clone()));
        Some(previous)
    }

    /// Resolves an account role.
    pub fn role(&self, role: AccountRole) -> KernelResult<AccountId> {
        if self.settings_written {
            SettingsResolver::resolve_uncached(self.book(), role)
        } else {
            self.settings.resolve(self.book(), role)
        }
    }

    /// The explicit season, or the active one.
    #[must_use]
    pub fn season_or_active(&self, season_id: Option<SeasonId>) -> Option<SeasonId> {
        season_id.or_else(|| crate::season::SeasonService::active_season(self.book()).map(|s| s.id))
    }

    /// Queues an audit record; queued records are written at commit.
    pub fn audit(
        &mut self,
        action: AuditAction,
        entity_kind: &str,
        entity_id: Uuid,
        before: Option<Value>,
        after: Option<Value>,
    ) {
        self.pending_audit.push(AuditLog {
            id: AuditLogId::new(),
            action,
            entity_kind: entity_kind.to_string(),
            entity_id,
            before,
            after,
            user_id: self.user,
            timestamp: Utc::now(),
        });
    }

    /// Writes queued audit records and returns the compacted change set
    /// without ending the unit. Persistence adapters call this before
    /// their own commit.
    pub fn stage(&mut self) -> ChangeSet {
        self.flush_audit();
        ChangeSet::compact(self.journal.clone())
    }

    /// Makes every mutation permanent.
    pub fn commit(mut self) -> ChangeSet {
        self.flush_audit();
        let changes = ChangeSet::compact(std::mem::take(&mut self.journal));
        self.undo.clear();
        self.finished = true;
        self.settings.invalidate();
        debug!(rows = changes.len(), "unit of work committed");
        changes
    }

    /// Discards every mutation.
    pub fn rollback(mut self) {
        self.rollback_in_place();
    }

    fn flush_audit(&mut self) {
        for record in std::mem::take(&mut self.pending_audit) {
            self.upsert(Row::Audit(record));
        }
    }

    fn rollback_in_place(&mut self) {
        if self.finished {
            return;
        }
        let undone = self.undo.len();
        while let Some((key, previous)) = self.undo.pop() {
            match previous {
                Some(row) => {
                    self.book.put(row);
                }
                None => {
                    self.book.take(&key);
                }
            }
        }
        self.journal.clear();
        self.pending_audit.clear();
        self.finished = true;
        if self.settings_written {
            self.settings.invalidate();
        }
        if undone > 0 {
            warn!(rows = undone, "unit of work rolled back");
        }
    }
}

impl Drop for UnitOfWork<'_> {
    fn drop(&mut self) {
        self.rollback_in_place();
    }
}

impl std::fmt::Debug for UnitOfWork<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("user", &self.user)
            .field("mutations", &self.journal.len())
            .field("pending_audit", &self.pending_audit.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Setting;

    fn setting(key: &str, value: &str) -> Row {
        Row::Setting(Setting {
            key: key.to_string(),
            value: value.to_string(),
            updated_at: Utc::now(),
        })
    }

    #[test]
    fn test_drop_rolls_back() {
        let mut book = Book::new();
        book.put(setting("A", "1"));
        let resolver = SettingsResolver::new();
        {
            let mut uow = UnitOfWork::begin(&mut book, &resolver, UserId::new());
            uow.upsert(setting("A", "2"));
            uow.upsert(setting("B", "x"));
            uow.remove(&RowKey::Setting("A".into()));
            assert!(uow.book().setting("A").is_none());
        }
        assert_eq!(book.setting("A").map(|s| s.value.as_str()), Some("1"));
        assert!(book.setting("B").is_none());
    }

    #[test]
    fn test_commit_compacts_changes() {
        let mut book = Book::new();
        let resolver = SettingsResolver::new();
        let mut uow = UnitOfWork::begin(&mut book, &resolver, UserId::new());
        uow.upsert(setting("A", "1"));
        uow.upsert(setting("B", "1"));
        uow.upsert(setting("A", "2"));
        let changes = uow.commit();

        assert_eq!(changes.len(), 2);
        match &changes.changes()[0] {
            Change::Upsert(Row::Setting(s)) => {
                assert_eq!(s.key, "A");
                assert_eq!(s.value, "2");
            }
            other => panic!("unexpected change {other:?}"),
        }
        assert_eq!(book.setting("A").map(|s| s.value.as_str()), Some("2"));
    }

    #[test]
    fn test_insert_then_delete_compacts_to_delete() {
        let mut book = Book::new();
        let resolver = SettingsResolver::new();
        let mut uow = UnitOfWork::begin(&mut book, &resolver, UserId::new());
        uow.upsert(setting("TEMP", "1"));
        uow.remove(&RowKey::Setting("TEMP".into()));
        let changes = uow.commit();
        assert_eq!(
            changes.changes(),
            &[Change::Delete(RowKey::Setting("TEMP".into()))]
        );
        assert!(book.is_empty());
    }

    #[test]
    fn test_audit_written_last() {
        let mut book = Book::new();
        let resolver = SettingsResolver::new();
        let mut uow = UnitOfWork::begin(&mut book, &resolver, UserId::new());
        uow.audit(AuditAction::Update, "Setting", Uuid::nil(), None, None);
        uow.upsert(setting("A", "1"));
        let changes = uow.commit();

        assert_eq!(changes.len(), 2);
        assert!(matches!(changes.changes()[1], Change::Upsert(Row::Audit(_))));
        assert_eq!(book.audit_logs().count(), 1);
    }

    #[test]
    fn test_explicit_rollback_discards_audit() {
        let mut book = Book::new();
        let resolver = SettingsResolver::new();
        let mut uow = UnitOfWork::begin(&mut book, &resolver, UserId::new());
        uow.audit(AuditAction::Create, "Setting", Uuid::nil(), None, None);
        uow.upsert(setting("A", "1"));
        uow.rollback();
        assert_eq!(book.row_count(), 0);
    }
}
