//! Append-only audit log.
//!
//! Records are queued on the unit of work and written after every other
//! mutation of the same unit.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use granary_shared::types::{AuditLogId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::KernelError;
use crate::store::Book;

/// What happened to the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// Entity created.
    Create,
    /// Entity changed.
    Update,
    /// Entity removed.
    Delete,
    /// Manual posting.
    Post,
    /// Manual reversal.
    Reverse,
    /// Season closed.
    Close,
    /// Season activated.
    Activate,
}

impl AuditAction {
    /// Every action.
    pub const ALL: [Self; 7] = [
        Self::Create,
        Self::Update,
        Self::Delete,
        Self::Post,
        Self::Reverse,
        Self::Close,
        Self::Activate,
    ];

    /// Stable storage code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Post => "POST",
            Self::Reverse => "REVERSE",
            Self::Close => "CLOSE",
            Self::Activate => "ACTIVATE",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| KernelError::validation("action", format!("unknown audit action `{s}`")))
    }
}

/// One audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLog {
    /// Record id.
    pub id: AuditLogId,
    /// What happened.
    pub action: AuditAction,
    /// Entity kind, e.g. `Purchase`.
    pub entity_kind: String,
    /// Entity id.
    pub entity_id: Uuid,
    /// Snapshot before the change.
    pub before: Option<Value>,
    /// Snapshot after the change.
    pub after: Option<Value>,
    /// Who did it.
    pub user_id: UserId,
    /// When.
    pub timestamp: DateTime<Utc>,
}

/// Serializes an entity for an audit snapshot.
pub fn snapshot<T: Serialize>(value: &T) -> Option<Value> {
    serde_json::to_value(value).ok()
}

/// Audit records of one entity, oldest first.
pub fn audit_trail(book: &Book, entity_kind: &str, entity_id: Uuid) -> Vec<AuditLog> {
    let mut trail: Vec<AuditLog> = book
        .audit_logs()
        .filter(|log| log.entity_kind == entity_kind && log.entity_id == entity_id)
        .cloned()
        .collect();
    trail.sort_by_key(|log| (log.timestamp, log.id));
    trail
}
