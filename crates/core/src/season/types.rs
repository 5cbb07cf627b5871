//! Season types.

use chrono::{DateTime, NaiveDate, Utc};
use granary_shared::types::SeasonId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeasonStatus {
    /// Not started.
    Upcoming,
    /// Current season; new events are tagged with it.
    Active,
    /// Finished.
    Completed,
}

impl SeasonStatus {
    /// Stable storage code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upcoming => "UPCOMING",
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
        }
    }
}

/// A trading season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    /// Season id.
    pub id: SeasonId,
    /// Display name.
    pub name: String,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day.
    pub end_date: NaiveDate,
    /// Lifecycle state.
    pub status: SeasonStatus,
    /// Set once the closing entry is posted.
    pub closed_at: Option<DateTime<Utc>>,
    /// Net profit transferred by the closing entry.
    pub closing_net_profit: Option<Decimal>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Season {
    /// True once the closing entry has been posted.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed_at.is_some()
    }
}

/// Figures behind a season close.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonClosing {
    /// Season closed.
    pub season_id: SeasonId,
    /// Revenue of the season's sales.
    pub revenue: Decimal,
    /// Net COGS of the season's sales.
    pub cogs: Decimal,
    /// Expenses tagged to the season.
    pub expenses: Decimal,
    /// Revenue minus COGS minus expenses.
    pub net_profit: Decimal,
}

/// Input for [`crate::season::SeasonService::create`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonRequest {
    /// Display name.
    pub name: String,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day.
    pub end_date: NaiveDate,
}
