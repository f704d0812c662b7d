//! Core types for remote synchronization.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::calendar::{NonInstructionalDay, SchoolYear};
use crate::cycle::CycleDay;
use crate::schedule::ClassEntry;

/// Remote tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteTable {
    SchoolYears,
    Classes,
    NonSchoolDays,
    MonthCycleConfig,
}

impl RemoteTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteTable::SchoolYears => "school_years",
            RemoteTable::Classes => "classes",
            RemoteTable::NonSchoolDays => "non_school_days",
            RemoteTable::MonthCycleConfig => "month_cycle_config",
        }
    }

    /// Natural key columns an upsert merges on.
    pub fn conflict_columns(&self) -> &'static str {
        match self {
            RemoteTable::SchoolYears => "year_name",
            RemoteTable::Classes => "id",
            RemoteTable::NonSchoolDays => "school_year,date",
            RemoteTable::MonthCycleConfig => "school_year,month",
        }
    }
}

impl fmt::Display for RemoteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column equality filters, e.g. `{"id": "abc"}`.
pub type Filters = BTreeMap<String, String>;

pub fn filters<const N: usize>(pairs: [(&str, String); N]) -> Filters {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// One remote write. Each is independently retryable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RemoteOp {
    Create {
        table: RemoteTable,
        rows: Vec<serde_json::Value>,
    },
    Update {
        table: RemoteTable,
        filters: Filters,
        patch: serde_json::Value,
    },
    Delete {
        table: RemoteTable,
        filters: Filters,
    },
    Upsert {
        table: RemoteTable,
        rows: Vec<serde_json::Value>,
    },
}

impl RemoteOp {
    pub fn table(&self) -> RemoteTable {
        match self {
            RemoteOp::Create { table, .. }
            | RemoteOp::Update { table, .. }
            | RemoteOp::Delete { table, .. }
            | RemoteOp::Upsert { table, .. } => *table,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RemoteOp::Create { .. } => "create",
            RemoteOp::Update { .. } => "update",
            RemoteOp::Delete { .. } => "delete",
            RemoteOp::Upsert { .. } => "upsert",
        }
    }

    pub fn upsert<T: Serialize>(table: RemoteTable, row: &T) -> Result<Self, SyncError> {
        Ok(RemoteOp::Upsert {
            table,
            rows: vec![serde_json::to_value(row)?],
        })
    }

    pub fn upsert_class(entry: &ClassEntry, year: SchoolYear) -> Result<Self, SyncError> {
        Self::upsert(RemoteTable::Classes, &ClassRow::from_entry(entry, year))
    }

    pub fn delete_class(id: &str) -> Self {
        RemoteOp::Delete {
            table: RemoteTable::Classes,
            filters: filters([("id", id.to_string())]),
        }
    }
}

/// `school_years` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolYearRow {
    pub year_name: String,
    pub start_year: i32,
    pub end_year: i32,
}

impl From<SchoolYear> for SchoolYearRow {
    fn from(year: SchoolYear) -> Self {
        Self {
            year_name: year.label(),
            start_year: year.start_year(),
            end_year: year.end_year(),
        }
    }
}

/// `classes` row. `id` is left out when migrating so the store assigns one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub school_year: String,
    pub grade: u8,
    pub group_name: String,
    pub subject: String,
    pub topic: String,
    pub description: String,
    pub notes: String,
    pub date: NaiveDate,
    pub cycle_day: u8,
    pub period: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl ClassRow {
    pub fn from_entry(entry: &ClassEntry, year: SchoolYear) -> Self {
        Self {
            id: Some(entry.id.clone()),
            school_year: year.label(),
            grade: entry.grade.get(),
            group_name: entry.group.to_string(),
            subject: entry.subject.clone(),
            topic: entry.topic.clone(),
            description: entry.description.clone(),
            notes: entry.notes.clone(),
            date: entry.date,
            cycle_day: entry.cycle_day.get(),
            period: entry.period.to_string(),
            completed: entry.completed,
            created_at: entry.created_at,
            last_updated: entry.last_updated,
        }
    }

    pub fn without_id(mut self) -> Self {
        self.id = None;
        self
    }
}

/// `non_school_days` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonSchoolDayRow {
    pub school_year: String,
    pub date: NaiveDate,
    pub reason: String,
}

impl NonSchoolDayRow {
    pub fn new(day: &NonInstructionalDay, year: SchoolYear) -> Self {
        Self {
            school_year: year.label(),
            date: day.date,
            reason: day.reason.clone(),
        }
    }
}

/// `month_cycle_config` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthCycleRow {
    pub school_year: String,
    pub month: u32,
    pub first_cycle_day: CycleDay,
}

/// Year-scoped rows read back from the remote store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteSnapshot {
    pub classes: Vec<ClassRow>,
    pub non_school_days: Vec<NonSchoolDayRow>,
    pub month_cycle_config: Vec<MonthCycleRow>,
}

/// Current sync status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncStatus {
    pub online: bool,
    /// Operations waiting in the offline queue.
    pub pending_count: usize,
    /// Last time the queue was fully drained.
    pub last_sync_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Sync error types.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Remote store returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid remote URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Remote request timed out")]
    Timeout,

    #[error("Remote store is offline")]
    Offline,

    #[error("Remote sync is not configured")]
    NotConfigured,
}
