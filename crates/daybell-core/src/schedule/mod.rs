//! Reminder schedule: entry types, the pure builder, the due-window check,
//! and the fired ledger.
//!
//! Split into focused submodules:
//! - `builder`: turns tasks/routines/settings + "now" into pending entries
//! - `summary`: per-day counts used for digest bodies
//! - `due`: due-window classification and ledger keys
//! - `ledger`: in-memory view of already-fired reminders

mod builder;
mod due;
mod ledger;
mod summary;

#[cfg(test)]
mod tests;

pub use builder::build;
pub use due::{due_status, ledger_key, DueStatus, DEFAULT_DUE_WINDOW_MS};
pub use ledger::{FiredLedger, LEDGER_RETENTION_DAYS};
pub use summary::DailySummary;

use chrono::{DateTime, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

/// Entry id of the settings-level daily digest.
pub const DAILY_DIGEST_ID: &str = "daily-digest";
/// Entry id of the settings-level routine digest.
pub const ROUTINE_DIGEST_ID: &str = "routine-digest";

/// What produced a schedule entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryKind {
    Task,
    Routine,
    DailyDigest,
    RoutineDigest,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Routine => "routine",
            Self::DailyDigest => "daily-digest",
            Self::RoutineDigest => "routine-digest",
        }
    }

    /// Digests roll to the next day once today's slot has passed.
    pub fn rolls_forward(&self) -> bool {
        matches!(self, Self::DailyDigest | Self::RoutineDigest)
    }
}

/// Icon shown with a notification.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconKind {
    #[default]
    Bell,
    Task,
    Clock,
    Routine,
    Check,
}

impl IconKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bell => "bell",
            Self::Task => "task",
            Self::Clock => "clock",
            Self::Routine => "routine",
            Self::Check => "check",
        }
    }
}

/// Back-reference from an entry to the record it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceRef {
    Task { id: String },
    Routine { id: String },
    Settings,
}

/// One concrete future-firing reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Stable across rebuilds: derived from source id + kind.
    pub id: String,
    pub due_at_ms: i64,
    pub kind: EntryKind,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub icon: IconKind,
    pub source: SourceRef,
}

impl ScheduleEntry {
    pub fn task_entry_id(task_id: &str) -> String {
        format!("task-{task_id}")
    }

    pub fn routine_entry_id(routine_id: &str) -> String {
        format!("routine-{routine_id}")
    }

    /// Due instant in `tz`. `None` only for timestamps chrono cannot represent.
    pub fn due_at<Tz: TimeZone>(&self, tz: &Tz) -> Option<DateTime<Tz>> {
        tz.timestamp_millis_opt(self.due_at_ms).single()
    }

    /// Calendar day (in `tz`) this entry belongs to.
    pub fn due_date<Tz: TimeZone>(&self, tz: &Tz) -> Option<NaiveDate> {
        self.due_at(tz).map(|at| at.date_naive())
    }

    /// Ledger key for this entry's occurrence, keyed by its local due day.
    pub fn ledger_key<Tz: TimeZone>(&self, tz: &Tz) -> Option<String> {
        self.due_date(tz).map(|date| ledger_key(&self.id, date))
    }
}
