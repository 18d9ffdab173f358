use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ledger entries older than this many days may be evicted.
pub const LEDGER_RETENTION_DAYS: i64 = 2;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Snapshot of reminders already delivered: ledger key → fire timestamp (ms).
///
/// Writes go through the store's atomic claim; this is the read side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FiredLedger {
    entries: BTreeMap<String, i64>,
}

impl FiredLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Entries fired before this timestamp are eligible for pruning.
    pub fn retention_cutoff(now_ms: i64, retention_days: i64) -> i64 {
        now_ms - retention_days * DAY_MS
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, i64)> for FiredLedger {
    fn from_iter<I: IntoIterator<Item = (String, i64)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
