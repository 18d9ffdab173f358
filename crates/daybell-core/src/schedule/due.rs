use chrono::NaiveDate;

/// How late (ms) a woken agent may still fire an entry.
pub const DEFAULT_DUE_WINDOW_MS: i64 = 5 * 60 * 1000;

/// Where `now` sits relative to an entry's due window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueStatus {
    /// Due time not reached. Never fire early.
    Upcoming,
    /// `0 <= now - due <= window`.
    Due,
    /// More than `window` late; dropped as a miss.
    Missed,
}

pub fn due_status(now_ms: i64, due_at_ms: i64, window_ms: i64) -> DueStatus {
    let late_by = now_ms - due_at_ms;
    if late_by < 0 {
        DueStatus::Upcoming
    } else if late_by <= window_ms {
        DueStatus::Due
    } else {
        DueStatus::Missed
    }
}

/// `"<entryId>-<YYYY-MM-DD>"`.
pub fn ledger_key(entry_id: &str, date: NaiveDate) -> String {
    format!("{entry_id}-{}", date.format("%Y-%m-%d"))
}
