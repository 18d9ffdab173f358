//! Notification settings, the published schedule, and the fired ledger.

use super::{Store, SCHEDULE_KEY, SETTINGS_KEY};
use daybell_core::{
    error::DaybellError,
    model::NotificationSettings,
    schedule::{FiredLedger, ScheduleEntry},
};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// The schedule as handed to the background agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDocument {
    #[serde(default)]
    pub schedule: Vec<ScheduleEntry>,
    #[serde(default)]
    pub username: Option<String>,
    /// When the foreground last published this schedule.
    #[serde(default)]
    pub published_at_ms: i64,
}

impl Store {
    /// Reminder preferences. Missing or corrupt settings read as defaults.
    pub async fn load_settings(&self) -> NotificationSettings {
        match self.read_settings().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!("store: notification settings unreadable, using defaults: {e}");
                NotificationSettings::default()
            }
        }
    }

    /// Reminder preferences, failing on an unreadable document.
    pub async fn read_settings(&self) -> Result<NotificationSettings, DaybellError> {
        Ok(self
            .get_json::<NotificationSettings>(SETTINGS_KEY)
            .await?
            .unwrap_or_default())
    }

    pub async fn save_settings(&self, settings: &NotificationSettings) -> Result<(), DaybellError> {
        self.put_json(SETTINGS_KEY, settings).await
    }

    /// The last published schedule, or an empty one.
    pub async fn load_schedule(&self) -> ScheduleDocument {
        match self.get_json::<ScheduleDocument>(SCHEDULE_KEY).await {
            Ok(doc) => doc.unwrap_or_default(),
            Err(e) => {
                warn!("store: published schedule unreadable, treating as empty: {e}");
                ScheduleDocument::default()
            }
        }
    }

    pub async fn save_schedule(&self, doc: &ScheduleDocument) -> Result<(), DaybellError> {
        self.put_json(SCHEDULE_KEY, doc).await
    }

    /// Snapshot of every fired key. Unreadable reads as empty.
    pub async fn load_ledger(&self) -> FiredLedger {
        let rows: Result<Vec<(String, i64)>, _> =
            sqlx::query_as("SELECT key, fired_at_ms FROM fired_ledger")
                .fetch_all(&self.pool)
                .await;
        match rows {
            Ok(rows) => rows.into_iter().collect(),
            Err(e) => {
                warn!("store: fired ledger unreadable, treating as empty: {e}");
                FiredLedger::new()
            }
        }
    }

    /// Record that `key` fired. Returns `false` if it was already recorded,
    /// in which case the caller must not deliver.
    pub async fn claim_fired(
        &self,
        key: &str,
        entry_id: &str,
        fired_at_ms: i64,
    ) -> Result<bool, DaybellError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO fired_ledger (key, entry_id, fired_at_ms) VALUES (?, ?, ?)",
        )
        .bind(key)
        .bind(entry_id)
        .bind(fired_at_ms)
        .execute(&self.pool)
        .await
        .map_err(|e| DaybellError::Store(format!("claim {key} failed: {e}")))?;

        Ok(result.rows_affected() == 1)
    }

    /// Undo a claim whose delivery did not happen.
    pub async fn release_fired(&self, key: &str) -> Result<bool, DaybellError> {
        let result = sqlx::query("DELETE FROM fired_ledger WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| DaybellError::Store(format!("release {key} failed: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    /// Drop ledger entries fired before `cutoff_ms`. Returns how many went.
    pub async fn prune_ledger(&self, cutoff_ms: i64) -> Result<u64, DaybellError> {
        let result = sqlx::query("DELETE FROM fired_ledger WHERE fired_at_ms < ?")
            .bind(cutoff_ms)
            .execute(&self.pool)
            .await
            .map_err(|e| DaybellError::Store(format!("prune ledger failed: {e}")))?;

        Ok(result.rows_affected())
    }
}
