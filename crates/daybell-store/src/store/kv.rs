//! JSON documents stored under logical keys.

use super::Store;
use daybell_core::error::DaybellError;
use serde::{de::DeserializeOwned, Serialize};

impl Store {
    /// Read the raw JSON text stored under `key`.
    pub async fn get_raw(&self, key: &str) -> Result<Option<String>, DaybellError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DaybellError::Store(format!("read {key} failed: {e}")))?;

        Ok(row.map(|(v,)| v))
    }

    /// Overwrite the raw text stored under `key`.
    pub async fn put_raw(&self, key: &str, value: &str) -> Result<(), DaybellError> {
        sqlx::query(
            "INSERT INTO kv_store (key, value) VALUES (?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| DaybellError::Store(format!("write {key} failed: {e}")))?;

        Ok(())
    }

    /// Decode the document under `key`. `Ok(None)` when absent; a corrupt
    /// document is a `Serialization` error.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DaybellError> {
        match self.get_raw(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn put_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), DaybellError> {
        let raw = serde_json::to_string(value)?;
        self.put_raw(key, &raw).await
    }
}
