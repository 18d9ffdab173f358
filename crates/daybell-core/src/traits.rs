use crate::{error::DaybellError, message::Notification};
use async_trait::async_trait;

/// Where reminders are delivered.
///
/// Every delivery backend (desktop notifier, log-only, ...) implements this
/// trait. Callers never see these errors directly; see `daybell_notify::Notifier`.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Human-readable sink name.
    fn name(&self) -> &str;

    /// Show a visual alert.
    async fn deliver(&self, notification: &Notification) -> Result<(), DaybellError>;

    /// Play the audible alert.
    async fn play_sound(&self) -> Result<(), DaybellError> {
        Ok(())
    }

    /// Check whether the platform can display notifications right now.
    async fn is_available(&self) -> bool;
}
