//! Log-only sink for headless hosts.

use async_trait::async_trait;
use daybell_core::{error::DaybellError, message::Notification, traits::NotificationSink};
use tracing::info;

/// Delivers by writing each notification to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), DaybellError> {
        info!(
            tag = %notification.tag,
            icon = notification.icon.as_str(),
            "notify: {}: {}",
            notification.title,
            notification.body
        );
        Ok(())
    }

    async fn is_available(&self) -> bool {
        true
    }
}
