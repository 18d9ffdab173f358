//! # daybell-notify
//!
//! Notification sinks for Daybell, plus the permission-gated [`Notifier`]
//! the schedulers deliver through.

pub mod desktop;
pub mod log_sink;
pub mod notifier;

pub use desktop::DesktopSink;
pub use log_sink::LogSink;
pub use notifier::{Delivery, Notifier, Permission};

use daybell_core::{
    config::{NotifyBackend, NotifyConfig},
    traits::NotificationSink,
};
use std::sync::Arc;

/// Build the sink selected in config.
pub fn build_sink(config: &NotifyConfig) -> Arc<dyn NotificationSink> {
    match config.backend {
        NotifyBackend::Desktop => Arc::new(DesktopSink::new(config.timeout_secs)),
        NotifyBackend::Log => Arc::new(LogSink),
    }
}
