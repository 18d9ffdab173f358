//! Permission-gated delivery front for a [`NotificationSink`].

use daybell_core::{
    message::Notification,
    schedule::{IconKind, ScheduleEntry},
    traits::NotificationSink,
};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Whether the platform will show our notifications.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
    /// Never checked.
    #[default]
    Default,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::Default => "default",
        }
    }
}

/// Outcome of one `show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// Permission not granted; nothing was attempted.
    Suppressed,
    /// The sink tried and failed. The failure has been logged.
    Failed,
}

impl Delivery {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Best-effort notifier. `show` never returns an error.
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn NotificationSink>,
    permission: Arc<Mutex<Permission>>,
    sound: bool,
}

impl Notifier {
    pub fn new(sink: Arc<dyn NotificationSink>, sound: bool) -> Self {
        Self {
            sink,
            permission: Arc::new(Mutex::new(Permission::Default)),
            sound,
        }
    }

    /// Build a notifier and resolve permission by probing the sink.
    pub async fn connect(sink: Arc<dyn NotificationSink>, sound: bool) -> Self {
        let notifier = Self::new(sink, sound);
        let permission = notifier.request_permission().await;
        if permission != Permission::Granted {
            warn!(
                "notify: {} notifier unavailable, reminders will be suppressed",
                notifier.sink_name()
            );
        }
        notifier
    }

    pub fn with_permission(self, permission: Permission) -> Self {
        self.set_permission(permission);
        self
    }

    pub fn sink_name(&self) -> &str {
        self.sink.name()
    }

    pub fn permission(&self) -> Permission {
        *self.permission.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_permission(&self, permission: Permission) {
        *self.permission.lock().unwrap_or_else(|e| e.into_inner()) = permission;
    }

    /// Check the platform notifier and record the answer.
    pub async fn request_permission(&self) -> Permission {
        let permission = if self.sink.is_available().await {
            Permission::Granted
        } else {
            Permission::Denied
        };
        self.set_permission(permission);
        debug!("notify: permission {}", permission.as_str());
        permission
    }

    /// Play the sound, then show the alert. Sound plays even if the visual
    /// alert fails; neither happens without permission.
    pub async fn show(&self, title: &str, body: &str, icon: IconKind) -> Delivery {
        self.show_notification(&Notification::new(title, body, icon))
            .await
    }

    pub async fn show_entry(&self, entry: &ScheduleEntry) -> Delivery {
        self.show_notification(&Notification::from(entry)).await
    }

    async fn show_notification(&self, notification: &Notification) -> Delivery {
        let permission = self.permission();
        if permission != Permission::Granted {
            warn!(
                "notify: permission {}, suppressed '{}'",
                permission.as_str(),
                notification.title
            );
            return Delivery::Suppressed;
        }

        if self.sound {
            self.play_sound().await;
        }

        match self.sink.deliver(notification).await {
            Ok(()) => {
                info!("notify: shown '{}'", notification.title);
                Delivery::Delivered
            }
            Err(e) => {
                warn!("notify: {} failed to show '{}': {e}", self.sink.name(), notification.title);
                Delivery::Failed
            }
        }
    }

    /// Play the audible alert alone. Failures are logged.
    pub async fn play_sound(&self) {
        if let Err(e) = self.sink.play_sound().await {
            debug!("notify: sound failed: {e}");
        }
    }

    /// The confirmation shown when the user turns reminders on.
    pub async fn send_test_notification(&self) -> Delivery {
        self.show(
            "Notifications Enabled",
            "You'll receive reminders at your scheduled times",
            IconKind::Bell,
        )
        .await
    }
}
