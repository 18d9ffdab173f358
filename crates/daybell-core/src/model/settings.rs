use serde::{Deserialize, Serialize};

use super::time::ReminderTime;

/// User-level reminder preferences, persisted under `notification-settings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Master switch for the daily digest.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_daily_time")]
    pub daily_reminder_time: Option<ReminderTime>,
    #[serde(default = "default_true")]
    pub routine_reminders_enabled: bool,
    #[serde(default = "default_routine_time")]
    pub routine_reminder_time: Option<ReminderTime>,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            daily_reminder_time: default_daily_time(),
            routine_reminders_enabled: true,
            routine_reminder_time: default_routine_time(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_daily_time() -> Option<ReminderTime> {
    ReminderTime::new(9, 0)
}
fn default_routine_time() -> Option<ReminderTime> {
    ReminderTime::new(20, 0)
}
