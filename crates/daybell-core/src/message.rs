use serde::{Deserialize, Serialize};

use crate::schedule::{IconKind, ScheduleEntry};

/// A user-facing alert handed to a notification sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub icon: IconKind,
    /// Platform grouping tag; unique per delivery so alerts never replace each other.
    pub tag: String,
}

impl Notification {
    pub fn new(title: &str, body: &str, icon: IconKind) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
            icon,
            tag: format!("daybell-{}", uuid::Uuid::new_v4()),
        }
    }
}

impl From<&ScheduleEntry> for Notification {
    fn from(entry: &ScheduleEntry) -> Self {
        Self {
            title: entry.title.clone(),
            body: entry.body.clone(),
            icon: entry.icon,
            tag: format!("daybell-{}-{}", entry.id, entry.due_at_ms),
        }
    }
}
