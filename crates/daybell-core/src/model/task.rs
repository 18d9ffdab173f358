use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::time::ReminderTime;

/// A one-time task. Incomplete tasks stay visible (carried over) until done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub text: String,
    pub created_date: NaiveDate,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_date: Option<NaiveDate>,
    #[serde(default)]
    pub notification_time: Option<ReminderTime>,
}

impl Task {
    pub fn new(text: &str, today: NaiveDate, notification_time: Option<ReminderTime>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.to_string(),
            created_date: today,
            completed: false,
            completed_date: None,
            notification_time,
        }
    }

    /// Incomplete and created on a prior day.
    pub fn is_carried_over(&self, today: NaiveDate) -> bool {
        !self.completed && self.created_date < today
    }

    /// Whether the task shows up on `date`'s list: open tasks created on or
    /// before it, plus tasks completed that day.
    pub fn is_visible_on(&self, date: NaiveDate) -> bool {
        if self.completed {
            self.completed_date == Some(date)
        } else {
            self.created_date <= date
        }
    }

    pub fn toggle(&mut self, today: NaiveDate) {
        self.completed = !self.completed;
        self.completed_date = self.completed.then_some(today);
    }
}
