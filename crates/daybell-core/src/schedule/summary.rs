use chrono::NaiveDate;

use super::IconKind;
use crate::model::{Routine, Task};

/// Task and routine counts for one calendar day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DailySummary {
    pub pending_tasks: usize,
    pub completed_tasks: usize,
    pub pending_routines: usize,
}

impl DailySummary {
    /// Count one-time tasks visible on `date` and every routine active that day.
    pub fn for_date(tasks: &[Task], routines: &[Routine], date: NaiveDate) -> Self {
        let mut summary = Self::default();

        for task in tasks.iter().filter(|t| t.is_visible_on(date)) {
            if task.completed {
                summary.completed_tasks += 1;
            } else {
                summary.pending_tasks += 1;
            }
        }

        for routine in routines.iter().filter(|r| r.is_active_on(date)) {
            let progress = routine.progress(date);
            summary.pending_tasks += progress.remaining();
            summary.completed_tasks += progress.completed;
            if !progress.is_complete() {
                summary.pending_routines += 1;
            }
        }

        summary
    }

    pub fn total_tasks(&self) -> usize {
        self.pending_tasks + self.completed_tasks
    }

    /// Title, body and icon of the daily digest.
    pub fn daily_digest(&self) -> (String, String, IconKind) {
        if self.total_tasks() == 0 {
            (
                "Daily Todo".into(),
                "No tasks for today. Start fresh!".into(),
                IconKind::Task,
            )
        } else if self.pending_tasks == 0 {
            (
                "All Done!".into(),
                "You've completed all your tasks for today!".into(),
                IconKind::Check,
            )
        } else {
            let n = self.pending_tasks;
            (
                "Daily Reminder".into(),
                format!("You have {n} pending task{} today", plural(n)),
                IconKind::Task,
            )
        }
    }

    /// Title, body and icon of the routine digest.
    pub fn routine_digest(&self) -> (String, String, IconKind) {
        if self.pending_routines > 0 {
            let n = self.pending_routines;
            let verb = if n == 1 { "is" } else { "are" };
            (
                "Routine Reminder".into(),
                format!("{n} routine{} {verb} incomplete today", plural(n)),
                IconKind::Routine,
            )
        } else if self.total_tasks() > 0 {
            (
                "Great Job!".into(),
                "All routines completed for today!".into(),
                IconKind::Check,
            )
        } else {
            (
                "Routine Reminder".into(),
                "No routines scheduled today".into(),
                IconKind::Bell,
            )
        }
    }
}

pub(super) fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
