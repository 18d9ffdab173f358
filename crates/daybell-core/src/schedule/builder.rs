//! The schedule builder: a pure function of inputs and "now".

use chrono::{DateTime, Duration, TimeZone};
use tracing::debug;

use super::summary::{plural, DailySummary};
use super::{
    EntryKind, IconKind, ScheduleEntry, SourceRef, DAILY_DIGEST_ID, ROUTINE_DIGEST_ID,
};
use crate::model::{NotificationSettings, ReminderTime, Routine, Task};

/// Compute every pending reminder as of `now`.
///
/// Task and routine reminders only fire on the current day and are dropped
/// once their time has passed. Digests roll to tomorrow instead. Every
/// returned entry is due strictly after `now`. Output is sorted by due time,
/// then id, so identical inputs always yield identical lists.
pub fn build<Tz: TimeZone>(
    now: &DateTime<Tz>,
    tasks: &[Task],
    routines: &[Routine],
    settings: &NotificationSettings,
) -> Vec<ScheduleEntry> {
    let tz = now.timezone();
    let today = now.date_naive();
    let now_ms = now.timestamp_millis();
    let mut entries = Vec::new();

    for task in tasks {
        if task.completed {
            continue;
        }
        let Some(time) = task.notification_time else {
            continue;
        };
        if task.created_date != today && !task.is_carried_over(today) {
            continue;
        }
        match time.on(&tz, today).map(|at| at.timestamp_millis()) {
            Some(due) if due > now_ms => entries.push(ScheduleEntry {
                id: ScheduleEntry::task_entry_id(&task.id),
                due_at_ms: due,
                kind: EntryKind::Task,
                title: "Task Reminder".to_string(),
                body: task.text.clone(),
                icon: IconKind::Clock,
                source: SourceRef::Task {
                    id: task.id.clone(),
                },
            }),
            _ => debug!("schedule: task {} reminder at {time} already passed", task.id),
        }
    }

    for routine in routines {
        let Some(time) = routine.notification_time else {
            continue;
        };
        if !routine.is_active_on(today) {
            continue;
        }
        let progress = routine.progress(today);
        if progress.is_complete() {
            continue;
        }
        match time.on(&tz, today).map(|at| at.timestamp_millis()) {
            Some(due) if due > now_ms => {
                let remaining = progress.remaining();
                entries.push(ScheduleEntry {
                    id: ScheduleEntry::routine_entry_id(&routine.id),
                    due_at_ms: due,
                    kind: EntryKind::Routine,
                    title: "Routine Reminder".to_string(),
                    body: format!(
                        "{}: {remaining} task{} remaining ({}/{} done)",
                        routine.name,
                        plural(remaining),
                        progress.completed,
                        progress.total
                    ),
                    icon: IconKind::Routine,
                    source: SourceRef::Routine {
                        id: routine.id.clone(),
                    },
                });
            }
            _ => debug!(
                "schedule: routine {} reminder at {time} already passed",
                routine.id
            ),
        }
    }

    if settings.enabled {
        if let Some(time) = settings.daily_reminder_time {
            if let Some(at) = next_occurrence(now, time) {
                let summary = DailySummary::for_date(tasks, routines, at.date_naive());
                let (title, body, icon) = summary.daily_digest();
                entries.push(digest_entry(
                    DAILY_DIGEST_ID,
                    EntryKind::DailyDigest,
                    &at,
                    title,
                    body,
                    icon,
                ));
            }
        }
    }

    if settings.routine_reminders_enabled {
        if let Some(time) = settings.routine_reminder_time {
            if let Some(at) = next_occurrence(now, time) {
                let summary = DailySummary::for_date(tasks, routines, at.date_naive());
                let (title, body, icon) = summary.routine_digest();
                entries.push(digest_entry(
                    ROUTINE_DIGEST_ID,
                    EntryKind::RoutineDigest,
                    &at,
                    title,
                    body,
                    icon,
                ));
            }
        }
    }

    entries.sort_by(|a, b| a.due_at_ms.cmp(&b.due_at_ms).then_with(|| a.id.cmp(&b.id)));
    entries
}

/// Today's occurrence of `time` if still ahead of `now`, otherwise tomorrow's.
fn next_occurrence<Tz: TimeZone>(now: &DateTime<Tz>, time: ReminderTime) -> Option<DateTime<Tz>> {
    let tz = now.timezone();
    let today = now.date_naive();
    let now_ms = now.timestamp_millis();
    match time.on(&tz, today) {
        Some(at) if at.timestamp_millis() > now_ms => Some(at),
        _ => {
            let tomorrow = today + Duration::days(1);
            time.on(&tz, tomorrow)
                .filter(|at| at.timestamp_millis() > now_ms)
        }
    }
}

fn digest_entry<Tz: TimeZone>(
    id: &str,
    kind: EntryKind,
    at: &DateTime<Tz>,
    title: String,
    body: String,
    icon: IconKind,
) -> ScheduleEntry {
    ScheduleEntry {
        id: id.to_string(),
        due_at_ms: at.timestamp_millis(),
        kind,
        title,
        body,
        icon,
        source: SourceRef::Settings,
    }
}
