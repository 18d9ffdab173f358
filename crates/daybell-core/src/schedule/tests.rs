use super::*;
use crate::model::{NotificationSettings, ReminderTime, Routine, Task};
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, d).unwrap()
}

fn at(d: u32, h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, d, h, m, 0).unwrap()
}

fn hhmm(s: &str) -> Option<ReminderTime> {
    Some(s.parse().unwrap())
}

/// Settings with both digests switched off, so only source entries show up.
fn quiet() -> NotificationSettings {
    NotificationSettings {
        enabled: false,
        routine_reminders_enabled: false,
        ..Default::default()
    }
}

fn task(id: &str, created: NaiveDate, time: Option<ReminderTime>) -> Task {
    Task {
        id: id.to_string(),
        text: format!("task {id}"),
        created_date: created,
        completed: false,
        completed_date: None,
        notification_time: time,
    }
}

fn routine_with(done: usize, total: usize, time: Option<ReminderTime>, today: NaiveDate) -> Routine {
    let texts: Vec<String> = (0..total).map(|i| format!("step {i}")).collect();
    let mut routine = Routine::new("Evening", today, None, &texts, time, today);
    routine.id = "r1".to_string();
    let ids: Vec<String> = routine.tasks.iter().take(done).map(|t| t.id.clone()).collect();
    for id in ids {
        routine.toggle_task(&id, today);
    }
    routine
}

// --- Task entries ---

#[test]
fn test_task_due_later_today_emits_one_entry() {
    let tasks = vec![task("1", day(15), hhmm("09:00"))];
    let entries = build(&at(15, 8, 30), &tasks, &[], &quiet());
    assert_eq!(entries.len(), 1);
    let e = &entries[0];
    assert_eq!(e.id, "task-1");
    assert_eq!(e.kind, EntryKind::Task);
    assert_eq!(e.due_at_ms, at(15, 9, 0).timestamp_millis());
    assert_eq!(e.title, "Task Reminder");
    assert_eq!(e.body, "task 1");
    assert_eq!(e.icon, IconKind::Clock);
    assert_eq!(e.source, SourceRef::Task { id: "1".into() });
}

#[test]
fn test_task_time_passed_emits_nothing_and_does_not_roll() {
    let tasks = vec![task("1", day(15), hhmm("09:00"))];
    let entries = build(&at(15, 9, 30), &tasks, &[], &quiet());
    assert!(entries.is_empty());
}

#[test]
fn test_task_exactly_at_due_time_is_not_future() {
    let tasks = vec![task("1", day(15), hhmm("09:00"))];
    assert!(build(&at(15, 9, 0), &tasks, &[], &quiet()).is_empty());
}

#[test]
fn test_task_without_time_or_completed_emits_nothing() {
    let mut done = task("2", day(15), hhmm("18:00"));
    done.toggle(day(15));
    let tasks = vec![task("1", day(15), None), done];
    assert!(build(&at(15, 8, 0), &tasks, &[], &quiet()).is_empty());
}

#[test]
fn test_carried_over_task_reminds_today() {
    let tasks = vec![task("old", day(12), hhmm("17:00"))];
    let entries = build(&at(15, 8, 0), &tasks, &[], &quiet());
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].due_at_ms, at(15, 17, 0).timestamp_millis());
}

#[test]
fn test_task_created_in_future_is_ignored() {
    let tasks = vec![task("future", day(16), hhmm("17:00"))];
    assert!(build(&at(15, 8, 0), &tasks, &[], &quiet()).is_empty());
}

// --- Routine entries ---

#[test]
fn test_routine_with_remaining_tasks_mentions_count() {
    let routines = vec![routine_with(1, 3, hhmm("20:00"), day(15))];
    let entries = build(&at(15, 12, 0), &[], &routines, &quiet());
    assert_eq!(entries.len(), 1);
    let e = &entries[0];
    assert_eq!(e.id, "routine-r1");
    assert_eq!(e.kind, EntryKind::Routine);
    assert_eq!(e.due_at_ms, at(15, 20, 0).timestamp_millis());
    assert!(e.body.contains("2 tasks remaining"), "body was {}", e.body);
    assert!(e.body.starts_with("Evening"));
}

#[test]
fn test_completed_routine_emits_nothing() {
    let routines = vec![routine_with(3, 3, hhmm("20:00"), day(15))];
    assert!(build(&at(15, 12, 0), &[], &routines, &quiet()).is_empty());
}

#[test]
fn test_routine_outside_range_or_without_time_emits_nothing() {
    let mut ended = routine_with(0, 2, hhmm("20:00"), day(10));
    ended.end_date = Some(day(14));
    let untimed = routine_with(0, 2, None, day(15));
    let routines = vec![ended, untimed];
    assert!(build(&at(15, 12, 0), &[], &routines, &quiet()).is_empty());
}

#[test]
fn test_routine_time_passed_does_not_roll() {
    let routines = vec![routine_with(0, 2, hhmm("07:00"), day(15))];
    assert!(build(&at(15, 12, 0), &[], &routines, &quiet()).is_empty());
}

// --- Digests ---

#[test]
fn test_daily_digest_rolls_to_tomorrow_after_slot() {
    let settings = NotificationSettings {
        enabled: true,
        routine_reminders_enabled: false,
        ..Default::default()
    };
    let entries = build(&at(15, 10, 0), &[], &[], &settings);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, DAILY_DIGEST_ID);
    assert_eq!(entries[0].kind, EntryKind::DailyDigest);
    assert_eq!(entries[0].due_at_ms, at(16, 9, 0).timestamp_millis());
}

#[test]
fn test_daily_digest_today_before_slot() {
    let settings = NotificationSettings {
        enabled: true,
        routine_reminders_enabled: false,
        ..Default::default()
    };
    let entries = build(&at(15, 8, 0), &[], &[], &settings);
    assert_eq!(entries[0].due_at_ms, at(15, 9, 0).timestamp_millis());
}

#[test]
fn test_daily_digest_requires_master_switch() {
    let settings = NotificationSettings {
        enabled: false,
        routine_reminders_enabled: false,
        ..Default::default()
    };
    assert!(build(&at(15, 8, 0), &[], &[], &settings).is_empty());
}

#[test]
fn test_routine_digest_follows_its_own_toggle() {
    let settings = NotificationSettings::default();
    let entries = build(&at(15, 21, 0), &[], &[], &settings);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, ROUTINE_DIGEST_ID);
    assert_eq!(entries[0].due_at_ms, at(16, 20, 0).timestamp_millis());

    let off = NotificationSettings {
        routine_reminders_enabled: false,
        ..Default::default()
    };
    assert!(build(&at(15, 21, 0), &[], &[], &off).is_empty());
}

#[test]
fn test_digest_without_time_emits_nothing() {
    let settings = NotificationSettings {
        enabled: true,
        daily_reminder_time: None,
        routine_reminders_enabled: true,
        routine_reminder_time: None,
    };
    assert!(build(&at(15, 8, 0), &[], &[], &settings).is_empty());
}

#[test]
fn test_daily_digest_body_counts_pending_tasks() {
    let settings = NotificationSettings {
        enabled: true,
        routine_reminders_enabled: false,
        ..Default::default()
    };
    let tasks = vec![task("1", day(15), None), task("2", day(14), None)];
    let entries = build(&at(15, 8, 0), &tasks, &[], &settings);
    assert_eq!(entries[0].title, "Daily Reminder");
    assert_eq!(entries[0].body, "You have 2 pending tasks today");
}

// --- Ordering and determinism ---

#[test]
fn test_output_sorted_by_due_then_id() {
    let tasks = vec![
        task("b", day(15), hhmm("11:00")),
        task("a", day(15), hhmm("11:00")),
        task("c", day(15), hhmm("10:00")),
    ];
    let ids: Vec<String> = build(&at(15, 8, 0), &tasks, &[], &quiet())
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, vec!["task-c", "task-a", "task-b"]);
}

#[test]
fn test_build_is_idempotent() {
    let tasks = vec![
        task("1", day(15), hhmm("09:00")),
        task("2", day(13), hhmm("18:30")),
    ];
    let routines = vec![routine_with(1, 3, hhmm("20:00"), day(15))];
    let settings = NotificationSettings {
        enabled: true,
        ..Default::default()
    };
    let now = at(15, 8, 0);
    let first = serde_json::to_string(&build(&now, &tasks, &routines, &settings)).unwrap();
    let second = serde_json::to_string(&build(&now, &tasks, &routines, &settings)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_every_entry_is_strictly_in_the_future() {
    let tasks = vec![task("1", day(15), hhmm("09:00"))];
    let routines = vec![routine_with(0, 1, hhmm("20:00"), day(15))];
    let settings = NotificationSettings {
        enabled: true,
        ..Default::default()
    };
    let now = at(15, 9, 0);
    for entry in build(&now, &tasks, &routines, &settings) {
        assert!(entry.due_at_ms > now.timestamp_millis(), "{} not in future", entry.id);
    }
}

#[test]
fn test_local_offset_is_respected() {
    let tz = FixedOffset::west_opt(5 * 3600).unwrap();
    let now = tz.with_ymd_and_hms(2026, 6, 15, 8, 0, 0).unwrap();
    let tasks = vec![task("1", day(15), hhmm("09:00"))];
    let entries = build(&now, &tasks, &[], &quiet());
    assert_eq!(
        entries[0].due_at_ms,
        Utc.with_ymd_and_hms(2026, 6, 15, 14, 0, 0)
            .unwrap()
            .timestamp_millis()
    );
    assert_eq!(entries[0].due_date(&tz), Some(day(15)));
}

#[test]
fn test_entry_serializes_kind_as_kebab_case() {
    let settings = NotificationSettings {
        enabled: true,
        routine_reminders_enabled: false,
        ..Default::default()
    };
    let json = serde_json::to_string(&build(&at(15, 8, 0), &[], &[], &settings)).unwrap();
    assert!(json.contains("\"kind\":\"daily-digest\""));
    assert!(json.contains("\"source\":{\"type\":\"settings\"}"));
}

// --- Due window ---

#[test]
fn test_due_window_boundaries() {
    let now = at(15, 9, 10).timestamp_millis();
    let w = DEFAULT_DUE_WINDOW_MS;
    assert_eq!(due_status(now, now - w - 1, w), DueStatus::Missed);
    assert_eq!(due_status(now, now - w, w), DueStatus::Due);
    assert_eq!(due_status(now, now, w), DueStatus::Due);
    assert_eq!(due_status(now, now + 1, w), DueStatus::Upcoming);
}

#[test]
fn test_ledger_key_format() {
    assert_eq!(ledger_key("task-1", day(5)), "task-1-2026-06-05");
    let entry = ScheduleEntry {
        id: DAILY_DIGEST_ID.into(),
        due_at_ms: at(15, 9, 0).timestamp_millis(),
        kind: EntryKind::DailyDigest,
        title: String::new(),
        body: String::new(),
        icon: IconKind::Task,
        source: SourceRef::Settings,
    };
    assert_eq!(entry.ledger_key(&Utc).unwrap(), "daily-digest-2026-06-15");
}

// --- Ledger ---

#[test]
fn test_ledger_snapshot_lookup() {
    let ledger: FiredLedger = [("k".to_string(), 10)].into_iter().collect();
    assert!(ledger.contains("k"));
    assert!(!ledger.contains("other"));
    assert_eq!(ledger.len(), 1);
    assert!(FiredLedger::new().is_empty());
}

#[test]
fn test_ledger_retention_cutoff() {
    let now = at(15, 12, 0).timestamp_millis();
    let cutoff = FiredLedger::retention_cutoff(now, LEDGER_RETENTION_DAYS);
    assert_eq!(cutoff, at(13, 12, 0).timestamp_millis());
    assert!(at(12, 9, 0).timestamp_millis() < cutoff);
    assert!(at(15, 9, 0).timestamp_millis() >= cutoff);
}

// --- Summary ---

#[test]
fn test_summary_digest_messages() {
    let empty = DailySummary::default();
    assert_eq!(empty.daily_digest().0, "Daily Todo");
    assert_eq!(empty.routine_digest().1, "No routines scheduled today");

    let all_done = DailySummary {
        pending_tasks: 0,
        completed_tasks: 3,
        pending_routines: 0,
    };
    assert_eq!(all_done.daily_digest().0, "All Done!");
    assert_eq!(all_done.daily_digest().2, IconKind::Check);
    assert_eq!(all_done.routine_digest().0, "Great Job!");

    let one = DailySummary {
        pending_tasks: 1,
        completed_tasks: 0,
        pending_routines: 1,
    };
    assert_eq!(one.daily_digest().1, "You have 1 pending task today");
    assert_eq!(one.routine_digest().1, "1 routine is incomplete today");

    let two = DailySummary {
        pending_tasks: 4,
        completed_tasks: 0,
        pending_routines: 2,
    };
    assert_eq!(two.routine_digest().1, "2 routines are incomplete today");
}

#[test]
fn test_summary_for_date_mixes_tasks_and_routines() {
    let mut done_today = task("d", day(15), None);
    done_today.toggle(day(15));
    let mut done_earlier = task("e", day(10), None);
    done_earlier.toggle(day(11));
    let tasks = vec![task("open", day(14), None), done_today, done_earlier];
    let routines = vec![routine_with(1, 3, None, day(15))];

    let s = DailySummary::for_date(&tasks, &routines, day(15));
    assert_eq!(s.pending_tasks, 1 + 2);
    assert_eq!(s.completed_tasks, 1 + 1);
    assert_eq!(s.pending_routines, 1);
    assert_eq!(s.total_tasks(), 5);
}
