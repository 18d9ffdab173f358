use super::{ScheduleDocument, Store, SCHEDULE_KEY, TASKS_KEY};
use chrono::NaiveDate;
use daybell_core::config::StoreConfig;
use daybell_core::error::DaybellError;
use daybell_core::model::{NotificationSettings, ReminderTime};
use daybell_core::schedule::{EntryKind, IconKind, ScheduleEntry, SourceRef};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Create an in-memory store for testing.
async fn test_store() -> Store {
    let opts = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(opts)
        .await
        .unwrap();
    Store::run_migrations(&pool).await.unwrap();
    Store { pool }
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, d).unwrap()
}

fn at(h: u32, m: u32) -> Option<ReminderTime> {
    ReminderTime::new(h, m)
}

fn entry(id: &str, due_at_ms: i64) -> ScheduleEntry {
    ScheduleEntry {
        id: id.to_string(),
        due_at_ms,
        kind: EntryKind::Task,
        title: "Task Reminder".to_string(),
        body: "Call mom".to_string(),
        icon: IconKind::Task,
        source: SourceRef::Task {
            id: "t1".to_string(),
        },
    }
}

// ===================================================================
// Migrations and documents
// ===================================================================

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let store = test_store().await;
    Store::run_migrations(&store.pool).await.unwrap();
    let applied: Vec<(String,)> = sqlx::query_as("SELECT name FROM _migrations ORDER BY name")
        .fetch_all(&store.pool)
        .await
        .unwrap();
    assert_eq!(applied.len(), 2);
    assert_eq!(applied[0].0, "001_init");
}

#[tokio::test]
async fn test_new_creates_file_and_parent_dir() {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!("__daybell_store_{}_{n}", std::process::id()));
    let db = dir.join("nested").join("daybell.db");
    let config = StoreConfig {
        db_path: db.to_string_lossy().to_string(),
    };

    let store = Store::new(&config).await.unwrap();
    store.put_raw("marker", "1").await.unwrap();
    drop(store);

    let reopened = Store::new(&config).await.unwrap();
    assert_eq!(reopened.get_raw("marker").await.unwrap().as_deref(), Some("1"));
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_kv_overwrite() {
    let store = test_store().await;
    assert!(store.get_raw("k").await.unwrap().is_none());
    store.put_raw("k", "a").await.unwrap();
    store.put_raw("k", "b").await.unwrap();
    assert_eq!(store.get_raw("k").await.unwrap().as_deref(), Some("b"));
}

#[tokio::test]
async fn test_corrupt_document_is_serialization_error() {
    let store = test_store().await;
    store.put_raw(TASKS_KEY, "{not json").await.unwrap();
    let err = store
        .get_json::<Vec<daybell_core::model::Task>>(TASKS_KEY)
        .await
        .unwrap_err();
    assert!(matches!(err, DaybellError::Serialization(_)));
}

#[tokio::test]
async fn test_typed_loaders_fall_back_on_corrupt_data() {
    let store = test_store().await;
    store.put_raw(TASKS_KEY, "{not json").await.unwrap();
    store.put_raw(SCHEDULE_KEY, "[1,2").await.unwrap();
    store
        .put_raw(super::SETTINGS_KEY, "\"nope\"")
        .await
        .unwrap();

    assert!(store.load_tasks().await.is_empty());
    assert!(store.load_schedule().await.schedule.is_empty());
    assert_eq!(store.load_settings().await, NotificationSettings::default());
}

#[tokio::test]
async fn test_mutations_refuse_to_overwrite_corrupt_documents() {
    let store = test_store().await;
    let corrupt_tasks = r#"[{"id":"t1","text":"Call mom","created_date":"2026-06-15","notification_time":"25:00"}]"#;
    store.put_raw(TASKS_KEY, corrupt_tasks).await.unwrap();
    store.put_raw(super::ROUTINES_KEY, "{not json").await.unwrap();

    let err = store.create_task("New", day(15), None).await.unwrap_err();
    assert!(matches!(err, DaybellError::Serialization(_)));
    assert!(matches!(
        store.toggle_task_completion("t1", day(15)).await,
        Err(DaybellError::Serialization(_))
    ));
    assert!(matches!(
        store.delete_task("t1").await,
        Err(DaybellError::Serialization(_))
    ));
    assert_eq!(
        store.get_raw(TASKS_KEY).await.unwrap().as_deref(),
        Some(corrupt_tasks)
    );

    let tasks = vec!["Stretch".to_string()];
    let err = store
        .create_routine("Morning", day(15), None, &tasks, None, day(15))
        .await
        .unwrap_err();
    assert!(matches!(err, DaybellError::Serialization(_)));
    assert!(matches!(
        store.delete_routine("r1").await,
        Err(DaybellError::Serialization(_))
    ));
    assert_eq!(
        store.get_raw(super::ROUTINES_KEY).await.unwrap().as_deref(),
        Some("{not json")
    );
}

#[tokio::test]
async fn test_read_settings_surfaces_corruption() {
    let store = test_store().await;
    assert_eq!(store.read_settings().await.unwrap(), NotificationSettings::default());
    store.put_raw(super::SETTINGS_KEY, "\"nope\"").await.unwrap();
    assert!(matches!(
        store.read_settings().await,
        Err(DaybellError::Serialization(_))
    ));
    assert_eq!(store.load_settings().await, NotificationSettings::default());
}

#[tokio::test]
async fn test_missing_documents_read_as_empty() {
    let store = test_store().await;
    assert!(store.load_tasks().await.is_empty());
    assert!(store.load_routines().await.is_empty());
    assert_eq!(store.load_schedule().await, ScheduleDocument::default());
    assert!(store.load_ledger().await.is_empty());
}

#[tokio::test]
async fn test_settings_round_trip() {
    let store = test_store().await;
    let settings = NotificationSettings {
        enabled: true,
        daily_reminder_time: at(7, 30),
        routine_reminders_enabled: false,
        routine_reminder_time: None,
    };
    store.save_settings(&settings).await.unwrap();
    assert_eq!(store.load_settings().await, settings);
}

#[tokio::test]
async fn test_schedule_document_persists_username() {
    let store = test_store().await;
    let doc = ScheduleDocument {
        schedule: vec![entry("task-t1", 1_000)],
        username: Some("sam".to_string()),
        published_at_ms: 42,
    };
    store.save_schedule(&doc).await.unwrap();
    assert_eq!(store.load_schedule().await, doc);
}

// ===================================================================
// Tasks
// ===================================================================

#[tokio::test]
async fn test_create_toggle_delete_task() {
    let store = test_store().await;
    let task = store.create_task("  Call mom ", day(15), at(10, 0)).await.unwrap();
    assert_eq!(task.text, "Call mom");
    assert_eq!(task.created_date, day(15));

    let toggled = store.toggle_task_completion(&task.id[..8], day(16)).await.unwrap();
    assert!(toggled.completed);
    assert_eq!(toggled.completed_date, Some(day(16)));

    let reopened = store.toggle_task_completion(&task.id, day(16)).await.unwrap();
    assert!(!reopened.completed);
    assert!(reopened.completed_date.is_none());

    let removed = store.delete_task(&task.id).await.unwrap();
    assert_eq!(removed.id, task.id);
    assert!(store.load_tasks().await.is_empty());
}

#[tokio::test]
async fn test_create_task_rejects_blank_text() {
    let store = test_store().await;
    let err = store.create_task("   ", day(15), None).await.unwrap_err();
    assert!(matches!(err, DaybellError::InvalidInput(_)));
}

#[tokio::test]
async fn test_unknown_task_id_is_invalid_input() {
    let store = test_store().await;
    store.create_task("a", day(15), None).await.unwrap();
    let err = store.delete_task("zzzz-nope").await.unwrap_err();
    assert!(matches!(err, DaybellError::InvalidInput(_)));
    assert_eq!(store.load_tasks().await.len(), 1);
}

#[test]
fn test_ambiguous_prefix_is_rejected() {
    let ids = ["abc1", "abc2", "xyz"];
    let err = super::tasks::resolve_prefix(ids.iter().copied(), "abc", "task").unwrap_err();
    assert!(err.to_string().contains("matches 2 tasks"));
    let idx = super::tasks::resolve_prefix(ids.iter().copied(), "abc2", "task").unwrap();
    assert_eq!(idx, 1);
}

#[tokio::test]
async fn test_list_tasks_shows_carry_over_and_today_completions() {
    let store = test_store().await;
    let old = store.create_task("old", day(10), None).await.unwrap();
    let done = store.create_task("done", day(10), None).await.unwrap();
    store.create_task("future", day(20), None).await.unwrap();
    store.toggle_task_completion(&done.id, day(12)).await.unwrap();

    let on_15: Vec<String> = store.list_tasks(day(15)).await.into_iter().map(|t| t.id).collect();
    assert_eq!(on_15, vec![old.id.clone()]);

    let on_12 = store.list_tasks(day(12)).await;
    assert_eq!(on_12.len(), 2);
}

// ===================================================================
// Routines
// ===================================================================

#[tokio::test]
async fn test_create_and_toggle_routine() {
    let store = test_store().await;
    let texts = vec!["Meditate".to_string(), " ".to_string(), "Stretch".to_string()];
    let routine = store
        .create_routine("Morning", day(1), Some(day(30)), &texts, at(7, 0), day(1))
        .await
        .unwrap();
    assert_eq!(routine.tasks.len(), 2);

    let updated = store
        .toggle_routine_task_completion(&routine.id, "2", day(15))
        .await
        .unwrap();
    assert_eq!(updated.progress(day(15)).completed, 1);
    assert!(updated.tasks[1].is_done_on(day(15)));
    assert!(!updated.tasks[1].is_done_on(day(14)));

    let first_id = routine.tasks[0].id.clone();
    let updated = store
        .toggle_routine_task_completion(&routine.id, &first_id, day(15))
        .await
        .unwrap();
    assert!(updated.progress(day(15)).is_complete());

    let persisted = store.load_routines().await;
    assert!(persisted[0].progress(day(15)).is_complete());
}

#[tokio::test]
async fn test_toggle_outside_range_is_rejected() {
    let store = test_store().await;
    let routine = store
        .create_routine("Trip", day(10), Some(day(12)), &["Pack".to_string()], None, day(9))
        .await
        .unwrap();
    let err = store
        .toggle_routine_task_completion(&routine.id, "1", day(13))
        .await
        .unwrap_err();
    assert!(matches!(err, DaybellError::InvalidInput(_)));
}

#[tokio::test]
async fn test_create_routine_validation() {
    let store = test_store().await;
    let tasks = vec!["x".to_string()];
    assert!(store
        .create_routine("", day(1), None, &tasks, None, day(1))
        .await
        .is_err());
    assert!(store
        .create_routine("R", day(5), Some(day(4)), &tasks, None, day(1))
        .await
        .is_err());
    assert!(store
        .create_routine("R", day(5), None, &[], None, day(1))
        .await
        .is_err());
    assert!(store.load_routines().await.is_empty());
}

#[tokio::test]
async fn test_list_and_delete_routines() {
    let store = test_store().await;
    let tasks = vec!["x".to_string()];
    let b = store
        .create_routine("Bravo", day(1), None, &tasks, None, day(1))
        .await
        .unwrap();
    store
        .create_routine("Alpha", day(1), None, &tasks, None, day(1))
        .await
        .unwrap();
    store
        .create_routine("Later", day(20), None, &tasks, None, day(1))
        .await
        .unwrap();

    let names: Vec<String> = store
        .list_routines(day(15))
        .await
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, vec!["Alpha", "Bravo"]);

    store.delete_routine(&b.id).await.unwrap();
    assert_eq!(store.load_routines().await.len(), 2);
}

// ===================================================================
// Fired ledger
// ===================================================================

#[tokio::test]
async fn test_claim_is_insert_once() {
    let store = test_store().await;
    assert!(store.claim_fired("task-t1-2026-06-15", "task-t1", 100).await.unwrap());
    assert!(!store.claim_fired("task-t1-2026-06-15", "task-t1", 200).await.unwrap());

    let row: (i64,) = sqlx::query_as("SELECT fired_at_ms FROM fired_ledger WHERE key = ?")
        .bind("task-t1-2026-06-15")
        .fetch_one(&store.pool)
        .await
        .unwrap();
    assert_eq!(row.0, 100);
    assert_eq!(store.load_ledger().await.len(), 1);
}

#[tokio::test]
async fn test_release_allows_reclaim() {
    let store = test_store().await;
    assert!(store.claim_fired("k", "e", 1).await.unwrap());
    assert!(store.release_fired("k").await.unwrap());
    assert!(!store.release_fired("k").await.unwrap());
    assert!(store.claim_fired("k", "e", 2).await.unwrap());
}

#[tokio::test]
async fn test_prune_ledger_drops_old_keys_only() {
    let store = test_store().await;
    store.claim_fired("old", "e", 1_000).await.unwrap();
    store.claim_fired("edge", "e", 5_000).await.unwrap();
    store.claim_fired("new", "e", 9_000).await.unwrap();

    let removed = store.prune_ledger(5_000).await.unwrap();
    assert_eq!(removed, 1);
    let ledger = store.load_ledger().await;
    assert!(!ledger.contains("old"));
    assert!(ledger.contains("edge"));
    assert!(ledger.contains("new"));
}

#[tokio::test]
async fn test_concurrent_claims_have_one_winner() {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let path = std::env::temp_dir().join(format!("__daybell_race_{}_{n}.db", std::process::id()));
    let config = StoreConfig {
        db_path: path.to_string_lossy().to_string(),
    };
    let a = Store::new(&config).await.unwrap();
    let b = Store::new(&config).await.unwrap();

    let (ra, rb) = tokio::join!(
        a.claim_fired("daily-digest-2026-06-15", "daily-digest", 1),
        b.claim_fired("daily-digest-2026-06-15", "daily-digest", 2),
    );
    assert!(ra.unwrap() ^ rb.unwrap());

    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
    }
}
