//! Routine command handlers: add, toggle, rm, list.

use super::{plural, short_id, CommandContext};
use chrono::NaiveDate;
use daybell_core::{error::DaybellError, model::ReminderTime};

pub(super) async fn handle_add(
    ctx: &CommandContext<'_>,
    name: &str,
    tasks: &[String],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    at: Option<ReminderTime>,
) -> Result<String, DaybellError> {
    let today = ctx.today();
    let routine = ctx
        .store
        .create_routine(name, start.unwrap_or(today), end, tasks, at, today)
        .await?;
    let n = routine.tasks.len();
    Ok(format!(
        "Added routine [{}] {} with {n} task{}\n{}",
        short_id(&routine.id),
        routine.name,
        plural(n),
        ctx.publish().await?
    ))
}

pub(super) async fn handle_toggle(
    ctx: &CommandContext<'_>,
    routine: &str,
    task: &str,
    date: Option<NaiveDate>,
) -> Result<String, DaybellError> {
    let date = date.unwrap_or_else(|| ctx.today());
    let routine = ctx
        .store
        .toggle_routine_task_completion(routine, task, date)
        .await?;
    let progress = routine.progress(date);
    let verdict = if progress.is_complete() {
        " - all done!".to_string()
    } else {
        String::new()
    };
    Ok(format!(
        "{}: {}/{} done on {date}{verdict}\n{}",
        routine.name,
        progress.completed,
        progress.total,
        ctx.publish().await?
    ))
}

pub(super) async fn handle_rm(ctx: &CommandContext<'_>, id: &str) -> Result<String, DaybellError> {
    let routine = ctx.store.delete_routine(id).await?;
    Ok(format!(
        "Deleted routine [{}] {}\n{}",
        short_id(&routine.id),
        routine.name,
        ctx.publish().await?
    ))
}

pub(super) async fn handle_list(ctx: &CommandContext<'_>) -> String {
    let today = ctx.today();
    let routines = ctx.store.list_routines(today).await;
    if routines.is_empty() {
        return "No routines scheduled today.".to_string();
    }

    let mut out = format!("Routines for {today}\n");
    for routine in &routines {
        let progress = routine.progress(today);
        let time = routine
            .notification_time
            .map(|t| format!(" @ {t}"))
            .unwrap_or_default();
        let until = routine
            .end_date
            .map(|d| format!(", until {d}"))
            .unwrap_or_default();
        let streak = routine.streak(today);
        out.push_str(&format!(
            "\n[{}] {} ({}/{}){time}{until}, streak {streak} day{}",
            short_id(&routine.id),
            routine.name,
            progress.completed,
            progress.total,
            plural(streak as usize),
        ));
        for (i, task) in routine.tasks.iter().enumerate() {
            let check = if task.is_done_on(today) { "x" } else { " " };
            out.push_str(&format!("\n  {}. [{check}] {}", i + 1, task.text));
        }
    }
    out
}
