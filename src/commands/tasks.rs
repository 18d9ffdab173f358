//! Task command handlers: add, done, rm, list.

use super::{short_id, CommandContext};
use daybell_core::{error::DaybellError, model::ReminderTime};

pub(super) async fn handle_add(
    ctx: &CommandContext<'_>,
    text: &str,
    at: Option<ReminderTime>,
) -> Result<String, DaybellError> {
    let task = ctx.store.create_task(text, ctx.today(), at).await?;
    let reminder = at.map(|t| format!(" (reminder {t})")).unwrap_or_default();
    Ok(format!(
        "Added [{}] {}{reminder}\n{}",
        short_id(&task.id),
        task.text,
        ctx.publish().await?
    ))
}

pub(super) async fn handle_done(ctx: &CommandContext<'_>, id: &str) -> Result<String, DaybellError> {
    let task = ctx.store.toggle_task_completion(id, ctx.today()).await?;
    let state = if task.completed { "Completed" } else { "Reopened" };
    Ok(format!("{state} [{}] {}\n{}", short_id(&task.id), task.text, ctx.publish().await?))
}

pub(super) async fn handle_rm(ctx: &CommandContext<'_>, id: &str) -> Result<String, DaybellError> {
    let task = ctx.store.delete_task(id).await?;
    Ok(format!("Deleted [{}] {}\n{}", short_id(&task.id), task.text, ctx.publish().await?))
}

pub(super) async fn handle_list(ctx: &CommandContext<'_>) -> String {
    let today = ctx.today();
    let tasks = ctx.store.list_tasks(today).await;
    if tasks.is_empty() {
        return "No tasks for today.".to_string();
    }

    let mut out = format!("Tasks for {today}\n");
    for task in &tasks {
        let check = if task.completed { "x" } else { " " };
        let time = task
            .notification_time
            .map(|t| format!(" @ {t}"))
            .unwrap_or_default();
        let carried = if task.is_carried_over(today) {
            format!(" (carried over from {})", task.created_date)
        } else {
            String::new()
        };
        out.push_str(&format!(
            "\n[{check}] [{}] {}{time}{carried}",
            short_id(&task.id),
            task.text
        ));
    }
    out
}
