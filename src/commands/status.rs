//! Status and schedule overview.

use super::{notify::describe_settings, plural, CommandContext};
use chrono::{Local, TimeZone};
use daybell_core::{config::Config, error::DaybellError, schedule::ScheduleEntry, shellexpand};

pub async fn handle_status(ctx: &CommandContext<'_>, cfg: &Config, config_path: &str) -> String {
    let available = ctx.notifier.request_permission().await;
    let settings = ctx.store.load_settings().await;
    let doc = ctx.store.load_schedule().await;
    let ledger = ctx.store.load_ledger().await;

    let published = if doc.published_at_ms > 0 {
        Local
            .timestamp_millis_opt(doc.published_at_ms)
            .single()
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown".to_string())
    } else {
        "never".to_string()
    };

    format!(
        "Daybell status\n\
         \n\
         Config: {config_path}\n\
         Store: {}\n\
         Notifier: {} ({})\n\
         {}\n\
         Published schedule: {} entr{} (last published {published})\n\
         Fired ledger: {} key{}",
        shellexpand(&cfg.store.db_path),
        ctx.notifier.sink_name(),
        available.as_str(),
        describe_settings(&settings),
        doc.schedule.len(),
        if doc.schedule.len() == 1 { "y" } else { "ies" },
        ledger.len(),
        plural(ledger.len()),
    )
}

/// Rebuild, publish, and print the schedule.
pub async fn handle_schedule(ctx: &CommandContext<'_>) -> Result<String, DaybellError> {
    let summary = ctx.publish().await?;
    let doc = ctx.store.load_schedule().await;
    if doc.schedule.is_empty() {
        return Ok("Nothing scheduled.".to_string());
    }
    let mut out = format!("{summary}\n");
    for entry in &doc.schedule {
        out.push_str(&format!("\n{}", format_entry(entry)));
    }
    Ok(out)
}

fn format_entry(entry: &ScheduleEntry) -> String {
    let due = entry
        .due_at(&Local)
        .map(|t| t.format("%a %Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| entry.due_at_ms.to_string());
    format!(
        "{due}  {:<14} {}: {}",
        entry.kind.as_str(),
        entry.title,
        entry.body
    )
}
