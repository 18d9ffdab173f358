//! Reminder settings handlers: enable, disable, set, test, sound.

use super::CommandContext;
use daybell_core::{error::DaybellError, model::ReminderTime};
use daybell_notify::{Delivery, Permission};

pub(super) async fn handle_enable(ctx: &CommandContext<'_>) -> Result<String, DaybellError> {
    if ctx.notifier.request_permission().await != Permission::Granted {
        return Ok(format!(
            "Notifications could not be enabled: the {} notifier is not available on this system.",
            ctx.notifier.sink_name()
        ));
    }

    let mut settings = ctx.store.read_settings().await?;
    settings.enabled = true;
    ctx.store.save_settings(&settings).await?;
    ctx.notifier.send_test_notification().await;

    let at = settings
        .daily_reminder_time
        .map(|t| format!(" at {t}"))
        .unwrap_or_default();
    Ok(format!(
        "Daily reminder enabled{at}.\n{}",
        ctx.publish().await?
    ))
}

pub(super) async fn handle_disable(ctx: &CommandContext<'_>) -> Result<String, DaybellError> {
    let mut settings = ctx.store.read_settings().await?;
    settings.enabled = false;
    ctx.store.save_settings(&settings).await?;
    Ok(format!("Daily reminder disabled.\n{}", ctx.publish().await?))
}

pub(super) async fn handle_set(
    ctx: &CommandContext<'_>,
    daily: Option<ReminderTime>,
    routine: Option<ReminderTime>,
    routine_reminders: Option<bool>,
) -> Result<String, DaybellError> {
    if daily.is_none() && routine.is_none() && routine_reminders.is_none() {
        return Err(DaybellError::InvalidInput(
            "nothing to set; use --daily, --routine or --routine-reminders".into(),
        ));
    }

    let mut settings = ctx.store.read_settings().await?;
    if daily.is_some() {
        settings.daily_reminder_time = daily;
    }
    if routine.is_some() {
        settings.routine_reminder_time = routine;
    }
    if let Some(on) = routine_reminders {
        settings.routine_reminders_enabled = on;
    }
    ctx.store.save_settings(&settings).await?;

    Ok(format!(
        "{}\n{}",
        describe_settings(&settings),
        ctx.publish().await?
    ))
}

pub(super) async fn handle_test(ctx: &CommandContext<'_>) -> String {
    ctx.notifier.request_permission().await;
    match ctx.notifier.send_test_notification().await {
        Delivery::Delivered => "Test notification sent.".to_string(),
        Delivery::Suppressed => format!(
            "Notifications are not permitted: the {} notifier is not available.",
            ctx.notifier.sink_name()
        ),
        Delivery::Failed => "Test notification failed; see the log for details.".to_string(),
    }
}

pub(super) async fn handle_sound(ctx: &CommandContext<'_>) -> String {
    ctx.notifier.play_sound().await;
    "Played reminder sound.".to_string()
}

/// One-line summary of the stored settings.
pub(super) fn describe_settings(settings: &daybell_core::model::NotificationSettings) -> String {
    let time = |t: Option<ReminderTime>| t.map(|t| t.to_string()).unwrap_or_else(|| "unset".into());
    format!(
        "Daily reminder: {} at {} | Routine reminder: {} at {}",
        if settings.enabled { "on" } else { "off" },
        time(settings.daily_reminder_time),
        if settings.routine_reminders_enabled { "on" } else { "off" },
        time(settings.routine_reminder_time),
    )
}
