//! Init wizard: interactive setup for new users with cliclack styled prompts.

use crate::service;
use daybell_core::{
    clock::SystemClock,
    config::{AgentConfig, NotifyBackend, StoreConfig},
    error::DaybellError,
    model::{NotificationSettings, ReminderTime},
    shellexpand,
    traits::NotificationSink,
};
use daybell_notify::DesktopSink;
use daybell_store::Store;
use std::path::Path;

const LOGO: &str = r#"
     ___               __         ____
    / _ \ ___ _ __ __ / /  ___   / / /
   / // // _ `// // // _ \/ -_) / / /
  /____/ \_,_/ \_, //_.__/\__/ /_/_/
              /___/
"#;

/// Run the interactive init wizard.
pub async fn run() -> anyhow::Result<()> {
    println!("{LOGO}");
    cliclack::intro("daybell init")?;

    // 1. Create data directory.
    let data_dir = shellexpand("~/.daybell");
    if !Path::new(&data_dir).exists() {
        std::fs::create_dir_all(&data_dir)?;
        cliclack::log::success(format!("{data_dir} — created"))?;
    } else {
        cliclack::log::success(format!("{data_dir} — exists"))?;
    }

    // 2. Check the desktop notifier.
    let spinner = cliclack::spinner();
    spinner.start("Checking desktop notifications...");
    let desktop_ok = DesktopSink::new(0).is_available().await;
    if desktop_ok {
        spinner.stop("Desktop notifications — available");
    } else {
        spinner.error("Desktop notifications — NOT FOUND");
        cliclack::note(
            "Desktop notifications",
            "Linux: install libnotify (e.g. `apt install libnotify-bin`).\n\
             macOS: osascript ships with the system.\n\n\
             Reminders can still be written to the log until then.",
        )?;
    }

    // 3. Backend.
    let backend: NotifyBackend = if desktop_ok {
        cliclack::select("Where should reminders appear?")
            .item(
                NotifyBackend::Desktop,
                "Desktop (Recommended)",
                "Native notification banners",
            )
            .item(NotifyBackend::Log, "Log only", "Headless hosts and servers")
            .interact()?
    } else {
        NotifyBackend::Log
    };

    let sound: bool = cliclack::confirm("Play a sound with each reminder?")
        .initial_value(true)
        .interact()?;

    // 4. Owner name (optional).
    let username: String = cliclack::input("Your name")
        .placeholder("Shown alongside published schedules (Enter to skip)")
        .required(false)
        .default_input("")
        .interact()?;
    let username = Some(username.trim().to_string()).filter(|u| !u.is_empty());

    // 5. Reminder times.
    let defaults = NotificationSettings::default();
    let daily_enabled: bool = cliclack::confirm("Send a daily digest of open tasks?")
        .initial_value(backend == NotifyBackend::Desktop)
        .interact()?;
    let daily_time = prompt_time("Daily digest time", defaults.daily_reminder_time)?;
    let routine_enabled: bool = cliclack::confirm("Remind you about unfinished routines?")
        .initial_value(true)
        .interact()?;
    let routine_time = if routine_enabled {
        prompt_time("Routine reminder time", defaults.routine_reminder_time)?
    } else {
        None
    };
    let settings = wizard_settings(daily_enabled, daily_time, routine_enabled, routine_time);

    // 6. Generate config.toml.
    let config_path = "config.toml";
    if Path::new(config_path).exists() {
        cliclack::log::warning(
            "config.toml already exists — skipping.\nDelete it and run 'daybell init' again to regenerate.",
        )?;
    } else {
        let config = generate_config(backend, sound, username.as_deref());
        std::fs::write(config_path, config)?;
        cliclack::log::success("Generated config.toml")?;
    }

    // 7. Persist reminder settings and publish the first schedule.
    let store = Store::new(&StoreConfig::default()).await?;
    store.save_settings(&settings).await?;
    let entries = crate::daemon::publish_schedule(&store, &SystemClock, username).await?;
    cliclack::log::success(format!(
        "Reminder settings saved — {} reminder(s) scheduled today",
        entries.len()
    ))?;

    // 8. Periodic check.
    let install: bool = cliclack::confirm("Check reminders in the background, even when Daybell is closed?")
        .initial_value(true)
        .interact()?;
    if install {
        let agent = AgentConfig::default();
        let interval = service::trigger_interval(agent.tick_secs, agent.due_window_secs);
        if let Err(e) = service::install(config_path, &data_dir, interval) {
            cliclack::log::warning(format!("Periodic check setup failed: {e}"))?;
            cliclack::log::info("You can retry later with: daybell service install")?;
        }
    }

    cliclack::note(
        "Next steps",
        "daybell task add Water the plants --at 18:00\n\
         daybell routine add Morning --task Stretch --task Journal --at 08:30\n\
         daybell notify test\n\
         daybell start",
    )?;
    cliclack::outro("Setup complete")?;
    Ok(())
}

/// Prompt for an `HH:MM` time, pre-filled with `initial` when there is one.
fn prompt_time(
    prompt: &str,
    initial: Option<ReminderTime>,
) -> anyhow::Result<Option<ReminderTime>> {
    let prefill = initial.map(|t| t.to_string()).unwrap_or_default();
    let raw: String = cliclack::input(prompt)
        .default_input(&prefill)
        .validate(|s: &String| {
            parse_time_answer(s)
                .map(|_| ())
                .map_err(|_| "Use 24-hour HH:MM, e.g. 09:00 (blank for none)")
        })
        .interact()?;
    Ok(parse_time_answer(&raw)?)
}

/// A blank answer means "no time".
fn parse_time_answer(raw: &str) -> Result<Option<ReminderTime>, DaybellError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse().map(Some)
}

/// Settings from wizard answers. A skipped time keeps the default slot.
fn wizard_settings(
    daily_enabled: bool,
    daily_time: Option<ReminderTime>,
    routine_enabled: bool,
    routine_time: Option<ReminderTime>,
) -> NotificationSettings {
    let defaults = NotificationSettings::default();
    NotificationSettings {
        enabled: daily_enabled,
        daily_reminder_time: daily_time.or(defaults.daily_reminder_time),
        routine_reminders_enabled: routine_enabled,
        routine_reminder_time: routine_time.or(defaults.routine_reminder_time),
    }
}

/// Generate the config.toml content from wizard answers.
pub fn generate_config(backend: NotifyBackend, sound: bool, username: Option<&str>) -> String {
    let backend_name = backend.display_name();
    let username_line = match username {
        Some(name) if !name.is_empty() => format!(
            "username = \"{}\"",
            name.replace('\\', "\\\\").replace('"', "\\\"")
        ),
        _ => "# username = \"\"".to_string(),
    };

    format!(
        r#"[daybell]
name = "Daybell"
data_dir = "~/.daybell"
log_level = "info"

[store]
db_path = "~/.daybell/daybell.db"

[scheduler]
enabled = true
refresh_interval_secs = 60

[agent]
enabled = true
tick_secs = 60
due_window_secs = 300
ledger_retention_days = 2
prune_interval_hours = 24

[notify]
backend = "{backend_name}"
sound = {sound}
timeout_secs = 10
{username_line}
"#
    )
}
