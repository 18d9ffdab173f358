//! CLI command handlers for tasks, routines, and reminder settings.
//!
//! Every handler returns the text to print. Mutations republish the
//! schedule so a running background agent sees the change.

mod notify;
mod routines;
mod status;
mod tasks;


pub use status::{handle_schedule, handle_status};

use chrono::NaiveDate;
use clap::{Subcommand, ValueEnum};
use daybell_core::{clock::Clock, error::DaybellError, model::ReminderTime};
use daybell_notify::Notifier;
use daybell_store::Store;

/// Grouped context for command execution.
pub struct CommandContext<'a> {
    pub store: &'a Store,
    pub clock: &'a dyn Clock,
    pub notifier: &'a Notifier,
    pub username: Option<&'a str>,
}

impl CommandContext<'_> {
    fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }

    /// Rebuild and persist the schedule. Returns a one-line summary.
    async fn publish(&self) -> Result<String, DaybellError> {
        let entries = crate::daemon::publish_schedule(
            self.store,
            self.clock,
            self.username.map(str::to_string),
        )
        .await?;
        let n = entries.len();
        Ok(format!("{n} reminder{} scheduled", plural(n)))
    }
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a one-time task.
    Add {
        /// Task text.
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
        /// Reminder time (HH:MM) on the day the task is open.
        #[arg(long)]
        at: Option<ReminderTime>,
    },
    /// Toggle a task done / not done.
    Done { id: String },
    /// Delete a task.
    Rm { id: String },
    /// List today's tasks.
    List,
}

#[derive(Subcommand)]
pub enum RoutineAction {
    /// Add a recurring routine.
    Add {
        name: String,
        /// Checklist item (repeatable).
        #[arg(long = "task", required = true)]
        tasks: Vec<String>,
        /// First day (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Last day (YYYY-MM-DD). Open-ended if omitted.
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Reminder time (HH:MM) while items remain.
        #[arg(long)]
        at: Option<ReminderTime>,
    },
    /// Toggle one checklist item, by number or id.
    Toggle {
        routine: String,
        task: String,
        /// Day to mark (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Delete a routine.
    Rm { id: String },
    /// List routines active today.
    List,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

#[derive(Subcommand)]
pub enum NotifyAction {
    /// Turn on the daily digest (checks the notifier first).
    Enable,
    /// Turn off the daily digest.
    Disable,
    /// Change reminder times.
    Set {
        /// Daily digest time (HH:MM).
        #[arg(long)]
        daily: Option<ReminderTime>,
        /// Routine digest time (HH:MM).
        #[arg(long)]
        routine: Option<ReminderTime>,
        /// Routine digest on or off.
        #[arg(long, value_enum)]
        routine_reminders: Option<Switch>,
    },
    /// Send a test notification.
    Test,
    /// Play the reminder sound only.
    Sound,
}

pub async fn handle_task(action: TaskAction, ctx: &CommandContext<'_>) -> Result<String, DaybellError> {
    match action {
        TaskAction::Add { text, at } => tasks::handle_add(ctx, &text.join(" "), at).await,
        TaskAction::Done { id } => tasks::handle_done(ctx, &id).await,
        TaskAction::Rm { id } => tasks::handle_rm(ctx, &id).await,
        TaskAction::List => Ok(tasks::handle_list(ctx).await),
    }
}

pub async fn handle_routine(
    action: RoutineAction,
    ctx: &CommandContext<'_>,
) -> Result<String, DaybellError> {
    match action {
        RoutineAction::Add {
            name,
            tasks,
            start,
            end,
            at,
        } => routines::handle_add(ctx, &name, &tasks, start, end, at).await,
        RoutineAction::Toggle {
            routine,
            task,
            date,
        } => routines::handle_toggle(ctx, &routine, &task, date).await,
        RoutineAction::Rm { id } => routines::handle_rm(ctx, &id).await,
        RoutineAction::List => Ok(routines::handle_list(ctx).await),
    }
}

pub async fn handle_notify(
    action: NotifyAction,
    ctx: &CommandContext<'_>,
) -> Result<String, DaybellError> {
    match action {
        NotifyAction::Enable => notify::handle_enable(ctx).await,
        NotifyAction::Disable => notify::handle_disable(ctx).await,
        NotifyAction::Set {
            daily,
            routine,
            routine_reminders,
        } => notify::handle_set(ctx, daily, routine, routine_reminders.map(Switch::is_on)).await,
        NotifyAction::Test => Ok(notify::handle_test(ctx).await),
        NotifyAction::Sound => Ok(notify::handle_sound(ctx).await),
    }
}

/// First 8 characters of an id, for display.
fn short_id(id: &str) -> &str {
    &id[..8.min(id.len())]
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
