//! Reminder sources (tasks and routines) and user notification settings.

pub mod routine;
pub mod settings;
pub mod task;
pub mod time;

pub use routine::{Routine, RoutineProgress, RoutineTask};
pub use settings::NotificationSettings;
pub use task::Task;
pub use time::{is_date_in_range, parse_date, ReminderTime};
