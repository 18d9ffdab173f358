//! One-time task CRUD.

use super::{Store, TASKS_KEY};
use chrono::NaiveDate;
use daybell_core::{
    error::DaybellError,
    model::{ReminderTime, Task},
};
use tracing::warn;

impl Store {
    /// All tasks. A missing or unreadable document reads as an empty list.
    pub async fn load_tasks(&self) -> Vec<Task> {
        match self.read_tasks().await {
            Ok(tasks) => tasks,
            Err(e) => {
                warn!("store: tasks unreadable, treating as empty: {e}");
                Vec::new()
            }
        }
    }

    /// All tasks, failing on an unreadable document. Mutations read through
    /// this so they never overwrite data they could not parse.
    pub async fn read_tasks(&self) -> Result<Vec<Task>, DaybellError> {
        Ok(self
            .get_json::<Vec<Task>>(TASKS_KEY)
            .await?
            .unwrap_or_default())
    }

    pub async fn save_tasks(&self, tasks: &[Task]) -> Result<(), DaybellError> {
        self.put_json(TASKS_KEY, tasks).await
    }

    /// Tasks shown on `date`'s list, oldest first.
    pub async fn list_tasks(&self, date: NaiveDate) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .load_tasks()
            .await
            .into_iter()
            .filter(|t| t.is_visible_on(date))
            .collect();
        tasks.sort_by(|a, b| a.created_date.cmp(&b.created_date));
        tasks
    }

    pub async fn create_task(
        &self,
        text: &str,
        today: NaiveDate,
        notification_time: Option<ReminderTime>,
    ) -> Result<Task, DaybellError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DaybellError::InvalidInput("task text is empty".into()));
        }
        let task = Task::new(text, today, notification_time);
        let mut tasks = self.read_tasks().await?;
        tasks.push(task.clone());
        self.save_tasks(&tasks).await?;
        Ok(task)
    }

    /// Flip completion of the task whose id starts with `id_prefix`.
    pub async fn toggle_task_completion(
        &self,
        id_prefix: &str,
        today: NaiveDate,
    ) -> Result<Task, DaybellError> {
        let mut tasks = self.read_tasks().await?;
        let idx = resolve_prefix(tasks.iter().map(|t| t.id.as_str()), id_prefix, "task")?;
        tasks[idx].toggle(today);
        let task = tasks[idx].clone();
        self.save_tasks(&tasks).await?;
        Ok(task)
    }

    pub async fn delete_task(&self, id_prefix: &str) -> Result<Task, DaybellError> {
        let mut tasks = self.read_tasks().await?;
        let idx = resolve_prefix(tasks.iter().map(|t| t.id.as_str()), id_prefix, "task")?;
        let removed = tasks.remove(idx);
        self.save_tasks(&tasks).await?;
        Ok(removed)
    }
}

/// Index of the single id starting with `prefix`.
pub(super) fn resolve_prefix<'a>(
    ids: impl Iterator<Item = &'a str>,
    prefix: &str,
    what: &str,
) -> Result<usize, DaybellError> {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        return Err(DaybellError::InvalidInput(format!("{what} id is empty")));
    }
    let matches: Vec<usize> = ids
        .enumerate()
        .filter(|(_, id)| id.starts_with(prefix))
        .map(|(i, _)| i)
        .collect();
    match matches.as_slice() {
        [only] => Ok(*only),
        [] => Err(DaybellError::InvalidInput(format!("no {what} matches '{prefix}'"))),
        _ => Err(DaybellError::InvalidInput(format!(
            "'{prefix}' matches {} {what}s, use a longer id",
            matches.len()
        ))),
    }
}
