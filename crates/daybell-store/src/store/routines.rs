//! Routine CRUD and per-day completion marks.

use super::{tasks::resolve_prefix, Store, ROUTINES_KEY};
use chrono::NaiveDate;
use daybell_core::{
    error::DaybellError,
    model::{ReminderTime, Routine},
};
use tracing::warn;

impl Store {
    /// All routines. A missing or unreadable document reads as an empty list.
    pub async fn load_routines(&self) -> Vec<Routine> {
        match self.read_routines().await {
            Ok(routines) => routines,
            Err(e) => {
                warn!("store: routines unreadable, treating as empty: {e}");
                Vec::new()
            }
        }
    }

    /// All routines, failing on an unreadable document.
    pub async fn read_routines(&self) -> Result<Vec<Routine>, DaybellError> {
        Ok(self
            .get_json::<Vec<Routine>>(ROUTINES_KEY)
            .await?
            .unwrap_or_default())
    }

    pub async fn save_routines(&self, routines: &[Routine]) -> Result<(), DaybellError> {
        self.put_json(ROUTINES_KEY, routines).await
    }

    /// Routines active on `date`, by name.
    pub async fn list_routines(&self, date: NaiveDate) -> Vec<Routine> {
        let mut routines: Vec<Routine> = self
            .load_routines()
            .await
            .into_iter()
            .filter(|r| r.is_active_on(date))
            .collect();
        routines.sort_by(|a, b| a.name.cmp(&b.name));
        routines
    }

    pub async fn create_routine(
        &self,
        name: &str,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
        task_texts: &[String],
        notification_time: Option<ReminderTime>,
        today: NaiveDate,
    ) -> Result<Routine, DaybellError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DaybellError::InvalidInput("routine name is empty".into()));
        }
        if end_date.is_some_and(|end| end < start_date) {
            return Err(DaybellError::InvalidInput(
                "routine ends before it starts".into(),
            ));
        }
        let texts: Vec<String> = task_texts
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if texts.is_empty() {
            return Err(DaybellError::InvalidInput(
                "routine needs at least one task".into(),
            ));
        }

        let routine = Routine::new(name, start_date, end_date, &texts, notification_time, today);
        let mut routines = self.read_routines().await?;
        routines.push(routine.clone());
        self.save_routines(&routines).await?;
        Ok(routine)
    }

    /// Flip one checklist item of a routine for `date`. `task_ref` is either
    /// an id prefix or the 1-based position of the item.
    pub async fn toggle_routine_task_completion(
        &self,
        routine_prefix: &str,
        task_ref: &str,
        date: NaiveDate,
    ) -> Result<Routine, DaybellError> {
        let mut routines = self.read_routines().await?;
        let idx = resolve_prefix(
            routines.iter().map(|r| r.id.as_str()),
            routine_prefix,
            "routine",
        )?;
        let routine = &mut routines[idx];
        if !routine.is_active_on(date) {
            return Err(DaybellError::InvalidInput(format!(
                "routine '{}' is not active on {date}",
                routine.name
            )));
        }

        let task_idx = match task_ref.trim().parse::<usize>() {
            Ok(n) if (1..=routine.tasks.len()).contains(&n) => n - 1,
            _ => resolve_prefix(
                routine.tasks.iter().map(|t| t.id.as_str()),
                task_ref,
                "routine task",
            )?,
        };
        let task_id = routine.tasks[task_idx].id.clone();
        routine.toggle_task(&task_id, date);

        let updated = routine.clone();
        self.save_routines(&routines).await?;
        Ok(updated)
    }

    pub async fn delete_routine(&self, id_prefix: &str) -> Result<Routine, DaybellError> {
        let mut routines = self.read_routines().await?;
        let idx = resolve_prefix(routines.iter().map(|r| r.id.as_str()), id_prefix, "routine")?;
        let removed = routines.remove(idx);
        self.save_routines(&routines).await?;
        Ok(removed)
    }
}
