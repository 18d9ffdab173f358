use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::time::{is_date_in_range, ReminderTime};

/// A recurring checklist that is active every day between `start_date` and
/// the optional `end_date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routine {
    pub id: String,
    pub name: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub notification_time: Option<ReminderTime>,
    #[serde(default)]
    pub tasks: Vec<RoutineTask>,
    pub created_date: NaiveDate,
}

/// One checklist item of a routine, with per-day completion marks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineTask {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub daily_completions: BTreeMap<NaiveDate, bool>,
}

/// Completion counts for one routine on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutineProgress {
    pub completed: usize,
    pub total: usize,
}

impl RoutineProgress {
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.completed)
    }

    pub fn is_complete(&self) -> bool {
        self.completed >= self.total
    }
}

impl RoutineTask {
    pub fn is_done_on(&self, date: NaiveDate) -> bool {
        self.daily_completions.get(&date).copied().unwrap_or(false)
    }
}

impl Routine {
    pub fn new(
        name: &str,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
        task_texts: &[String],
        notification_time: Option<ReminderTime>,
        today: NaiveDate,
    ) -> Self {
        let tasks = task_texts
            .iter()
            .map(|text| RoutineTask {
                id: Uuid::new_v4().to_string(),
                text: text.clone(),
                daily_completions: BTreeMap::new(),
            })
            .collect();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            start_date,
            end_date,
            notification_time,
            tasks,
            created_date: today,
        }
    }

    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        is_date_in_range(date, self.start_date, self.end_date)
    }

    pub fn progress(&self, date: NaiveDate) -> RoutineProgress {
        RoutineProgress {
            completed: self.tasks.iter().filter(|t| t.is_done_on(date)).count(),
            total: self.tasks.len(),
        }
    }

    /// Flip one task's mark for `date`. Returns `false` when `task_id` is unknown.
    pub fn toggle_task(&mut self, task_id: &str, date: NaiveDate) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == task_id) {
            Some(task) => {
                let done = task.is_done_on(date);
                task.daily_completions.insert(date, !done);
                true
            }
            None => false,
        }
    }

    /// Consecutive fully-completed days, counting back from `today`.
    pub fn streak(&self, today: NaiveDate) -> u32 {
        if self.tasks.is_empty() {
            return 0;
        }
        let mut streak = 0;
        let mut day = today;
        while day >= self.start_date && self.progress(day).is_complete() {
            streak += 1;
            match day.pred_opt() {
                Some(prev) => day = prev,
                None => break,
            }
        }
        streak
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, d).unwrap()
    }

    fn morning() -> Routine {
        let texts: Vec<String> = ["Stretch", "Water", "Journal"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        Routine::new("Morning", day(10), None, &texts, None, day(10))
    }

    #[test]
    fn test_progress_counts_only_that_day() {
        let mut routine = morning();
        let first = routine.tasks[0].id.clone();
        assert!(routine.toggle_task(&first, day(11)));
        assert_eq!(routine.progress(day(11)).completed, 1);
        assert_eq!(routine.progress(day(11)).remaining(), 2);
        assert_eq!(routine.progress(day(12)).completed, 0);
    }

    #[test]
    fn test_toggle_unknown_task() {
        let mut routine = morning();
        assert!(!routine.toggle_task("nope", day(11)));
    }

    #[test]
    fn test_toggle_twice_unmarks() {
        let mut routine = morning();
        let first = routine.tasks[0].id.clone();
        routine.toggle_task(&first, day(11));
        routine.toggle_task(&first, day(11));
        assert_eq!(routine.progress(day(11)).completed, 0);
    }

    #[test]
    fn test_active_range() {
        let mut routine = morning();
        routine.end_date = Some(day(12));
        assert!(!routine.is_active_on(day(9)));
        assert!(routine.is_active_on(day(12)));
        assert!(!routine.is_active_on(day(13)));
    }

    #[test]
    fn test_streak() {
        let mut routine = morning();
        let ids: Vec<String> = routine.tasks.iter().map(|t| t.id.clone()).collect();
        for d in [11, 12, 13] {
            for id in &ids {
                routine.toggle_task(id, day(d));
            }
        }
        assert_eq!(routine.streak(day(13)), 3);
        // Today not done yet breaks the streak.
        assert_eq!(routine.streak(day(14)), 0);
        assert_eq!(routine.streak(day(12)), 2);
    }

    #[test]
    fn test_streak_stops_at_start_date() {
        let mut routine = morning();
        let ids: Vec<String> = routine.tasks.iter().map(|t| t.id.clone()).collect();
        for d in [9, 10] {
            for id in &ids {
                routine.toggle_task(id, day(d));
            }
        }
        assert_eq!(routine.streak(day(10)), 1);
    }

    #[test]
    fn test_empty_routine_is_complete_but_has_no_streak() {
        let routine = Routine::new("Empty", day(10), None, &[], None, day(10));
        assert!(routine.progress(day(10)).is_complete());
        assert_eq!(routine.streak(day(10)), 0);
    }

    #[test]
    fn test_completions_serialize_with_date_keys() {
        let mut routine = morning();
        let first = routine.tasks[0].id.clone();
        routine.toggle_task(&first, day(11));
        let json = serde_json::to_string(&routine).unwrap();
        assert!(json.contains("\"2026-06-11\":true"));
        let back: Routine = serde_json::from_str(&json).unwrap();
        assert_eq!(back, routine);
    }
}
