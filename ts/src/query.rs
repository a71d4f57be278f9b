//! Status + time-range predicates over tasks
//!
//! A [`TaskQuery`] selects tasks with a given status whose chosen time field
//! falls between two optional bounds. Each bound says whether it includes the
//! instant it names, so closed windows (`now <= t <= now + 1h`) and strict
//! comparisons (`t < now`) are both expressible.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::{Task, TaskStatus};

/// Which timestamp of a task a query ranges over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeField {
    ReminderTime,
    Deadline,
    CreatedAt,
}

impl TimeField {
    /// SQLite column holding this field
    pub fn column(&self) -> &'static str {
        match self {
            Self::ReminderTime => "reminder_time",
            Self::Deadline => "deadline",
            Self::CreatedAt => "created_at",
        }
    }

    /// Read this field from a task
    pub fn value_of(&self, task: &Task) -> DateTime<Utc> {
        match self {
            Self::ReminderTime => task.reminder_time,
            Self::Deadline => task.deadline,
            Self::CreatedAt => task.created_at,
        }
    }
}

impl std::fmt::Display for TimeField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.column())
    }
}

/// One end of a time range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBound {
    pub at: DateTime<Utc>,
    pub inclusive: bool,
}

impl TimeBound {
    pub fn inclusive(at: DateTime<Utc>) -> Self {
        Self { at, inclusive: true }
    }

    pub fn exclusive(at: DateTime<Utc>) -> Self {
        Self { at, inclusive: false }
    }
}

/// `findByStatusAndTimeRange(status, field, lower?, upper?)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskQuery {
    pub status: TaskStatus,
    pub field: TimeField,
    pub lower: Option<TimeBound>,
    pub upper: Option<TimeBound>,
}

impl TaskQuery {
    /// Open-ended query over `field` for tasks with `status`
    pub fn new(status: TaskStatus, field: TimeField) -> Self {
        Self {
            status,
            field,
            lower: None,
            upper: None,
        }
    }

    /// Set the lower bound
    pub fn from(mut self, bound: TimeBound) -> Self {
        self.lower = Some(bound);
        self
    }

    /// Set the upper bound
    pub fn until(mut self, bound: TimeBound) -> Self {
        self.upper = Some(bound);
        self
    }

    /// Evaluate the predicate against a task in memory
    pub fn matches(&self, task: &Task) -> bool {
        if task.status != self.status {
            return false;
        }

        let value = self.field.value_of(task);

        let above_lower = match self.lower {
            Some(TimeBound { at, inclusive: true }) => value >= at,
            Some(TimeBound { at, inclusive: false }) => value > at,
            None => true,
        };

        let below_upper = match self.upper {
            Some(TimeBound { at, inclusive: true }) => value <= at,
            Some(TimeBound { at, inclusive: false }) => value < at,
            None => true,
        };

        above_lower && below_upper
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 9, 0, 0).unwrap()
    }

    fn task_with_reminder(offset_secs: i64) -> Task {
        let reminder = now() + Duration::seconds(offset_secs);
        Task::with_id(
            "t",
            "u",
            "Title",
            reminder + Duration::hours(1),
            reminder,
            now() - Duration::hours(1),
        )
    }

    #[test]
    fn test_closed_window_includes_both_ends() {
        let query = TaskQuery::new(TaskStatus::Active, TimeField::ReminderTime)
            .from(TimeBound::inclusive(now()))
            .until(TimeBound::inclusive(now() + Duration::hours(1)));

        assert!(query.matches(&task_with_reminder(0)));
        assert!(query.matches(&task_with_reminder(3600)));
        assert!(!query.matches(&task_with_reminder(-1)));
        assert!(!query.matches(&task_with_reminder(3601)));
    }

    #[test]
    fn test_exclusive_upper_bound() {
        let query = TaskQuery::new(TaskStatus::Active, TimeField::ReminderTime).until(TimeBound::exclusive(now()));
        assert!(query.matches(&task_with_reminder(-1)));
        assert!(!query.matches(&task_with_reminder(0)));
    }

    #[test]
    fn test_status_must_match() {
        let query = TaskQuery::new(TaskStatus::Active, TimeField::Deadline);
        let done = task_with_reminder(0).with_status(TaskStatus::Completed);
        assert!(!query.matches(&done));
        assert!(query.matches(&task_with_reminder(0)));
    }

    #[test]
    fn test_time_field_columns() {
        assert_eq!(TimeField::ReminderTime.column(), "reminder_time");
        assert_eq!(TimeField::Deadline.column(), "deadline");
        assert_eq!(TimeField::CreatedAt.column(), "created_at");
    }

    proptest! {
        #[test]
        fn prop_unbounded_query_matches_any_active(offset in -1_000_000i64..1_000_000) {
            let query = TaskQuery::new(TaskStatus::Active, TimeField::ReminderTime);
            prop_assert!(query.matches(&task_with_reminder(offset)));
        }

        #[test]
        fn prop_exclusive_lower_is_strict(offset in -10_000i64..10_000) {
            let query = TaskQuery::new(TaskStatus::Active, TimeField::ReminderTime)
                .from(TimeBound::exclusive(now()));
            prop_assert_eq!(query.matches(&task_with_reminder(offset)), offset > 0);
        }
    }
}
