//! Evaluator - which notifications apply to a task right now
//!
//! Pure and deterministic given `(task, now)`:
//!
//! | Kind              | Applies when (task Active)                     |
//! |-------------------|------------------------------------------------|
//! | Reminder          | `now <= reminder_time <= now + lookahead`      |
//! | Overdue           | `deadline < now`                               |
//! | StalledUnfinished | `now - created_at > threshold`                 |
//!
//! The reminder window is closed on both ends. The stalled comparison is
//! strict: a task created exactly `threshold` ago is not yet stalled.
//! Completed tasks never match.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::domain::{NotificationKind, Task, TaskQuery, TaskStatus, TimeBound, TimeField};
use crate::scheduler::SchedulerConfig;

/// Classifies tasks against the three time-based conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluator {
    reminder_lookahead: Duration,
    stalled_threshold: Duration,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(Duration::hours(1), Duration::hours(24))
    }
}

impl Evaluator {
    pub fn new(reminder_lookahead: Duration, stalled_threshold: Duration) -> Self {
        Self {
            reminder_lookahead,
            stalled_threshold,
        }
    }

    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self::new(config.reminder_lookahead(), config.stalled_threshold())
    }

    /// Check a single condition
    pub fn applies(&self, kind: NotificationKind, task: &Task, now: DateTime<Utc>) -> bool {
        if task.status != TaskStatus::Active {
            return false;
        }

        match kind {
            NotificationKind::Reminder => now <= task.reminder_time && task.reminder_time <= now + self.reminder_lookahead,
            NotificationKind::Overdue => task.deadline < now,
            NotificationKind::StalledUnfinished => now - task.created_at > self.stalled_threshold,
        }
    }

    /// Every condition that currently applies, in [`NotificationKind::ALL`] order
    pub fn evaluate(&self, task: &Task, now: DateTime<Utc>) -> Vec<NotificationKind> {
        let kinds: Vec<_> = NotificationKind::ALL
            .into_iter()
            .filter(|kind| self.applies(*kind, task, now))
            .collect();
        debug!(task_id = %task.id, ?kinds, "Evaluator::evaluate: classified");
        kinds
    }

    /// Repository pre-filter for one condition
    ///
    /// Narrows the scan to Active tasks whose relevant field could qualify.
    /// Callers still confirm each candidate with [`Evaluator::applies`].
    pub fn candidate_query(&self, kind: NotificationKind, now: DateTime<Utc>) -> TaskQuery {
        match kind {
            NotificationKind::Reminder => TaskQuery::new(TaskStatus::Active, TimeField::ReminderTime)
                .from(TimeBound::inclusive(now))
                .until(TimeBound::inclusive(now + self.reminder_lookahead)),
            NotificationKind::Overdue => {
                TaskQuery::new(TaskStatus::Active, TimeField::Deadline).until(TimeBound::exclusive(now))
            }
            NotificationKind::StalledUnfinished => TaskQuery::new(TaskStatus::Active, TimeField::CreatedAt)
                .until(TimeBound::exclusive(now - self.stalled_threshold)),
        }
    }
}
