//! Task record
//!
//! A task carries a deadline and an earlier reminder time. Status is either
//! Active or Completed; priority and category are descriptive only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TaskValidationError;
use crate::generate_id;

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TaskStatus {
    #[default]
    Active,
    Completed,
}

impl TaskStatus {
    /// The opposite status (used by toggle)
    pub fn toggled(self) -> Self {
        match self {
            Self::Active => Self::Completed,
            Self::Completed => Self::Active,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::Completed => write!(f, "Completed"),
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("Unknown task status: {}", s)),
        }
    }
}

/// Priority tag for a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

/// A tracked task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// Free-form description
    #[serde(default)]
    pub description: String,

    /// When the task is due
    pub deadline: DateTime<Utc>,

    /// When the owner wants to be reminded (strictly before deadline)
    pub reminder_time: DateTime<Utc>,

    /// Current status
    #[serde(default)]
    pub status: TaskStatus,

    /// Priority tag
    #[serde(default)]
    pub priority: Priority,

    /// Category tag
    #[serde(default)]
    pub category: String,

    /// Creation timestamp, immutable after creation
    pub created_at: DateTime<Utc>,

    /// Owning user ID
    pub owner: String,
}

impl Task {
    /// Create a new Active task with a generated ID, created now
    pub fn new(
        owner: impl Into<String>,
        title: impl Into<String>,
        deadline: DateTime<Utc>,
        reminder_time: DateTime<Utc>,
    ) -> Self {
        Self::with_id(generate_id(), owner, title, deadline, reminder_time, Utc::now())
    }

    /// Create a task with a specific ID and creation time (for testing or import)
    pub fn with_id(
        id: impl Into<String>,
        owner: impl Into<String>,
        title: impl Into<String>,
        deadline: DateTime<Utc>,
        reminder_time: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            deadline,
            reminder_time,
            status: TaskStatus::Active,
            priority: Priority::Medium,
            category: String::new(),
            created_at,
            owner: owner.into(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set the status
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Check the record invariants enforced on create and update
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::EmptyTitle);
        }
        if self.owner.trim().is_empty() {
            return Err(TaskValidationError::MissingOwner);
        }
        if self.reminder_time >= self.deadline {
            return Err(TaskValidationError::ReminderNotBeforeDeadline);
        }
        Ok(())
    }

    /// Flip Active <-> Completed
    pub fn toggle_status(&mut self) {
        self.status = self.status.toggled();
    }

    /// Check if the task is still open
    pub fn is_active(&self) -> bool {
        self.status == TaskStatus::Active
    }
}
