//! Notification kinds

use serde::{Deserialize, Serialize};

/// The time-based conditions that trigger an email
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Reminder time falls within the lookahead window
    Reminder,
    /// Deadline has passed
    Overdue,
    /// Still open long after creation
    StalledUnfinished,
}

impl NotificationKind {
    /// All kinds, in evaluation order
    pub const ALL: [NotificationKind; 3] = [Self::Reminder, Self::Overdue, Self::StalledUnfinished];

    /// Short name used in logs, templates and the CLI
    pub fn name(&self) -> &'static str {
        match self {
            Self::Reminder => "reminder",
            Self::Overdue => "overdue",
            Self::StalledUnfinished => "stalled",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reminder" => Ok(Self::Reminder),
            "overdue" => Ok(Self::Overdue),
            "stalled" | "stalled_unfinished" => Ok(Self::StalledUnfinished),
            _ => Err(format!("Unknown notification kind: {}", s)),
        }
    }
}
