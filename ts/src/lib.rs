//! TaskStore - task and user records backed by SQLite
//!
//! Holds the records the notification daemon reads: tasks with a deadline,
//! an earlier reminder time and an Active/Completed status, plus the users
//! that own them.
//!
//! # Modules
//!
//! - [`task`] - Task record, status and priority
//! - [`user`] - User record (notification destination)
//! - [`query`] - Status + time-range predicates
//! - [`store`] - SQLite persistence

pub mod error;
pub mod query;
pub mod store;
pub mod task;
pub mod user;

pub use error::{StoreError, StoreResult, TaskValidationError};
pub use query::{TaskQuery, TimeBound, TimeField};
pub use store::Store;
pub use task::{Priority, Task, TaskStatus};
pub use user::User;

use chrono::{DateTime, TimeZone, Utc};

/// Convert a timestamp to Unix milliseconds (storage representation)
pub fn to_ms(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

/// Convert Unix milliseconds back to a timestamp
pub fn from_ms(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

/// Generate a new record ID (UUID v7, time ordered)
pub fn generate_id() -> String {
    uuid::Uuid::now_v7().to_string()
}
