//! Domain types for TaskNotify
//!
//! Task and User records live in the `taskstore` crate and are re-exported
//! here; the notification kind is owned by the core.

mod kind;

pub use kind::NotificationKind;

// Re-export taskstore types for convenience
pub use taskstore::{Priority, Task, TaskQuery, TaskStatus, TimeBound, TimeField, User};
