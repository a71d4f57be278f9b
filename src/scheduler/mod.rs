//! Scheduler module for periodic task evaluation
//!
//! The NotificationScheduler wakes on a fixed interval, queries the task
//! repository once per notification kind, confirms candidates with the
//! evaluator, and sends each qualifying (task, kind) email at most once.

mod clock;
mod config;
mod core;
mod error;
mod ledger;
mod report;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SchedulerConfig;
pub use core::{NotificationScheduler, SchedulerHandle};
pub use error::SchedulerError;
pub use ledger::{LedgerEntry, NotificationLedger, NotificationRecord};
pub use report::{KindReport, TickReport};
