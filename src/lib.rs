//! TaskNotify - deadline, overdue and stalled-task email notifications
//!
//! A background scheduler that periodically scans the task store, decides
//! which time-based conditions each open task meets, and emails the task's
//! owner once per condition.
//!
//! # Modules
//!
//! - [`evaluator`] - Pure classification of a task against "now"
//! - [`scheduler`] - Tick loop, dedup ledger, clock, configuration
//! - [`notifier`] - Email templates and transports
//! - [`repository`] - Read-only seam over the task store
//! - [`config`] - Configuration types and loading
//! - [`daemon`] - PID file and process control
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod daemon;
pub mod domain;
pub mod evaluator;
pub mod notifier;
pub mod repository;
pub mod scheduler;

// Re-export commonly used types
pub use config::{Config, EmailConfig, StorageConfig};
pub use domain::{NotificationKind, Priority, Task, TaskQuery, TaskStatus, TimeBound, TimeField, User};
pub use evaluator::Evaluator;
pub use notifier::{
    EmailMessage, EmailTransport, LogTransport, Notifier, NotifyError, SmtpTransport, TemplateSet, TransportError,
    build_transport,
};
pub use repository::{InMemoryRepository, RepositoryError, StoreRepository, TaskRepository};
pub use scheduler::{
    Clock, KindReport, ManualClock, NotificationLedger, NotificationRecord, NotificationScheduler, SchedulerConfig,
    SchedulerError, SchedulerHandle, SystemClock, TickReport,
};
