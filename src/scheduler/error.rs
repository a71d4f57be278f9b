//! Scheduler error types

use thiserror::Error;

use crate::domain::NotificationKind;
use crate::notifier::NotifyError;
use crate::repository::RepositoryError;

/// Errors raised while configuring or running the scheduler
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Candidate query for one condition failed; the other conditions still run
    #[error("Repository query failed for {kind} condition: {source}")]
    RepositoryQueryFailed {
        kind: NotificationKind,
        #[source]
        source: RepositoryError,
    },

    /// Could not resolve where to send a notification
    #[error("Owner lookup failed for task {task_id}: {source}")]
    OwnerLookupFailed {
        task_id: String,
        #[source]
        source: RepositoryError,
    },

    /// Notification send failed; the task stays eligible for the next tick
    #[error("Sending {kind} notification for task {task_id} failed: {source}")]
    SendFailed {
        task_id: String,
        kind: NotificationKind,
        #[source]
        source: NotifyError,
    },

    /// Startup configuration is unusable; the loop never starts
    #[error("Invalid configuration for {parameter}: {reason}")]
    ConfigInvalid { parameter: String, reason: String },
}

impl SchedulerError {
    pub(crate) fn config_invalid(parameter: &str, reason: &str) -> Self {
        Self::ConfigInvalid {
            parameter: parameter.to_string(),
            reason: reason.to_string(),
        }
    }
}
