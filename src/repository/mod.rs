//! Task repository seam
//!
//! The scheduler only reads tasks through [`TaskRepository`]: status plus
//! time-range queries, and owner email resolution. The SQLite store is the
//! production implementation; the in-memory one backs tests and demos.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Task, TaskQuery};

pub mod memory;
mod store;

pub use memory::InMemoryRepository;
pub use store::StoreRepository;

/// Errors from repository operations
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Store error: {0}")]
    Store(#[from] taskstore::StoreError),

    #[error("Owner not found for task {task_id}")]
    OwnerNotFound { task_id: String },

    #[error("Repository unavailable: {0}")]
    Unavailable(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Read-only view of the task store
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Tasks with the query status whose time field lies within its bounds
    async fn find_by_status_and_time_range(&self, query: &TaskQuery) -> Result<Vec<Task>, RepositoryError>;

    /// Email address of the user owning `task`
    async fn resolve_owner_email(&self, task: &Task) -> Result<String, RepositoryError>;
}
