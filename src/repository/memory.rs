//! In-memory TaskRepository
//!
//! Holds tasks in a Vec and answers queries with [`TaskQuery::matches`].
//! Query failures and latency can be injected per time field.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{RepositoryError, TaskRepository};
use crate::domain::{Task, TaskQuery, TaskStatus, TimeField};

#[derive(Default)]
struct MemoryInner {
    tasks: Vec<Task>,
    emails: HashMap<String, String>,
    failing: HashSet<TimeField>,
    delay: Option<Duration>,
}

/// Mutable in-memory task set
#[derive(Default)]
pub struct InMemoryRepository {
    inner: Mutex<MemoryInner>,
    query_count: AtomicUsize,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user's email
    pub fn add_user(&self, user_id: impl Into<String>, email: impl Into<String>) {
        self.lock().emails.insert(user_id.into(), email.into());
    }

    /// Insert or replace a task (matched by ID)
    pub fn upsert(&self, task: Task) {
        let mut inner = self.lock();
        match inner.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => *existing = task,
            None => inner.tasks.push(task),
        }
    }

    /// Change a task's status; returns false if no such task
    pub fn set_status(&self, task_id: &str, status: TaskStatus) -> bool {
        let mut inner = self.lock();
        match inner.tasks.iter_mut().find(|t| t.id == task_id) {
            Some(task) => {
                task.status = status;
                true
            }
            None => false,
        }
    }

    /// Delete a task; returns false if no such task
    pub fn remove(&self, task_id: &str) -> bool {
        let mut inner = self.lock();
        let before = inner.tasks.len();
        inner.tasks.retain(|t| t.id != task_id);
        inner.tasks.len() != before
    }

    /// Make queries over `field` fail until cleared
    pub fn fail_queries_on(&self, field: TimeField) {
        self.lock().failing.insert(field);
    }

    /// Stop injecting query failures
    pub fn clear_failures(&self) {
        self.lock().failing.clear();
    }

    /// Delay every query by `delay`
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.lock().delay = delay;
    }

    /// Number of range queries answered or failed so far
    pub fn query_count(&self) -> usize {
        self.query_count.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        // A panicking writer leaves the Vec/HashMap structurally valid
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl TaskRepository for InMemoryRepository {
    async fn find_by_status_and_time_range(&self, query: &TaskQuery) -> Result<Vec<Task>, RepositoryError> {
        debug!(?query, "InMemoryRepository::find_by_status_and_time_range: called");
        self.query_count.fetch_add(1, Ordering::SeqCst);

        let delay = self.lock().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let inner = self.lock();
        if inner.failing.contains(&query.field) {
            debug!(field = %query.field, "InMemoryRepository::find_by_status_and_time_range: injected failure");
            return Err(RepositoryError::Unavailable(format!("query on {} failed", query.field)));
        }

        Ok(inner.tasks.iter().filter(|t| query.matches(t)).cloned().collect())
    }

    async fn resolve_owner_email(&self, task: &Task) -> Result<String, RepositoryError> {
        debug!(task_id = %task.id, "InMemoryRepository::resolve_owner_email: called");
        self.lock()
            .emails
            .get(&task.owner)
            .cloned()
            .ok_or_else(|| RepositoryError::OwnerNotFound {
                task_id: task.id.clone(),
            })
    }
}
