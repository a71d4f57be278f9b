//! TaskRepository over the SQLite task store

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use taskstore::{Store, StoreError};
use tracing::debug;

use super::{RepositoryError, TaskRepository};
use crate::domain::{Task, TaskQuery};

/// Runs store queries on the blocking pool
#[derive(Clone)]
pub struct StoreRepository {
    store: Arc<Mutex<Store>>,
}

impl StoreRepository {
    /// Take ownership of an open store
    pub fn new(store: Store) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    async fn with_store<T, F>(&self, op: F) -> Result<T, RepositoryError>
    where
        T: Send + 'static,
        F: FnOnce(&Store) -> Result<T, RepositoryError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || {
            let guard = store
                .lock()
                .map_err(|_| RepositoryError::Unavailable("store lock poisoned".to_string()))?;
            op(&guard)
        })
        .await?
    }
}

#[async_trait]
impl TaskRepository for StoreRepository {
    async fn find_by_status_and_time_range(&self, query: &TaskQuery) -> Result<Vec<Task>, RepositoryError> {
        debug!(?query, "StoreRepository::find_by_status_and_time_range: called");
        let query = query.clone();
        self.with_store(move |store| Ok(store.find_tasks(&query)?)).await
    }

    async fn resolve_owner_email(&self, task: &Task) -> Result<String, RepositoryError> {
        debug!(task_id = %task.id, "StoreRepository::resolve_owner_email: called");
        let task = task.clone();
        self.with_store(move |store| match store.owner_email(&task) {
            Ok(email) => Ok(email),
            Err(StoreError::NotFound(_)) => Err(RepositoryError::OwnerNotFound { task_id: task.id }),
            Err(e) => Err(e.into()),
        })
        .await
    }
}
