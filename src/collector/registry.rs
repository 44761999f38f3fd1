//! Registry of weather tasks keyed by user id.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::types::{TaskStatus, UserId};

use super::task::WeatherTask;

/// Concurrent map of user id to task
///
/// Entries are never evicted automatically; callers decide when to call
/// [`TaskRegistry::remove`] or [`TaskRegistry::evict_finished`].
#[derive(Clone, Default)]
pub struct TaskRegistry {
    tasks: Arc<RwLock<HashMap<UserId, Arc<WeatherTask>>>>,
}

impl TaskRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task; fails with [`Error::Duplicate`] if the user already has one
    pub async fn insert_new(&self, task: Arc<WeatherTask>) -> Result<Arc<WeatherTask>> {
        let mut tasks = self.tasks.write().await;
        let user_id = task.user_id();
        if tasks.contains_key(&user_id) {
            return Err(Error::Duplicate(user_id));
        }
        tasks.insert(user_id, Arc::clone(&task));
        Ok(task)
    }

    /// Look up the task of a user
    pub async fn get(&self, user_id: UserId) -> Option<Arc<WeatherTask>> {
        self.tasks.read().await.get(&user_id).cloned()
    }

    /// Number of registered tasks
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// Whether no task is registered
    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }

    /// Registered user ids, sorted
    pub async fn ids(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.tasks.read().await.keys().copied().collect();
        ids.sort();
        ids
    }

    /// All registered tasks, sorted by user id
    pub async fn tasks(&self) -> Vec<Arc<WeatherTask>> {
        let mut tasks: Vec<Arc<WeatherTask>> = self.tasks.read().await.values().cloned().collect();
        tasks.sort_by_key(|t| t.user_id());
        tasks
    }

    /// Remove the task of a user
    pub async fn remove(&self, user_id: UserId) -> Option<Arc<WeatherTask>> {
        self.tasks.write().await.remove(&user_id)
    }

    /// Remove the task of a user only if it ended in [`TaskStatus::Error`]
    pub async fn remove_failed(&self, user_id: UserId) -> bool {
        let mut tasks = self.tasks.write().await;
        match tasks.get(&user_id) {
            Some(task) if task.status() == TaskStatus::Error => {
                tasks.remove(&user_id);
                true
            }
            _ => false,
        }
    }

    /// Remove every task in a terminal state, returning how many were removed
    pub async fn evict_finished(&self) -> usize {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|_, task| !task.status().is_terminal());
        let evicted = before - tasks.len();
        if evicted > 0 {
            tracing::debug!(evicted, remaining = tasks.len(), "evicted finished tasks");
        }
        evicted
    }
}
