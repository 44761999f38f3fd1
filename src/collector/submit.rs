//! Task admission and background spawning.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use crate::error::{Error, Result};
use crate::types::{Event, TaskStatus, UserId};

use super::WeatherCollector;
use super::task::WeatherTask;

impl WeatherCollector {
    /// Start collecting weather for `user_id` in the background
    ///
    /// Returns as soon as the task is registered; the batch runs on the tokio
    /// runtime and is observed through [`WeatherCollector::task_info`] or
    /// [`WeatherCollector::subscribe`].
    ///
    /// # Errors
    ///
    /// - [`Error::ShuttingDown`] once [`WeatherCollector::shutdown`] started
    /// - [`Error::Duplicate`] if the user has a live or finished task, or a
    ///   stored result. A task that ended in `Error` is replaced.
    pub async fn submit(&self, user_id: UserId) -> Result<Arc<WeatherTask>> {
        if !self.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        if let Some(existing) = self.registry.get(user_id).await {
            if existing.status() != TaskStatus::Error {
                return Err(Error::Duplicate(user_id));
            }
            if self.registry.remove_failed(user_id).await {
                tracing::info!(user_id = %user_id, "replacing failed task");
            }
        }

        if self.store.user_request_exists(user_id).await? {
            return Err(Error::Duplicate(user_id));
        }

        let task = Arc::new(WeatherTask::new(
            user_id,
            Arc::clone(&self.cities),
            self.config.task.retry_total,
            Arc::clone(&self.provider),
            self.event_tx.clone(),
        ));
        let task = self.registry.insert_new(task).await?;

        tracing::info!(
            user_id = %user_id,
            cities = self.cities.len(),
            "weather task created"
        );
        self.emit_event(Event::TaskCreated {
            user_id,
            cities: self.cities.len(),
        });

        let store = Arc::clone(&self.store);
        let runner = Arc::clone(&task);
        self.tracker.spawn(async move {
            if let Err(e) = runner.run(store.as_ref()).await {
                tracing::debug!(user_id = %user_id, error = %e, "weather task ended with error");
            }
        });

        Ok(task)
    }
}
