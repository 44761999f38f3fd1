//! Weather collection service split into focused submodules.
//!
//! The `WeatherCollector` struct and its methods are organized by domain:
//! - [`client`] - OpenWeather HTTP client behind the `WeatherProvider` seam
//! - [`task`] - One user's batch fetch with whole-batch retries
//! - [`registry`] - Per-user task bookkeeping
//! - `submit` - Admission and background spawning of tasks
//! - `lifecycle` - Graceful shutdown

pub mod client;
mod lifecycle;
pub mod registry;
mod submit;
pub mod task;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tokio::sync::broadcast;
use tokio_util::task::TaskTracker;

use crate::config::Config;
use crate::db::{Database, WeatherStore};
use crate::error::Result;
use crate::rate_limiter::RateLimiter;
use crate::types::{CityId, Event, TaskInfo, TaskStatus, UserId};

use client::{OpenWeatherClient, WeatherProvider};
use registry::TaskRegistry;
use task::WeatherTask;

/// Main collector instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct WeatherCollector {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Where finished batches are written
    pub(crate) store: Arc<dyn WeatherStore>,
    /// Source of weather readings, shared by every task
    pub(crate) provider: Arc<dyn WeatherProvider>,
    /// City list loaded at startup
    pub(crate) cities: Arc<[CityId]>,
    /// Tasks by user id
    pub(crate) registry: TaskRegistry,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Set to false during shutdown
    pub(crate) accepting_new: Arc<AtomicBool>,
    /// Spawned task runs
    pub(crate) tracker: TaskTracker,
}

impl WeatherCollector {
    /// Create a new WeatherCollector instance
    ///
    /// This initializes all core components:
    /// - Validates the configuration
    /// - Opens/creates the SQLite database and runs migrations
    /// - Builds the OpenWeather client with one shared rate limiter
    /// - Loads the city list
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let db = Database::new(&config.persistence.database_path).await?;

        let limiter = RateLimiter::new(
            config.weather.rate_limit_max,
            config.weather.rate_limit_period,
        );
        let client = OpenWeatherClient::with_limiter(&config.weather, limiter)?;

        let cities = crate::utils::load_cities(&config.cities_path).await?;

        tracing::info!(
            cities = cities.len(),
            rate_limit_max = config.weather.rate_limit_max,
            rate_limit_period_secs = config.weather.rate_limit_period.as_secs(),
            retry_total = config.task.retry_total,
            "Weather collector initialized"
        );

        Ok(Self::with_parts(
            config,
            Arc::new(db),
            Arc::new(client),
            cities,
        ))
    }

    /// Assemble a collector from already-built parts
    pub fn with_parts(
        config: Config,
        store: Arc<dyn WeatherStore>,
        provider: Arc<dyn WeatherProvider>,
        cities: Vec<CityId>,
    ) -> Self {
        let (event_tx, _rx) = broadcast::channel(config.task.event_capacity.max(1));

        Self {
            config: Arc::new(config),
            store,
            provider,
            cities: Arc::from(cities),
            registry: TaskRegistry::new(),
            event_tx,
            accepting_new: Arc::new(AtomicBool::new(true)),
            tracker: TaskTracker::new(),
        }
    }

    /// Subscribe to task events
    ///
    /// Each subscriber receives all events independently. A subscriber that
    /// falls behind by more than `task.event_capacity` events gets
    /// `RecvError::Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Cities every task fetches
    pub fn cities(&self) -> &[CityId] {
        &self.cities
    }

    /// Task registry
    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Task of a user, if one was submitted
    pub async fn task(&self, user_id: UserId) -> Option<Arc<WeatherTask>> {
        self.registry.get(user_id).await
    }

    /// Progress of a user's task in percent
    pub async fn progress(&self, user_id: UserId) -> Option<f64> {
        self.task(user_id).await.map(|t| t.progress())
    }

    /// Status of a user's task
    pub async fn status(&self, user_id: UserId) -> Option<TaskStatus> {
        self.task(user_id).await.map(|t| t.status())
    }

    /// Snapshot of a user's task
    pub async fn task_info(&self, user_id: UserId) -> Option<TaskInfo> {
        self.task(user_id).await.map(|t| t.info())
    }

    /// Snapshots of every registered task, sorted by user id
    pub async fn list_tasks(&self) -> Vec<TaskInfo> {
        self.registry
            .tasks()
            .await
            .iter()
            .map(|t| t.info())
            .collect()
    }

    /// Number of task runs still in flight
    pub fn active_tasks(&self) -> usize {
        self.tracker.len()
    }

    /// Emit an event to all subscribers
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}
