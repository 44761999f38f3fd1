//! Weather task: one user's batch fetch, its retry loop and its progress.
//!
//! Split into:
//! - [`batch`] — concurrent fan-out over the city list for one attempt
//! - `orchestration` — the status state machine and the single persistence call

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use tokio::sync::broadcast;

use crate::types::{CityId, Event, TaskInfo, TaskStatus, UserId};

use super::client::WeatherProvider;

pub mod batch;
mod orchestration;


/// Completed/total counters of the current attempt
///
/// Writers are the fetch futures of one attempt; any number of pollers may
/// read concurrently without locking.
#[derive(Debug, Default)]
pub struct BatchProgress {
    completed: AtomicU64,
    total: AtomicU64,
}

impl BatchProgress {
    /// Start a new attempt over `total` cities
    pub fn reset(&self, total: u64) {
        self.completed.store(0, Ordering::SeqCst);
        self.total.store(total, Ordering::SeqCst);
    }

    /// Record one more completed city, returning the new count
    pub(crate) fn increment(&self) -> u64 {
        self.completed.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Cities completed in the current attempt
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    /// Cities in the current attempt
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }

    /// `round(completed / total * 100, 2)`, or 0 before any attempt started
    pub fn percent(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let completed = self.completed().min(total);
        let percent = completed as f64 / total as f64 * 100.0;
        (percent * 100.0).round() / 100.0
    }
}

/// Background task collecting weather for every city on behalf of one user
///
/// Created in [`TaskStatus::Created`]; [`WeatherTask::run`] drives it to
/// `Finished` or `Error`. Pollers hold an `Arc` and read status and progress
/// at any time.
pub struct WeatherTask {
    user_id: UserId,
    cities: Arc<[CityId]>,
    retry_total: u32,
    status: AtomicU8,
    progress: BatchProgress,
    provider: Arc<dyn WeatherProvider>,
    event_tx: broadcast::Sender<Event>,
}

impl WeatherTask {
    /// Create a task in the `Created` state
    pub fn new(
        user_id: UserId,
        cities: Arc<[CityId]>,
        retry_total: u32,
        provider: Arc<dyn WeatherProvider>,
        event_tx: broadcast::Sender<Event>,
    ) -> Self {
        Self {
            user_id,
            cities,
            retry_total,
            status: AtomicU8::new(TaskStatus::Created.to_u8()),
            progress: BatchProgress::default(),
            provider,
            event_tx,
        }
    }

    /// User this task belongs to
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Maximum number of batch attempts
    pub fn retry_total(&self) -> u32 {
        self.retry_total
    }

    /// Cities this task fetches
    pub fn cities(&self) -> &[CityId] {
        &self.cities
    }

    /// Current status
    pub fn status(&self) -> TaskStatus {
        TaskStatus::from_u8(self.status.load(Ordering::SeqCst))
    }

    /// Progress of the current attempt in percent, rounded to two decimals
    pub fn progress(&self) -> f64 {
        self.progress.percent()
    }

    /// Snapshot for API responses
    pub fn info(&self) -> TaskInfo {
        TaskInfo::new(self.user_id, self.status(), self.progress())
    }

    /// Move from `Created` to `Running`; fails if the task already started
    fn begin(&self) -> Result<(), TaskStatus> {
        self.status
            .compare_exchange(
                TaskStatus::Created.to_u8(),
                TaskStatus::Running.to_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .map(|_| ())
            .map_err(TaskStatus::from_u8)
    }

    fn set_status(&self, status: TaskStatus) {
        self.status.store(status.to_u8(), Ordering::SeqCst);
    }

    fn emit(&self, event: Event) {
        // No subscribers is fine
        self.event_tx.send(event).ok();
    }
}

impl std::fmt::Debug for WeatherTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherTask")
            .field("user_id", &self.user_id)
            .field("status", &self.status())
            .field("cities", &self.cities.len())
            .field("retry_total", &self.retry_total)
            .field("progress", &self.progress())
            .finish()
    }
}
