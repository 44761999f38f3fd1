//! One batch attempt: fetch every city concurrently and collect in completion order.

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::broadcast;

use crate::collector::client::WeatherProvider;
use crate::error::BatchError;
use crate::types::{CityId, Event, UserId, WeatherRecord};

use super::BatchProgress;

/// Where progress events of one attempt are reported
pub struct AttemptEvents<'a> {
    /// User the attempt runs for
    pub user_id: UserId,
    /// Attempt number (1-based)
    pub attempt: u32,
    /// Event channel
    pub event_tx: &'a broadcast::Sender<Event>,
}

impl AttemptEvents<'_> {
    fn progress(&self, completed: u64, total: u64, percent: f64) {
        self.event_tx
            .send(Event::Progress {
                user_id: self.user_id,
                attempt: self.attempt,
                completed,
                total,
                percent,
            })
            .ok();
    }
}

/// Fetch weather for every city in `cities`
///
/// All fetches are created before any result is awaited. Results are
/// collected in completion order and each success bumps `progress`. The
/// first failure aborts the attempt: outstanding fetches are dropped and
/// partial results discarded.
pub async fn fetch_all(
    provider: &dyn WeatherProvider,
    cities: &[CityId],
    progress: &BatchProgress,
    events: &AttemptEvents<'_>,
) -> Result<Vec<WeatherRecord>, BatchError> {
    let total = cities.len() as u64;
    progress.reset(total);

    if cities.is_empty() {
        return Ok(Vec::new());
    }

    let mut in_flight: FuturesUnordered<_> = cities
        .iter()
        .map(|&city_id| provider.fetch(city_id))
        .collect();
    let mut records = Vec::with_capacity(cities.len());

    while let Some(result) = in_flight.next().await {
        match result {
            Ok(record) => {
                records.push(record);
                let completed = progress.increment();
                tracing::debug!(
                    user_id = %events.user_id,
                    attempt = events.attempt,
                    completed,
                    total,
                    "city fetched"
                );
                events.progress(completed, total, progress.percent());
            }
            Err(source) => {
                let completed = progress.completed();
                tracing::warn!(
                    user_id = %events.user_id,
                    attempt = events.attempt,
                    city_id = source.city_id(),
                    completed,
                    total,
                    error = %source,
                    "city fetch failed, aborting attempt"
                );
                return Err(BatchError {
                    completed,
                    total,
                    source,
                });
            }
        }
    }

    Ok(records)
}
