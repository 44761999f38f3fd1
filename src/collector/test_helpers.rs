//! Shared test doubles for the provider and the store.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use crate::collector::WeatherCollector;
use crate::collector::client::WeatherProvider;
use crate::config::Config;
use crate::db::{NewUserRequest, WeatherStore};
use crate::error::{DatabaseError, Error, FetchError, Result};
use crate::rate_limiter::RateLimiter;
use crate::types::{CityId, UserId, WeatherRecord};

/// Scripted provider: succeeds by default, with per-city failures and delays
#[derive(Default)]
pub(crate) struct MockWeatherProvider {
    /// city -> (remaining failures, status to fail with)
    failures: Mutex<HashMap<CityId, (u32, u16)>>,
    /// city -> artificial latency
    delays: HashMap<CityId, Duration>,
    /// Latency applied to every city without its own delay
    default_delay: Option<Duration>,
    /// Cities answered with an unparseable payload
    malformed: HashSet<CityId>,
    /// Every call, in call order
    calls: Mutex<Vec<CityId>>,
    /// Permit taken before each answer, like the real client
    limiter: Option<RateLimiter>,
}

impl MockWeatherProvider {
    /// Every fetch succeeds
    pub(crate) fn succeeding() -> Self {
        Self::default()
    }

    /// `city_id` fails with `status` on its first `times` fetches
    pub(crate) fn fail_city(self, city_id: CityId, times: u32, status: u16) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(city_id, (times, status));
        self
    }

    /// Every city fails with `status` forever
    pub(crate) fn failing(cities: &[CityId], status: u16) -> Self {
        let provider = Self::default();
        {
            let mut failures = provider.failures.lock().unwrap();
            for &city in cities {
                failures.insert(city, (u32::MAX, status));
            }
        }
        provider
    }

    /// `city_id` answers with a payload that cannot be parsed
    pub(crate) fn malformed_city(mut self, city_id: CityId) -> Self {
        self.malformed.insert(city_id);
        self
    }

    /// Delay the answer for `city_id`
    pub(crate) fn delay_city(mut self, city_id: CityId, delay: Duration) -> Self {
        self.delays.insert(city_id, delay);
        self
    }

    /// Delay every answer
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.default_delay = Some(delay);
        self
    }

    /// Take a permit from `limiter` before every answer
    pub(crate) fn with_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Total number of fetch calls
    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Number of fetch calls for one city
    pub(crate) fn calls_for(&self, city_id: CityId) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|&&c| c == city_id)
            .count()
    }

    /// Deterministic record for a city
    pub(crate) fn record_for(city_id: CityId) -> WeatherRecord {
        WeatherRecord {
            city_id,
            temperature: city_id as f64 / 10.0,
            humidity: 50.0,
        }
    }
}

#[async_trait::async_trait]
impl WeatherProvider for MockWeatherProvider {
    async fn fetch(&self, city_id: CityId) -> std::result::Result<WeatherRecord, FetchError> {
        if let Some(limiter) = &self.limiter {
            limiter.acquire().await;
        }
        self.calls.lock().unwrap().push(city_id);

        let delay = self.delays.get(&city_id).copied().or(self.default_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = {
            let mut failures = self.failures.lock().unwrap();
            match failures.get_mut(&city_id) {
                Some((remaining, status)) if *remaining > 0 => {
                    if *remaining != u32::MAX {
                        *remaining -= 1;
                    }
                    Some(*status)
                }
                _ => None,
            }
        };
        if let Some(status) = failure {
            return Err(FetchError::Provider { city_id, status });
        }

        if self.malformed.contains(&city_id) {
            return Err(FetchError::Parse {
                city_id,
                reason: "missing field `main`".into(),
            });
        }

        Ok(Self::record_for(city_id))
    }
}

/// In-memory store recording every persist call
#[derive(Default)]
pub(crate) struct RecordingStore {
    persisted: Mutex<Vec<NewUserRequest>>,
    existing: Mutex<HashSet<UserId>>,
    fail_persist: Option<String>,
}

impl RecordingStore {
    /// Store that accepts everything
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Store whose persist always fails with `message`
    pub(crate) fn failing(message: &str) -> Self {
        Self {
            fail_persist: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Pretend a result for `user_id` was stored earlier
    pub(crate) fn with_existing(self, user_id: UserId) -> Self {
        self.existing.lock().unwrap().insert(user_id);
        self
    }

    /// Number of persist calls that reached the store
    pub(crate) fn persist_count(&self) -> usize {
        self.persisted.lock().unwrap().len()
    }

    /// Copy of everything persisted so far
    pub(crate) fn persisted(&self) -> Vec<NewUserRequest> {
        self.persisted.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl WeatherStore for RecordingStore {
    async fn persist(&self, request: &NewUserRequest) -> Result<()> {
        if let Some(message) = &self.fail_persist {
            self.persisted.lock().unwrap().push(request.clone());
            return Err(Error::Database(DatabaseError::QueryFailed(message.clone())));
        }
        self.existing.lock().unwrap().insert(request.user_id);
        self.persisted.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn user_request_exists(&self, user_id: UserId) -> Result<bool> {
        Ok(self.existing.lock().unwrap().contains(&user_id))
    }
}

/// Build a collector over test doubles
pub(crate) fn test_collector(
    cities: Vec<CityId>,
    provider: Arc<MockWeatherProvider>,
    store: Arc<RecordingStore>,
) -> WeatherCollector {
    let config = Config::default();
    WeatherCollector::with_parts(config, store, provider, cities)
}
