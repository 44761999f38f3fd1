//! Task orchestration: status transitions, whole-batch retries, single persistence.

use chrono::Utc;

use crate::db::{NewUserRequest, WeatherStore};
use crate::error::{BatchError, Error, Result};
use crate::types::{Event, TaskStatus, WeatherRecord};

use super::WeatherTask;
use super::batch::{AttemptEvents, fetch_all};

impl WeatherTask {
    /// Run the task to completion
    ///
    /// Phases:
    /// 1. `Created -> Running`, capture the request time
    /// 2. Up to `retry_total` whole-batch attempts, no backoff in between
    /// 3. Persist the first successful batch exactly once
    /// 4. `Finished` on success, `Error` on exhausted attempts or a failed write
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] if the task was already started
    /// - [`Error::RetryExhausted`] carrying the last attempt's error
    /// - [`Error::ServiceUnavailable`] if `retry_total` is 0
    /// - [`Error::Persistence`] if the store rejected the result
    pub async fn run(&self, store: &dyn WeatherStore) -> Result<()> {
        if let Err(status) = self.begin() {
            return Err(Error::InvalidState {
                user_id: self.user_id,
                status,
            });
        }

        let request_time = Utc::now();
        tracing::info!(
            user_id = %self.user_id,
            cities = self.cities.len(),
            retry_total = self.retry_total,
            "weather task started"
        );

        let data = match self.fetch_with_retries().await {
            Ok(data) => data,
            Err(e) => {
                self.set_status(TaskStatus::Error);
                tracing::error!(user_id = %self.user_id, error = %e, "weather task failed");
                self.emit(Event::Failed {
                    user_id: self.user_id,
                    error: e.to_string(),
                });
                return Err(e);
            }
        };

        let records = data.len();
        let request = NewUserRequest {
            user_id: self.user_id,
            request_time,
            data,
        };

        if let Err(e) = store.persist(&request).await {
            self.set_status(TaskStatus::Error);
            tracing::error!(
                user_id = %self.user_id,
                error = %e,
                "failed to persist weather data"
            );
            self.emit(Event::Failed {
                user_id: self.user_id,
                error: e.to_string(),
            });
            return Err(Error::Persistence(Box::new(e)));
        }

        self.set_status(TaskStatus::Finished);
        tracing::info!(user_id = %self.user_id, records, "weather task finished");
        self.emit(Event::Finished {
            user_id: self.user_id,
            records,
        });
        Ok(())
    }

    /// Retry whole batches until one succeeds or attempts run out
    async fn fetch_with_retries(&self) -> Result<Vec<WeatherRecord>> {
        let mut last_error: Option<BatchError> = None;
        let mut attempt: u32 = 0;

        while attempt < self.retry_total {
            let events = AttemptEvents {
                user_id: self.user_id,
                attempt: attempt + 1,
                event_tx: &self.event_tx,
            };

            match fetch_all(self.provider.as_ref(), &self.cities, &self.progress, &events).await {
                Ok(data) => return Ok(data),
                Err(e) => {
                    attempt += 1;
                    tracing::warn!(
                        user_id = %self.user_id,
                        attempt,
                        retry_total = self.retry_total,
                        error = %e,
                        "batch attempt failed"
                    );
                    self.emit(Event::AttemptFailed {
                        user_id: self.user_id,
                        attempt,
                        error: e.to_string(),
                    });
                    last_error = Some(e);
                }
            }
        }

        Err(match last_error {
            Some(source) => Error::RetryExhausted {
                attempts: attempt,
                source,
            },
            None => Error::ServiceUnavailable,
        })
    }
}
