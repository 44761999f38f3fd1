//! Weather provider client
//!
//! [`WeatherProvider`] is the seam between the batch fetcher and the network;
//! [`OpenWeatherClient`] is the production implementation.

use reqwest::{Client, StatusCode};

use crate::config::WeatherConfig;
use crate::error::{Error, FetchError, Result};
use crate::rate_limiter::RateLimiter;
use crate::types::{CityId, ProviderPayload, WeatherRecord};

/// Source of current weather for a single city
#[async_trait::async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Fetch current weather for `city_id`
    async fn fetch(&self, city_id: CityId) -> std::result::Result<WeatherRecord, FetchError>;
}

/// OpenWeather "current weather" client
///
/// Every request takes one permit from the shared [`RateLimiter`] before it
/// is sent. Non-200 answers are reported, never retried here.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    http: Client,
    base_url: url::Url,
    api_key: String,
    limiter: RateLimiter,
}

impl OpenWeatherClient {
    /// Create a client with its own rate limiter built from `config`
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot be initialized.
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let limiter = RateLimiter::new(config.rate_limit_max, config.rate_limit_period);
        Self::with_limiter(config, limiter)
    }

    /// Create a client that shares an existing rate limiter
    pub fn with_limiter(config: &WeatherConfig, limiter: RateLimiter) -> Result<Self> {
        let base_url = url::Url::parse(&config.base_url).map_err(|e| Error::Config {
            message: format!("invalid weather base URL: {e}"),
            key: Some("base_url".into()),
        })?;

        let http = Client::builder().timeout(config.request_timeout).build()?;

        tracing::debug!(
            base_url = %base_url,
            max_rate = limiter.max_rate(),
            period_secs = limiter.time_period().as_secs(),
            "weather client initialized"
        );

        Ok(Self {
            http,
            base_url,
            api_key: config.api_key.clone(),
            limiter,
        })
    }

    /// The limiter this client draws permits from
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }
}

#[async_trait::async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn fetch(&self, city_id: CityId) -> std::result::Result<WeatherRecord, FetchError> {
        self.limiter.acquire().await;

        let id = city_id.to_string();
        let response = self
            .http
            .get(self.base_url.clone())
            .query(&[
                ("id", id.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(|source| FetchError::Network { city_id, source })?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::debug!(city_id, status = status.as_u16(), "provider rejected request");
            return Err(FetchError::Provider {
                city_id,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| FetchError::Network { city_id, source })?;

        let payload: ProviderPayload =
            serde_json::from_slice(&body).map_err(|e| FetchError::Parse {
                city_id,
                reason: e.to_string(),
            })?;

        Ok(WeatherRecord::from(payload))
    }
}
