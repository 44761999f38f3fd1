//! Configuration types for weather-collector

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Weather provider access and client-side rate limiting
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct WeatherConfig {
    /// OpenWeather API key, sent as the `appid` query parameter
    #[serde(default)]
    pub api_key: String,

    /// Endpoint for current weather by city id
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Maximum requests per rate limit period (default: 60)
    #[serde(default = "default_rate_limit_max")]
    pub rate_limit_max: u32,

    /// Rate limit window (default: 65 seconds)
    #[serde(default = "default_rate_limit_period", with = "duration_serde")]
    pub rate_limit_period: Duration,

    /// Per-request timeout (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            rate_limit_max: default_rate_limit_max(),
            rate_limit_period: default_rate_limit_period(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Task execution settings
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskConfig {
    /// Maximum number of whole-batch attempts per task (default: 3)
    #[serde(default = "default_retry_total")]
    pub retry_total: u32,

    /// Capacity of the event broadcast channel (default: 1000)
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// How long shutdown waits for running tasks (default: 30 seconds)
    #[serde(default = "default_shutdown_timeout", with = "duration_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            retry_total: default_retry_total(),
            event_capacity: default_event_capacity(),
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PersistenceConfig {
    /// SQLite database path (default: "./sql_app.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:8000)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

/// Main configuration for weather-collector
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Provider access and rate limiting
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Task execution
    #[serde(default)]
    pub task: TaskConfig,

    /// Storage
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// HTTP server
    #[serde(default)]
    pub server: ApiConfig,

    /// File with the city ids to collect (default: "data/cities.txt")
    #[serde(default = "default_cities_path")]
    pub cities_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            weather: WeatherConfig::default(),
            task: TaskConfig::default(),
            persistence: PersistenceConfig::default(),
            server: ApiConfig::default(),
            cities_path: default_cities_path(),
        }
    }
}

impl Config {
    /// Build a configuration from the process environment
    ///
    /// Loads a `.env` file when present, then applies `WEATHER_API_KEY`,
    /// `DATABASE_URL`, `RATE_LIMIT_MAX`, `RATE_LIMIT_PERIOD`, `RETRY_TOTAL`,
    /// `CITIES_PATH` and `BIND_ADDRESS` over the defaults.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(key) = lookup("WEATHER_API_KEY") {
            config.weather.api_key = key;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            config.persistence.database_path = sqlite_path_from_url(&url);
        }
        if let Some(max) = lookup("RATE_LIMIT_MAX") {
            config.weather.rate_limit_max = parse_var("RATE_LIMIT_MAX", &max)?;
        }
        if let Some(period) = lookup("RATE_LIMIT_PERIOD") {
            config.weather.rate_limit_period =
                Duration::from_secs(parse_var("RATE_LIMIT_PERIOD", &period)?);
        }
        if let Some(total) = lookup("RETRY_TOTAL") {
            config.task.retry_total = parse_var("RETRY_TOTAL", &total)?;
        }
        if let Some(path) = lookup("CITIES_PATH") {
            config.cities_path = PathBuf::from(path);
        }
        if let Some(addr) = lookup("BIND_ADDRESS") {
            config.server.bind_address = parse_var("BIND_ADDRESS", &addr)?;
        }

        Ok(config)
    }

    /// Check settings that would make the collector unusable
    pub fn validate(&self) -> Result<()> {
        if self.weather.rate_limit_max == 0 {
            return Err(Error::Config {
                message: "rate limit must allow at least one request per period".into(),
                key: Some("rate_limit_max".into()),
            });
        }
        if self.weather.rate_limit_period.is_zero() {
            return Err(Error::Config {
                message: "rate limit period must be greater than zero".into(),
                key: Some("rate_limit_period".into()),
            });
        }
        if self.weather.base_url.trim().is_empty() {
            return Err(Error::Config {
                message: "weather base URL is empty".into(),
                key: Some("base_url".into()),
            });
        }
        if let Err(e) = url::Url::parse(&self.weather.base_url) {
            return Err(Error::Config {
                message: format!("invalid weather base URL: {e}"),
                key: Some("base_url".into()),
            });
        }
        if self.weather.api_key.is_empty() {
            tracing::warn!("WEATHER_API_KEY is not set, provider requests will be rejected");
        }
        Ok(())
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| Error::Config {
        message: format!("invalid value {value:?} for {key}: {e}"),
        key: Some(key.to_string()),
    })
}

/// Turn a SQLAlchemy-style SQLite URL into a filesystem path
///
/// `sqlite:///./app.db` is relative, `sqlite:////var/app.db` is absolute.
/// Plain paths are returned unchanged.
fn sqlite_path_from_url(url: &str) -> PathBuf {
    let path = url
        .strip_prefix("sqlite:///")
        .or_else(|| url.strip_prefix("sqlite://"))
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);
    PathBuf::from(path)
}

fn default_base_url() -> String {
    "https://api.openweathermap.org/data/2.5/weather".to_string()
}

fn default_rate_limit_max() -> u32 {
    60
}

fn default_rate_limit_period() -> Duration {
    Duration::from_secs(65)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_retry_total() -> u32 {
    3
}

fn default_event_capacity() -> usize {
    1000
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./sql_app.db")
}

fn default_cities_path() -> PathBuf {
    PathBuf::from("data/cities.txt")
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
