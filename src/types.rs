//! Core types for weather-collector

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Provider-side identifier of a city (OpenWeather city id)
pub type CityId = i64;

/// Identifier of the user that requested a weather collection
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    /// Create a new UserId
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner i64 value
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<UserId> for i64 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

// Implement sqlx Type, Encode, and Decode for database operations
impl sqlx::Type<sqlx::Sqlite> for UserId {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <i64 as sqlx::Type<sqlx::Sqlite>>::type_info()
    }

    fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
        <i64 as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for UserId {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        sqlx::Encode::<sqlx::Sqlite>::encode_by_ref(&self.0, buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for UserId {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let id = <i64 as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        Ok(Self(id))
    }
}

/// Lifecycle status of a weather task
///
/// `Created -> Running -> {Finished | Error}`. `Finished` and `Error` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum TaskStatus {
    /// Constructed, `run()` not called yet
    Created,
    /// Fetch attempts or persistence in progress
    Running,
    /// Batch fetched and persisted
    Finished,
    /// All attempts failed, or persistence failed
    Error,
}

impl TaskStatus {
    /// Convert a raw status code to TaskStatus
    pub fn from_u8(status: u8) -> Self {
        match status {
            0 => TaskStatus::Created,
            1 => TaskStatus::Running,
            2 => TaskStatus::Finished,
            _ => TaskStatus::Error, // Unknown codes are treated as failures
        }
    }

    /// Convert TaskStatus to its raw status code
    pub fn to_u8(&self) -> u8 {
        match self {
            TaskStatus::Created => 0,
            TaskStatus::Running => 1,
            TaskStatus::Finished => 2,
            TaskStatus::Error => 3,
        }
    }

    /// Whether no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Finished | TaskStatus::Error)
    }

    /// Name used in API responses and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Created => "Created",
            TaskStatus::Running => "Running",
            TaskStatus::Finished => "Finished",
            TaskStatus::Error => "Error",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current weather for one city, as persisted
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WeatherRecord {
    /// OpenWeather city id
    pub city_id: CityId,
    /// Temperature in degrees Celsius
    pub temperature: f64,
    /// Relative humidity in percent
    pub humidity: f64,
}

/// Subset of the OpenWeather "current weather" response that we consume
#[derive(Clone, Debug, Deserialize)]
pub struct ProviderPayload {
    /// City id echoed back by the provider
    pub id: CityId,
    /// Main readings block
    pub main: MainReadings,
}

/// `main` block of the provider payload
#[derive(Clone, Debug, Deserialize)]
pub struct MainReadings {
    /// Temperature (Celsius when requested with `units=metric`)
    pub temp: f64,
    /// Relative humidity in percent
    pub humidity: f64,
}

impl From<ProviderPayload> for WeatherRecord {
    fn from(payload: ProviderPayload) -> Self {
        Self {
            city_id: payload.id,
            temperature: payload.main.temp,
            humidity: payload.main.humidity,
        }
    }
}

impl WeatherRecord {
    /// Build a record from a raw provider JSON document
    pub fn from_provider_json(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value::<ProviderPayload>(value).map(Self::from)
    }
}

/// Event emitted during the task lifecycle
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Task registered and scheduled
    TaskCreated {
        /// User the task belongs to
        user_id: UserId,
        /// Number of cities the task will fetch
        cities: usize,
    },

    /// One more city fetched in the current attempt
    Progress {
        /// User the task belongs to
        user_id: UserId,
        /// Attempt number (1-based)
        attempt: u32,
        /// Cities completed in this attempt
        completed: u64,
        /// Cities in the batch
        total: u64,
        /// Progress percentage (0.0 to 100.0)
        percent: f64,
    },

    /// A whole batch attempt failed and may be retried
    AttemptFailed {
        /// User the task belongs to
        user_id: UserId,
        /// Attempt number (1-based)
        attempt: u32,
        /// Error message
        error: String,
    },

    /// Batch fetched and persisted
    Finished {
        /// User the task belongs to
        user_id: UserId,
        /// Number of persisted records
        records: usize,
    },

    /// Task reached the Error state
    Failed {
        /// User the task belongs to
        user_id: UserId,
        /// Error message
        error: String,
    },

    /// Collector is shutting down
    Shutdown,
}

/// Snapshot of a task as seen by pollers
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskInfo {
    /// User the task belongs to
    pub user_id: UserId,
    /// Current status
    pub status: TaskStatus,
    /// Progress percentage rounded to two decimals
    pub progress: f64,
    /// Progress formatted as `"<percent> %"`
    #[serde(rename = "Progress")]
    pub progress_text: String,
}

impl TaskInfo {
    /// Create a snapshot from raw values
    pub fn new(user_id: UserId, status: TaskStatus, progress: f64) -> Self {
        Self {
            user_id,
            status,
            progress,
            progress_text: format!("{progress} %"),
        }
    }
}

/// Persisted user request, decoded from the database
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct StoredUserRequest {
    /// User the data belongs to
    pub user_id: UserId,
    /// When the task started running
    pub request_time: DateTime<Utc>,
    /// Weather records in arrival order
    pub data: Vec<WeatherRecord>,
}
