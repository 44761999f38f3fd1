//! Database layer for weather-collector
//!
//! Handles SQLite persistence of aggregated weather results, one row per user.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] — Database lifecycle, schema migrations
//! - [`user_requests`] — Aggregated result storage and lookup

use crate::Result;
use crate::types::{UserId, WeatherRecord};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, sqlite::SqlitePool};

mod migrations;
mod user_requests;

/// Aggregated batch result to be inserted into the database
#[derive(Debug, Clone)]
pub struct NewUserRequest {
    /// User the result belongs to (primary key)
    pub user_id: UserId,
    /// When the task started running
    pub request_time: DateTime<Utc>,
    /// Weather records in completion order
    pub data: Vec<WeatherRecord>,
}

/// User request record from database (raw from SQLite)
#[derive(Debug, Clone, FromRow)]
pub struct UserRequestRow {
    /// User id
    pub user_id: i64,
    /// RFC 3339 timestamp
    pub request_time: String,
    /// JSON array of weather records
    pub data: String,
}

/// Destination for aggregated weather results
///
/// Implemented by [`Database`]; tests substitute in-memory stores.
#[async_trait::async_trait]
pub trait WeatherStore: Send + Sync {
    /// Store one aggregated result. Called at most once per task.
    async fn persist(&self, request: &NewUserRequest) -> Result<()>;

    /// Whether a result for `user_id` was already stored
    async fn user_request_exists(&self, user_id: UserId) -> Result<bool>;
}

/// Database handle for weather-collector
pub struct Database {
    pool: SqlitePool,
}

#[async_trait::async_trait]
impl WeatherStore for Database {
    async fn persist(&self, request: &NewUserRequest) -> Result<()> {
        self.insert_user_request(request).await
    }

    async fn user_request_exists(&self, user_id: UserId) -> Result<bool> {
        self.has_user_request(user_id).await
    }
}
