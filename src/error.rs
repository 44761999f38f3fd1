//! Error types for weather-collector
//!
//! This module provides the error handling for the library, including:
//! - Fetch and batch errors raised while talking to the weather provider,
//!   surfaced to callers through [`Error::RetryExhausted`]
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use crate::types::{CityId, TaskStatus, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for weather-collector operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for weather-collector
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "rate_limit_max")
        key: Option<String>,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Every batch attempt failed
    #[error("all {attempts} attempts failed, last error: {source}")]
    RetryExhausted {
        /// Number of attempts made
        attempts: u32,
        /// Error of the last attempt
        source: BatchError,
    },

    /// No attempt was made because retries are disabled
    #[error("service unavailable: no fetch attempt was made")]
    ServiceUnavailable,

    /// Persisting the aggregated batch failed
    #[error("persistence failed: {0}")]
    Persistence(#[source] Box<Error>),

    /// A task for this user already exists
    #[error("user_id {0} already exists")]
    Duplicate(UserId),

    /// Task or record not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Task cannot run from its current state
    #[error("task {user_id} cannot run in state {status}")]
    InvalidState {
        /// User the task belongs to
        user_id: UserId,
        /// The state that prevents the run
        status: TaskStatus,
    },

    /// Shutdown in progress - not accepting new tasks
    #[error("shutdown in progress: not accepting new tasks")]
    ShuttingDown,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Constraint violation (e.g., duplicate key)
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Failure fetching weather for a single city
#[derive(Debug, Error)]
pub enum FetchError {
    /// Provider answered with a non-success status
    #[error("provider returned HTTP {status} for city {city_id}")]
    Provider {
        /// City being fetched
        city_id: CityId,
        /// HTTP status code returned by the provider
        status: u16,
    },

    /// Provider answered 200 but the body is not a usable payload
    #[error("invalid payload for city {city_id}: {reason}")]
    Parse {
        /// City being fetched
        city_id: CityId,
        /// What was wrong with the payload
        reason: String,
    },

    /// Transport-level failure
    #[error("request for city {city_id} failed: {source}")]
    Network {
        /// City being fetched
        city_id: CityId,
        /// Underlying HTTP client error
        source: reqwest::Error,
    },
}

impl FetchError {
    /// City the failed fetch was for
    pub fn city_id(&self) -> CityId {
        match self {
            FetchError::Provider { city_id, .. }
            | FetchError::Parse { city_id, .. }
            | FetchError::Network { city_id, .. } => *city_id,
        }
    }
}

/// First failure of a batch attempt, with the progress reached before it
#[derive(Debug, Error)]
#[error("batch aborted after {completed}/{total} cities: {source}")]
pub struct BatchError {
    /// Cities fetched successfully before the failure
    pub completed: u64,
    /// Cities in the batch
    pub total: u64,
    /// The fetch failure that aborted the batch
    pub source: FetchError,
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "duplicate",
///     "message": "user_id 7 already exists",
///     "details": {
///       "user_id": 7
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "duplicate")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - the user already has a task
            Error::Duplicate(_) => 400,

            // 404 Not Found
            Error::NotFound(_) => 404,

            // 409 Conflict
            Error::InvalidState { .. } => 409,

            // 500 Internal Server Error - Server-side issues
            Error::Config { .. } => 500,
            Error::Database(_) => 500,
            Error::Sqlx(_) => 500,
            Error::Persistence(_) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,

            // 502 Bad Gateway - weather provider errors
            Error::RetryExhausted { .. } => 502,
            Error::Network(_) => 502,

            // 503 Service Unavailable
            Error::ServiceUnavailable => 503,
            Error::ShuttingDown => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Database(DatabaseError::ConstraintViolation(_)) => "constraint_violation",
            Error::Database(_) => "database_error",
            Error::Sqlx(_) => "database_error",
            Error::RetryExhausted { .. } => "retry_exhausted",
            Error::ServiceUnavailable => "service_unavailable",
            Error::Persistence(_) => "persistence_error",
            Error::Duplicate(_) => "duplicate",
            Error::NotFound(_) => "not_found",
            Error::InvalidState { .. } => "invalid_state",
            Error::ShuttingDown => "shutting_down",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        // Add contextual details for specific error types
        let details = match &error {
            Error::Duplicate(user_id) => Some(serde_json::json!({
                "user_id": user_id,
            })),
            Error::InvalidState { user_id, status } => Some(serde_json::json!({
                "user_id": user_id,
                "status": status,
            })),
            Error::RetryExhausted { attempts, source } => {
                let mut details = serde_json::json!({
                    "attempts": attempts,
                    "completed": source.completed,
                    "total": source.total,
                    "city_id": source.source.city_id(),
                });
                if let FetchError::Provider { status, .. } = &source.source {
                    details["provider_status"] = serde_json::json!(status);
                }
                Some(details)
            }
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn provider_batch_error(status: u16) -> BatchError {
        BatchError {
            completed: 2,
            total: 5,
            source: FetchError::Provider {
                city_id: 524901,
                status,
            },
        }
    }

    /// Returns (Error, expected_status_code, expected_error_code) for every
    /// reachable match arm in ToHttpStatus.
    fn all_error_variants() -> Vec<(Error, u16, &'static str)> {
        vec![
            (
                Error::Config {
                    message: "bad value".into(),
                    key: Some("rate_limit_max".into()),
                },
                500,
                "config_error",
            ),
            (Error::Duplicate(UserId(7)), 400, "duplicate"),
            (Error::NotFound("task 99".into()), 404, "not_found"),
            (
                Error::InvalidState {
                    user_id: UserId(1),
                    status: TaskStatus::Finished,
                },
                409,
                "invalid_state",
            ),
            (
                Error::Database(DatabaseError::QueryFailed("timeout".into())),
                500,
                "database_error",
            ),
            (
                Error::Database(DatabaseError::ConstraintViolation("user_id".into())),
                500,
                "constraint_violation",
            ),
            (
                Error::Persistence(Box::new(Error::Database(DatabaseError::QueryFailed(
                    "disk full".into(),
                )))),
                500,
                "persistence_error",
            ),
            (
                Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone")),
                500,
                "io_error",
            ),
            (
                Error::ApiServerError("bind failed".into()),
                500,
                "api_server_error",
            ),
            (
                Error::RetryExhausted {
                    attempts: 3,
                    source: provider_batch_error(401),
                },
                502,
                "retry_exhausted",
            ),
            (Error::ServiceUnavailable, 503, "service_unavailable"),
            (Error::ShuttingDown, 503, "shutting_down"),
        ]
    }

    #[test]
    fn every_variant_maps_to_expected_status_code() {
        for (error, expected_status, expected_code) in all_error_variants() {
            let actual_status = error.status_code();
            assert_eq!(
                actual_status, expected_status,
                "Error variant with error_code={expected_code} returned status {actual_status}, expected {expected_status}"
            );
        }
    }

    #[test]
    fn every_variant_maps_to_expected_error_code() {
        for (error, expected_status, expected_code) in all_error_variants() {
            let actual_code = error.error_code();
            assert_eq!(
                actual_code, expected_code,
                "Error variant with expected status={expected_status} returned error_code={actual_code}, expected {expected_code}"
            );
        }
    }

    #[test]
    fn duplicate_is_400_bad_request() {
        assert_eq!(Error::Duplicate(UserId(1)).status_code(), 400);
    }

    #[test]
    fn retries_disabled_is_503() {
        assert_eq!(Error::ServiceUnavailable.status_code(), 503);
    }

    #[test]
    fn fetch_error_reports_its_city() {
        let parse = FetchError::Parse {
            city_id: 42,
            reason: "bad json".into(),
        };
        let provider = FetchError::Provider {
            city_id: 43,
            status: 404,
        };

        assert_eq!(parse.city_id(), 42);
        assert_eq!(provider.city_id(), 43);
    }

    #[test]
    fn batch_error_message_includes_progress_and_cause() {
        let err = provider_batch_error(401);
        let msg = err.to_string();

        assert!(msg.contains("2/5"), "message was: {msg}");
        assert!(msg.contains("HTTP 401"), "message was: {msg}");
        assert!(msg.contains("524901"), "message was: {msg}");
    }

    #[test]
    fn retry_exhausted_exposes_last_batch_error_as_source() {
        let err = Error::RetryExhausted {
            attempts: 3,
            source: provider_batch_error(401),
        };

        let source = std::error::Error::source(&err).expect("should have a source");
        assert!(source.to_string().contains("HTTP 401"));
    }

    #[test]
    fn persistence_wraps_the_store_error() {
        let err = Error::Persistence(Box::new(Error::Database(DatabaseError::QueryFailed(
            "locked".into(),
        ))));

        assert!(err.to_string().contains("locked"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn api_error_from_duplicate_has_user_id() {
        let api: ApiError = Error::Duplicate(UserId(7)).into();

        assert_eq!(api.error.code, "duplicate");
        let details = api.error.details.expect("should have details");
        assert_eq!(details["user_id"], 7);
    }

    #[test]
    fn api_error_from_invalid_state_has_user_and_status() {
        let api: ApiError = Error::InvalidState {
            user_id: UserId(3),
            status: TaskStatus::Running,
        }
        .into();

        assert_eq!(api.error.code, "invalid_state");
        let details = api.error.details.expect("should have details");
        assert_eq!(details["user_id"], 3);
        assert_eq!(details["status"], "Running");
    }

    #[test]
    fn api_error_from_retry_exhausted_has_attempts_and_progress() {
        let api: ApiError = Error::RetryExhausted {
            attempts: 3,
            source: provider_batch_error(401),
        }
        .into();

        assert_eq!(api.error.code, "retry_exhausted");
        let details = api.error.details.expect("should have details");
        assert_eq!(details["attempts"], 3);
        assert_eq!(details["completed"], 2);
        assert_eq!(details["total"], 5);
        assert_eq!(details["city_id"], 524901);
    }

    #[test]
    fn api_error_from_provider_failure_has_provider_status() {
        let api: ApiError = Error::RetryExhausted {
            attempts: 1,
            source: provider_batch_error(429),
        }
        .into();

        let details = api.error.details.expect("should have details");
        assert_eq!(details["provider_status"], 429);
    }

    #[test]
    fn api_error_from_parse_failure_has_no_provider_status() {
        let api: ApiError = Error::RetryExhausted {
            attempts: 1,
            source: BatchError {
                completed: 0,
                total: 1,
                source: FetchError::Parse {
                    city_id: 9,
                    reason: "missing field `main`".into(),
                },
            },
        }
        .into();

        let details = api.error.details.expect("should have details");
        assert_eq!(details["city_id"], 9);
        assert!(details.get("provider_status").is_none());
    }

    #[test]
    fn context_free_variants_have_no_details() {
        let variants = vec![
            Error::ShuttingDown,
            Error::ServiceUnavailable,
            Error::NotFound("task 1".into()),
            Error::Database(DatabaseError::ConnectionFailed("refused".into())),
        ];

        for err in variants {
            let code = err.error_code().to_string();
            let api: ApiError = err.into();
            assert!(
                api.error.details.is_none(),
                "error with code={code} should not have structured details"
            );
        }
    }

    #[test]
    fn api_error_without_details_omits_details_in_json() {
        let api: ApiError = Error::ShuttingDown.into();

        let json_str = serde_json::to_string(&api).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json_str).unwrap();

        assert_eq!(parsed["error"]["code"], "shutting_down");
        assert_eq!(
            parsed["error"]["message"],
            "shutdown in progress: not accepting new tasks"
        );
        assert!(
            parsed["error"].get("details").is_none(),
            "details field should be omitted from JSON when None"
        );
    }

    #[test]
    fn api_error_message_matches_error_display() {
        let err = Error::InvalidState {
            user_id: UserId(5),
            status: TaskStatus::Error,
        };
        let display_msg = err.to_string();
        let api: ApiError = err.into();

        assert_eq!(api.error.message, display_msg);
    }
}
