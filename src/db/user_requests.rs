//! Aggregated result storage.

use crate::error::DatabaseError;
use crate::types::{StoredUserRequest, UserId, WeatherRecord};
use crate::{Error, Result};
use chrono::{DateTime, Utc};

use super::{Database, NewUserRequest, UserRequestRow};

impl Database {
    /// Insert the aggregated result of one task
    ///
    /// Fails with [`DatabaseError::ConstraintViolation`] if a row for the
    /// user already exists.
    pub async fn insert_user_request(&self, request: &NewUserRequest) -> Result<()> {
        let data = serde_json::to_string(&request.data)?;

        sqlx::query(
            r#"
            INSERT INTO user_request (user_id, request_time, data)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(request.user_id)
        .bind(request.request_time.to_rfc3339())
        .bind(data)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                Error::Database(DatabaseError::ConstraintViolation(format!(
                    "user_request for user {} already exists",
                    request.user_id
                )))
            }
            other => Error::Sqlx(other),
        })?;

        tracing::debug!(
            user_id = %request.user_id,
            records = request.data.len(),
            "stored user request"
        );
        Ok(())
    }

    /// Check whether a result for the user was stored
    pub async fn has_user_request(&self, user_id: UserId) -> Result<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM user_request WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(Error::Sqlx)?;

        Ok(found.is_some())
    }

    /// Get the stored result for a user
    pub async fn get_user_request(&self, user_id: UserId) -> Result<Option<StoredUserRequest>> {
        let row = sqlx::query_as::<_, UserRequestRow>(
            "SELECT user_id, request_time, data FROM user_request WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Sqlx)?;

        row.map(StoredUserRequest::try_from).transpose()
    }

    /// Number of stored results
    pub async fn count_user_requests(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_request")
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Sqlx)?;

        Ok(count)
    }
}

impl TryFrom<UserRequestRow> for StoredUserRequest {
    type Error = Error;

    fn try_from(row: UserRequestRow) -> Result<Self> {
        let request_time = DateTime::parse_from_rfc3339(&row.request_time)
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "invalid request_time {:?} for user {}: {}",
                    row.request_time, row.user_id, e
                )))
            })?
            .with_timezone(&Utc);
        let data: Vec<WeatherRecord> = serde_json::from_str(&row.data)?;

        Ok(Self {
            user_id: UserId(row.user_id),
            request_time,
            data,
        })
    }
}
