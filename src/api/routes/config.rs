//! Configuration handlers.

use crate::api::AppState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

/// Placeholder written over secrets in API responses
pub const REDACTED: &str = "***REDACTED***";

/// GET /config - Get current config (sensitive fields redacted)
#[utoipa::path(
    get,
    path = "/config",
    tag = "config",
    responses(
        (status = 200, description = "Current configuration", body = crate::config::Config)
    )
)]
pub async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    let config = state.collector.get_config();

    let mut redacted_config = (*config).clone();

    // Redact provider API key
    if !redacted_config.weather.api_key.is_empty() {
        redacted_config.weather.api_key = REDACTED.to_string();
    }

    (StatusCode::OK, Json(redacted_config))
}
