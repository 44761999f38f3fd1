//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`tasks`] — Weather task intake and progress
//! - [`config`] — Configuration
//! - [`system`] — Health, events, OpenAPI

use serde::{Deserialize, Serialize};

use crate::types::UserId;

mod config;
mod system;
mod tasks;

// Re-export all handlers so `routes::function_name` continues to work
pub use config::*;
pub use system::*;
pub use tasks::*;

// ============================================================================
// Query/Request Types (shared across handlers)
// ============================================================================

/// Request body for POST /
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct UserRequest {
    /// Caller-chosen id of the weather collection
    pub user_id: UserId,
}

/// Response body for POST /
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct TaskAccepted {
    /// Human-readable confirmation
    pub message: String,
}

/// Message returned when a task was scheduled
pub const TASK_STARTED_MESSAGE: &str = "Background task started successfully.";
