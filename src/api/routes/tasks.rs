//! Weather task handlers.

use super::{TASK_STARTED_MESSAGE, TaskAccepted, UserRequest};
use crate::api::AppState;
use crate::error::Error;
use crate::types::UserId;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// POST / - Start collecting weather for a user
#[utoipa::path(
    post,
    path = "/",
    tag = "tasks",
    request_body = UserRequest,
    responses(
        (status = 202, description = "Task scheduled", body = TaskAccepted),
        (status = 400, description = "A task or stored result already exists for this user_id", body = crate::error::ApiError),
        (status = 503, description = "Collector is shutting down", body = crate::error::ApiError)
    )
)]
pub async fn submit_task(
    State(state): State<AppState>,
    Json(request): Json<UserRequest>,
) -> Response {
    match state.collector.submit(request.user_id).await {
        Ok(_) => (
            StatusCode::ACCEPTED,
            Json(TaskAccepted {
                message: TASK_STARTED_MESSAGE.to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::debug!(user_id = %request.user_id, error = %e, "task rejected");
            e.into_response()
        }
    }
}

/// GET /{user_id} - Get task progress
#[utoipa::path(
    get,
    path = "/{user_id}",
    tag = "tasks",
    params(
        ("user_id" = i64, Path, description = "User id the task was submitted with")
    ),
    responses(
        (status = 200, description = "Task status and progress", body = crate::types::TaskInfo),
        (status = 404, description = "No task for this user_id", body = crate::error::ApiError)
    )
)]
pub async fn get_task(State(state): State<AppState>, Path(user_id): Path<i64>) -> Response {
    let user_id = UserId(user_id);
    match state.collector.task_info(user_id).await {
        Some(info) => (StatusCode::OK, Json(info)).into_response(),
        None => Error::NotFound(format!("task for user_id {user_id}")).into_response(),
    }
}

/// GET /tasks - List every registered task
#[utoipa::path(
    get,
    path = "/tasks",
    tag = "tasks",
    responses(
        (status = 200, description = "All tasks, sorted by user id", body = Vec<crate::types::TaskInfo>)
    )
)]
pub async fn list_tasks(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.collector.list_tasks().await)
}
