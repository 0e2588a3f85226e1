use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use wordset_core::{FailureReason, Task, TaskState};

use crate::{auth::CurrentUser, state::ApiState, ApiError};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillResponse {
    pub task_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: i64,
    pub state: TaskState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReason>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            state: task.state,
            failure: task.failure,
        }
    }
}

/// Start filling a study set with generated definitions.
///
/// Answers as soon as the task is recorded; poll `GET /tasks/:task_id` for the outcome.
pub async fn fill_study_set(
    State(state): State<ApiState>,
    CurrentUser(user_id): CurrentUser,
    Path(study_set_id): Path<i64>,
) -> Result<(StatusCode, Json<FillResponse>), ApiError> {
    let task_id = state.runner.fill(&user_id, study_set_id).await?;
    Ok((StatusCode::ACCEPTED, Json(FillResponse { task_id })))
}

/// Get task status
pub async fn get_task(
    State(state): State<ApiState>,
    Path(task_id): Path<i64>,
) -> Result<Json<TaskResponse>, ApiError> {
    let task = state.tasks.get(task_id).await?;
    Ok(Json(task.into()))
}
