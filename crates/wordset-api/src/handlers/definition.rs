use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use wordset_core::{Definition, NewDefinition};

use crate::{auth::CurrentUser, state::ApiState, ApiError};

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub created: usize,
}

pub async fn list_definitions(
    State(state): State<ApiState>,
    Path(study_set_id): Path<i64>,
) -> Result<Json<Vec<Definition>>, ApiError> {
    Ok(Json(state.definitions.list(study_set_id).await?))
}

/// Add a batch of definitions. Either all of them are stored or none.
pub async fn create_definitions(
    State(state): State<ApiState>,
    CurrentUser(user_id): CurrentUser,
    Path(study_set_id): Path<i64>,
    Json(payload): Json<Vec<NewDefinition>>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let created = state
        .definitions
        .create(&user_id, study_set_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { created })))
}

pub async fn update_definition(
    State(state): State<ApiState>,
    CurrentUser(user_id): CurrentUser,
    Path((study_set_id, definition_id)): Path<(i64, i64)>,
    Json(payload): Json<NewDefinition>,
) -> Result<StatusCode, ApiError> {
    state
        .definitions
        .update(&user_id, study_set_id, definition_id, payload)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_definition(
    State(state): State<ApiState>,
    CurrentUser(user_id): CurrentUser,
    Path((study_set_id, definition_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    state
        .definitions
        .delete(&user_id, study_set_id, definition_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
