use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use wordset_core::{NewStudySet, StudySet, UpdateStudySet};

use crate::{auth::CurrentUser, state::ApiState, ApiError};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub owner: Option<String>,
}

/// List study sets, optionally only those of one owner
pub async fn list_study_sets(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<StudySet>>, ApiError> {
    let sets = match query.owner {
        Some(owner) => state.study_sets.list_owned_by(&owner).await?,
        None => state.study_sets.list().await?,
    };
    Ok(Json(sets))
}

pub async fn create_study_set(
    State(state): State<ApiState>,
    CurrentUser(user_id): CurrentUser,
    Json(payload): Json<NewStudySet>,
) -> Result<(StatusCode, Json<StudySet>), ApiError> {
    let set = state.study_sets.create(&user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(set)))
}

pub async fn get_study_set(
    State(state): State<ApiState>,
    Path(study_set_id): Path<i64>,
) -> Result<Json<StudySet>, ApiError> {
    Ok(Json(state.study_sets.get(study_set_id).await?))
}

pub async fn update_study_set(
    State(state): State<ApiState>,
    CurrentUser(user_id): CurrentUser,
    Path(study_set_id): Path<i64>,
    Json(payload): Json<UpdateStudySet>,
) -> Result<StatusCode, ApiError> {
    state
        .study_sets
        .update(&user_id, study_set_id, payload)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_study_set(
    State(state): State<ApiState>,
    CurrentUser(user_id): CurrentUser,
    Path(study_set_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.study_sets.delete(&user_id, study_set_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
