use axum::{
    Json,
    extract::{Path, State, rejection::PathRejection},
};
use std::sync::Arc;

use super::validation::validate_id;
use super::{ApiError, ApiResponse, AppState, TagDto};

/// GET /tags/
pub async fn list_tags(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<TagDto>>>, ApiError> {
    let tags = state.store().list_tags().await?;
    Ok(Json(ApiResponse::success(tags)))
}

/// GET /tags/{id}/
pub async fn get_tag(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<ApiResponse<TagDto>>, ApiError> {
    let Path(id) = path?;
    let id = validate_id(id, "Tag")?;
    let tag = state
        .store()
        .get_tag(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Tag", id))?;

    Ok(Json(ApiResponse::success(tag)))
}
