use axum::{
    Json,
    extract::{Path, Query, State, rejection::PathRejection},
};
use std::sync::Arc;

use super::validation::validate_id;
use super::{ApiError, ApiResponse, AppState, IngredientDto, IngredientQuery};

/// GET /ingredients/?name=<prefix>
pub async fn list_ingredients(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IngredientQuery>,
) -> Result<Json<ApiResponse<Vec<IngredientDto>>>, ApiError> {
    let ingredients = state
        .store()
        .list_ingredients(query.name.as_deref())
        .await?;

    Ok(Json(ApiResponse::success(ingredients)))
}

/// GET /ingredients/{id}/
pub async fn get_ingredient(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<ApiResponse<IngredientDto>>, ApiError> {
    let Path(id) = path?;
    let id = validate_id(id, "Ingredient")?;
    let ingredient = state
        .store()
        .get_ingredient(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Ingredient", id))?;

    Ok(Json(ApiResponse::success(ingredient)))
}
