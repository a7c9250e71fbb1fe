use axum::{
    Extension, Json,
    extract::{Path, RawQuery, State, rejection::{JsonRejection, PathRejection}},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::auth::require_user;
use super::validation::validate_id;
use super::{ApiError, ApiResponse, AppState, RecipeDto, RecipeShortDto};
use crate::constants::shopping_list::CONTENT_TYPE;
use crate::models::{RecipeCollection, RecipeFilter, RecipeInput, Viewer};

/// GET /recipes/
pub async fn list_recipes(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    RawQuery(query): RawQuery,
) -> Result<Json<ApiResponse<Vec<RecipeDto>>>, ApiError> {
    let filter = RecipeFilter::from_query(query.as_deref().unwrap_or_default())?;
    let recipes = state.recipe_service().list(&viewer, &filter).await?;

    Ok(Json(ApiResponse::success(
        recipes.into_iter().map(RecipeDto::from).collect(),
    )))
}

/// GET /recipes/{id}/
pub async fn get_recipe(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<ApiResponse<RecipeDto>>, ApiError> {
    let Path(id) = path?;
    let id = validate_id(id, "Recipe")?;
    let recipe = state.recipe_service().get(&viewer, id).await?;

    Ok(Json(ApiResponse::success(recipe.into())))
}

/// POST /recipes/
pub async fn create_recipe(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    payload: Result<Json<RecipeInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_user(&viewer)?;
    let Json(input) = payload?;

    let recipe = state.recipe_service().create(user, input).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(RecipeDto::from(recipe))),
    ))
}

/// PATCH /recipes/{id}/
pub async fn update_recipe(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<RecipeInput>, JsonRejection>,
) -> Result<Json<ApiResponse<RecipeDto>>, ApiError> {
    let Path(id) = path?;
    let user = require_user(&viewer)?;
    let id = validate_id(id, "Recipe")?;
    let Json(input) = payload?;

    let recipe = state.recipe_service().update(user, id, input).await?;

    Ok(Json(ApiResponse::success(recipe.into())))
}

/// DELETE /recipes/{id}/
pub async fn delete_recipe(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = path?;
    let user = require_user(&viewer)?;
    let id = validate_id(id, "Recipe")?;

    state.recipe_service().delete(user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_to(
    state: &AppState,
    viewer: &Viewer,
    collection: RecipeCollection,
    id: i32,
) -> Result<Response, ApiError> {
    let user = require_user(viewer)?;
    let id = validate_id(id, "Recipe")?;

    let summary = state
        .recipe_service()
        .add_to_collection(user, collection, id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(RecipeShortDto::from(summary))),
    )
        .into_response())
}

async fn remove_from(
    state: &AppState,
    viewer: &Viewer,
    collection: RecipeCollection,
    id: i32,
) -> Result<StatusCode, ApiError> {
    let user = require_user(viewer)?;
    let id = validate_id(id, "Recipe")?;

    state
        .recipe_service()
        .remove_from_collection(user, collection, id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /recipes/{id}/favorite/
pub async fn add_favorite(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = path?;
    add_to(&state, &viewer, RecipeCollection::Favorites, id).await
}

/// DELETE /recipes/{id}/favorite/
pub async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = path?;
    remove_from(&state, &viewer, RecipeCollection::Favorites, id).await
}

/// POST /recipes/{id}/shopping_cart/
pub async fn add_to_cart(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = path?;
    add_to(&state, &viewer, RecipeCollection::ShoppingCart, id).await
}

/// DELETE /recipes/{id}/shopping_cart/
pub async fn remove_from_cart(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = path?;
    remove_from(&state, &viewer, RecipeCollection::ShoppingCart, id).await
}

/// GET /recipes/download_shopping_cart/
/// Plain-text attachment; an empty cart yields an empty file
pub async fn download_shopping_cart(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Response, ApiError> {
    let user = require_user(&viewer)?;
    let body = state.recipe_service().shopping_list(user).await?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        state.config().recipes.shopping_list_filename
    );
    let disposition = HeaderValue::from_str(&disposition)
        .map_err(|e| ApiError::internal(format!("Invalid download filename: {e}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
