use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::{JsonRejection, PathRejection}},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use super::auth::require_user;
use super::validation::{parse_recipes_limit, validate_id};
use super::{
    ApiError, ApiResponse, AppState, CreatedUserDto, RecipesLimitQuery, SubscriptionDto, UserDto,
};
use crate::models::{RegistrationInput, SetPasswordInput, Viewer};

/// GET /users/
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, ApiError> {
    let users = state.user_service().list(&viewer).await?;
    Ok(Json(ApiResponse::success(users)))
}

/// POST /users/
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegistrationInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(input) = payload?;
    let user = state.user_service().register(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CreatedUserDto::from(user))),
    ))
}

/// GET /users/{id}/
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let Path(id) = path?;
    let id = validate_id(id, "User")?;
    let user = state.user_service().get(&viewer, id).await?;

    Ok(Json(ApiResponse::success(user)))
}

/// GET /users/me/
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = require_user(&viewer)?;
    let profile = state.user_service().get(&viewer, user.id).await?;

    Ok(Json(ApiResponse::success(profile)))
}

/// POST /users/set_password/
pub async fn set_password(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    payload: Result<Json<SetPasswordInput>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let user = require_user(&viewer)?;
    let Json(input) = payload?;

    state.user_service().set_password(user, input).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /users/{id}/subscribe/
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    path: Result<Path<i32>, PathRejection>,
    Query(query): Query<RecipesLimitQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = path?;
    let user = require_user(&viewer)?;
    let id = validate_id(id, "User")?;
    let limit = parse_recipes_limit(query.recipes_limit.as_deref())?;

    let subscription = state.user_service().subscribe(user, id, limit).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(SubscriptionDto::from(subscription))),
    ))
}

/// DELETE /users/{id}/subscribe/
pub async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = path?;
    let user = require_user(&viewer)?;
    let id = validate_id(id, "User")?;

    state.user_service().unsubscribe(user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /users/subscriptions/
pub async fn subscriptions(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Query(query): Query<RecipesLimitQuery>,
) -> Result<Json<ApiResponse<Vec<SubscriptionDto>>>, ApiError> {
    let user = require_user(&viewer)?;
    let limit = parse_recipes_limit(query.recipes_limit.as_deref())?;

    let subscriptions = state.user_service().subscriptions(user, limit).await?;

    Ok(Json(ApiResponse::success(
        subscriptions.into_iter().map(SubscriptionDto::from).collect(),
    )))
}
