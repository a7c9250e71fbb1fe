use axum::{
    Extension, Json,
    extract::{Request, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, TokenDto};
use crate::constants::auth::{BEARER_PREFIX, TOKEN_PREFIX};
use crate::models::{AuthUser, LoginInput, Viewer};

// ============================================================================
// Middleware
// ============================================================================

/// Resolves the `Authorization` header into a [`Viewer`] request extension.
///
/// Accepts `Token <key>` and `Bearer <key>`. No header means anonymous; a
/// header that does not resolve to a user is rejected with 401.
pub async fn resolve_viewer(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let viewer = match extract_token(&headers)? {
        None => Viewer::Anonymous,
        Some(token) => {
            let user = state
                .user_service()
                .authenticate(&token)
                .await?
                .ok_or_else(|| ApiError::Unauthorized("Invalid token".to_string()))?;
            tracing::Span::current().record("user_id", user.id);
            Viewer::User(user)
        }
    };

    request.extensions_mut().insert(viewer.clone());
    let mut response = next.run(request).await;
    // Read back by the request logger, which sits outside this layer
    response.extensions_mut().insert(viewer);
    Ok(response)
}

fn extract_token(headers: &HeaderMap) -> Result<Option<String>, ApiError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Invalid authorization header".to_string()))?;

    let token = value
        .strip_prefix(TOKEN_PREFIX)
        .or_else(|| value.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Invalid authorization header".to_string()))?;

    Ok(Some(token.to_string()))
}

/// The authenticated user, or 401 for anonymous viewers.
pub fn require_user(viewer: &Viewer) -> Result<&AuthUser, ApiError> {
    viewer.user().ok_or_else(ApiError::unauthorized)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/token/login/
/// Exchange email and password for the user's token
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> Result<Json<ApiResponse<TokenDto>>, ApiError> {
    let Json(input) = payload?;
    let auth_token = state.user_service().login(input).await?;

    Ok(Json(ApiResponse::success(TokenDto { auth_token })))
}

/// POST /auth/token/logout/
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_user(&viewer)?;
    state.user_service().logout(user).await?;

    Ok(StatusCode::NO_CONTENT)
}
