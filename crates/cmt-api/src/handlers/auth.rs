//! Authentication handlers

use axum::{extract::State, Json};
use cmt_service::dto::{AuthResponse, LoginRequest, RefreshTokenRequest};
use cmt_service::AuthService;

use crate::extractors::ValidatedJson;
use crate::response::{ApiResult, ErrorBody};
use crate::state::AppState;

/// Exchange email and password for a token pair
#[utoipa::path(post, path = "/api/v1/auth/login", tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, body = AuthResponse),
        (status = 401, body = ErrorBody),
    ))]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let response = AuthService::new(state.service_context()).login(request).await?;
    Ok(Json(response))
}

/// Trade a refresh token for a new pair
#[utoipa::path(post, path = "/api/v1/auth/refresh", tag = "auth",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, body = AuthResponse),
        (status = 401, body = ErrorBody),
    ))]
pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RefreshTokenRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let response = AuthService::new(state.service_context()).refresh(request).await?;
    Ok(Json(response))
}
