//! Authentication extractor
//!
//! Extracts and validates the access token from the Authorization header.
//! Permissions are not read from the token; services derive them from the
//! member's current roles on every request.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use cmt_core::Snowflake;

use crate::response::ApiError;
use crate::state::AppState;

/// Member identified by a valid access token
#[derive(Debug, Clone, Copy)]
pub struct AuthMember {
    pub member_id: Snowflake,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthMember
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::MissingAuth)?;

        let app_state = AppState::from_ref(state);
        let claims = app_state
            .jwt_service()
            .validate_access_token(bearer.token())
            .map_err(|e| {
                tracing::warn!(error = %e, "Rejected access token");
                ApiError::App(e)
            })?;

        let member_id = claims.member_id().map_err(ApiError::App)?;
        Ok(Self { member_id })
    }
}
