//! Pagination extractor
//!
//! Rosters page forward by member id.

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use cmt_core::Snowflake;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::response::ApiError;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

/// Raw pagination query parameters
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Return members with ids after this one
    #[serde(default)]
    pub after: Option<String>,
    /// Page size, 1 to 200
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Validated pagination parameters
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub after: Option<Snowflake>,
    pub limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            after: None,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl TryFrom<PaginationParams> for Pagination {
    type Error = ApiError;

    fn try_from(params: PaginationParams) -> Result<Self, Self::Error> {
        let after = params
            .after
            .map(|s| {
                s.parse::<Snowflake>()
                    .map_err(|_| ApiError::invalid_query("Invalid 'after' cursor format"))
            })
            .transpose()?;

        Ok(Self {
            after,
            limit: params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Pagination
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<PaginationParams>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::invalid_query(e.to_string()))?;

        Pagination::try_from(params)
    }
}
