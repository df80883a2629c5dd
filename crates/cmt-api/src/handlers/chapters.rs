//! Chapter handlers
//!
//! Chapters, rosters, officers, elections, and member intake.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use cmt_core::MemberStatus;
use cmt_service::dto::{
    ChapterResponse, CreateChapterRequest, CreateMemberRequest, ElectionRequest,
    ElectionResponse, MemberResponse, OfficerResponse, UpdateChapterRequest,
};
use cmt_service::{ChapterService, MemberService, RoleService};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::extractors::{AuthMember, ChapterIdPath, Pagination, PaginationParams, ValidatedJson};
use crate::response::{ApiError, ApiResult, Created, ErrorBody};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ChapterListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RosterQuery {
    /// Cached current status, e.g. `active`
    pub status: Option<String>,
}

#[utoipa::path(get, path = "/api/v1/chapters", tag = "chapters",
    security(("bearer" = [])),
    params(ChapterListQuery),
    responses((status = 200, body = [ChapterResponse])))]
pub async fn list_chapters(
    State(state): State<AppState>,
    _auth: AuthMember,
    Query(query): Query<ChapterListQuery>,
) -> ApiResult<Json<Vec<ChapterResponse>>> {
    let chapters = ChapterService::new(state.service_context())
        .list(query.include_inactive)
        .await?;
    Ok(Json(chapters))
}

/// Found a chapter (national officers)
#[utoipa::path(post, path = "/api/v1/chapters", tag = "chapters",
    security(("bearer" = [])),
    request_body = CreateChapterRequest,
    responses(
        (status = 201, body = ChapterResponse),
        (status = 403, body = ErrorBody),
        (status = 409, body = ErrorBody),
    ))]
pub async fn create_chapter(
    State(state): State<AppState>,
    auth: AuthMember,
    ValidatedJson(request): ValidatedJson<CreateChapterRequest>,
) -> ApiResult<Created<Json<ChapterResponse>>> {
    let chapter = ChapterService::new(state.service_context())
        .create(auth.member_id, request)
        .await?;
    Ok(Created(Json(chapter)))
}

#[utoipa::path(get, path = "/api/v1/chapters/{chapter_id}", tag = "chapters",
    security(("bearer" = [])),
    params(("chapter_id" = String, Path)),
    responses(
        (status = 200, body = ChapterResponse),
        (status = 404, body = ErrorBody),
    ))]
pub async fn get_chapter(
    State(state): State<AppState>,
    _auth: AuthMember,
    Path(path): Path<ChapterIdPath>,
) -> ApiResult<Json<ChapterResponse>> {
    let chapter = ChapterService::new(state.service_context())
        .get(path.chapter_id()?)
        .await?;
    Ok(Json(chapter))
}

#[utoipa::path(patch, path = "/api/v1/chapters/{chapter_id}", tag = "chapters",
    security(("bearer" = [])),
    params(("chapter_id" = String, Path)),
    request_body = UpdateChapterRequest,
    responses(
        (status = 200, body = ChapterResponse),
        (status = 403, body = ErrorBody),
    ))]
pub async fn update_chapter(
    State(state): State<AppState>,
    auth: AuthMember,
    Path(path): Path<ChapterIdPath>,
    ValidatedJson(request): ValidatedJson<UpdateChapterRequest>,
) -> ApiResult<Json<ChapterResponse>> {
    let chapter = ChapterService::new(state.service_context())
        .update(auth.member_id, path.chapter_id()?, request)
        .await?;
    Ok(Json(chapter))
}

/// Roster by cached current status
#[utoipa::path(get, path = "/api/v1/chapters/{chapter_id}/members", tag = "chapters",
    security(("bearer" = [])),
    params(("chapter_id" = String, Path), RosterQuery, PaginationParams),
    responses(
        (status = 200, body = [MemberResponse]),
        (status = 403, body = ErrorBody),
    ))]
pub async fn get_roster(
    State(state): State<AppState>,
    auth: AuthMember,
    Path(path): Path<ChapterIdPath>,
    Query(query): Query<RosterQuery>,
    pagination: Pagination,
) -> ApiResult<Json<Vec<MemberResponse>>> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<MemberStatus>)
        .transpose()
        .map_err(|e| ApiError::invalid_query(e.to_string()))?;

    let members = ChapterService::new(state.service_context())
        .roster(
            auth.member_id,
            path.chapter_id()?,
            status,
            pagination.limit,
            pagination.after,
        )
        .await?;
    Ok(Json(members))
}

/// Add a member, `pnm` from today unless told otherwise
#[utoipa::path(post, path = "/api/v1/chapters/{chapter_id}/members", tag = "chapters",
    security(("bearer" = [])),
    params(("chapter_id" = String, Path)),
    request_body = CreateMemberRequest,
    responses(
        (status = 201, body = MemberResponse),
        (status = 409, body = ErrorBody),
    ))]
pub async fn create_member(
    State(state): State<AppState>,
    auth: AuthMember,
    Path(path): Path<ChapterIdPath>,
    ValidatedJson(request): ValidatedJson<CreateMemberRequest>,
) -> ApiResult<Created<Json<MemberResponse>>> {
    let member = MemberService::new(state.service_context())
        .create(auth.member_id, path.chapter_id()?, request)
        .await?;
    Ok(Created(Json(member)))
}

/// Current role holders
#[utoipa::path(get, path = "/api/v1/chapters/{chapter_id}/officers", tag = "chapters",
    security(("bearer" = [])),
    params(("chapter_id" = String, Path)),
    responses((status = 200, body = [OfficerResponse])))]
pub async fn get_officers(
    State(state): State<AppState>,
    auth: AuthMember,
    Path(path): Path<ChapterIdPath>,
) -> ApiResult<Json<Vec<OfficerResponse>>> {
    let officers = ChapterService::new(state.service_context())
        .officers(auth.member_id, path.chapter_id()?)
        .await?;
    Ok(Json(officers))
}

/// Seat newly elected officers, ending the terms they replace
#[utoipa::path(post, path = "/api/v1/chapters/{chapter_id}/elections", tag = "roles",
    security(("bearer" = [])),
    params(("chapter_id" = String, Path)),
    request_body = ElectionRequest,
    responses(
        (status = 200, body = ElectionResponse),
        (status = 400, body = ErrorBody),
    ))]
pub async fn hold_election(
    State(state): State<AppState>,
    auth: AuthMember,
    Path(path): Path<ChapterIdPath>,
    ValidatedJson(request): ValidatedJson<ElectionRequest>,
) -> ApiResult<Json<ElectionResponse>> {
    let response = RoleService::new(state.service_context())
        .elect(auth.member_id, path.chapter_id()?, request)
        .await?;
    Ok(Json(response))
}
