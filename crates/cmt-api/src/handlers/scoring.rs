//! Scoring handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use cmt_core::ScoreKind;
use cmt_service::dto::{
    ActivityResponse, ChapterScoresResponse, CreateScoreTypeRequest, RecalculateResponse,
    RecordActivityRequest, ScoreTypeResponse,
};
use cmt_service::ScoreService;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::extractors::{AuthMember, ChapterIdPath, ValidatedJson};
use crate::response::{ApiResult, Created, ErrorBody};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ScoresQuery {
    /// Fall year opening the school year, the current one when omitted
    pub year: Option<i32>,
}

#[utoipa::path(get, path = "/api/v1/score-types", tag = "scoring",
    security(("bearer" = [])),
    responses((status = 200, body = [ScoreTypeResponse])))]
pub async fn list_score_types(
    State(state): State<AppState>,
    _auth: AuthMember,
) -> ApiResult<Json<Vec<ScoreTypeResponse>>> {
    let types = ScoreService::new(state.service_context()).list_types().await?;
    Ok(Json(types))
}

/// Define a score type (national officers)
#[utoipa::path(post, path = "/api/v1/score-types", tag = "scoring",
    security(("bearer" = [])),
    request_body = CreateScoreTypeRequest,
    responses(
        (status = 201, body = ScoreTypeResponse),
        (status = 400, description = "Formula does not parse", body = ErrorBody),
        (status = 409, body = ErrorBody),
    ))]
pub async fn create_score_type(
    State(state): State<AppState>,
    auth: AuthMember,
    ValidatedJson(request): ValidatedJson<CreateScoreTypeRequest>,
) -> ApiResult<Created<Json<ScoreTypeResponse>>> {
    let score_type = ScoreService::new(state.service_context())
        .create_type(auth.member_id, request)
        .await?;
    Ok(Created(Json(score_type)))
}

#[utoipa::path(post, path = "/api/v1/chapters/{chapter_id}/events", tag = "scoring",
    security(("bearer" = [])),
    params(("chapter_id" = String, Path)),
    request_body = RecordActivityRequest,
    responses((status = 201, body = ActivityResponse)))]
pub async fn record_event(
    State(state): State<AppState>,
    auth: AuthMember,
    Path(path): Path<ChapterIdPath>,
    ValidatedJson(request): ValidatedJson<RecordActivityRequest>,
) -> ApiResult<Created<Json<ActivityResponse>>> {
    record(state, auth, path, ScoreKind::Event, request).await
}

#[utoipa::path(post, path = "/api/v1/chapters/{chapter_id}/submissions", tag = "scoring",
    security(("bearer" = [])),
    params(("chapter_id" = String, Path)),
    request_body = RecordActivityRequest,
    responses((status = 201, body = ActivityResponse)))]
pub async fn record_submission(
    State(state): State<AppState>,
    auth: AuthMember,
    Path(path): Path<ChapterIdPath>,
    ValidatedJson(request): ValidatedJson<RecordActivityRequest>,
) -> ApiResult<Created<Json<ActivityResponse>>> {
    record(state, auth, path, ScoreKind::Submission, request).await
}

async fn record(
    state: AppState,
    auth: AuthMember,
    path: ChapterIdPath,
    kind: ScoreKind,
    request: RecordActivityRequest,
) -> ApiResult<Created<Json<ActivityResponse>>> {
    let activity = ScoreService::new(state.service_context())
        .record(auth.member_id, path.chapter_id()?, kind, request)
        .await?;
    Ok(Created(Json(activity)))
}

/// Per-type, per-term scores for one school year
#[utoipa::path(get, path = "/api/v1/chapters/{chapter_id}/scores", tag = "scoring",
    security(("bearer" = [])),
    params(("chapter_id" = String, Path), ScoresQuery),
    responses((status = 200, body = ChapterScoresResponse)))]
pub async fn get_scores(
    State(state): State<AppState>,
    auth: AuthMember,
    Path(path): Path<ChapterIdPath>,
    Query(query): Query<ScoresQuery>,
) -> ApiResult<Json<ChapterScoresResponse>> {
    let scores = ScoreService::new(state.service_context())
        .scores(auth.member_id, path.chapter_id()?, query.year)
        .await?;
    Ok(Json(scores))
}

/// Rescore every reported type for the chapter (national officers)
#[utoipa::path(post, path = "/api/v1/chapters/{chapter_id}/scores/recalculate", tag = "scoring",
    security(("bearer" = [])),
    params(("chapter_id" = String, Path)),
    responses(
        (status = 200, body = RecalculateResponse),
        (status = 403, body = ErrorBody),
    ))]
pub async fn recalculate_scores(
    State(state): State<AppState>,
    auth: AuthMember,
    Path(path): Path<ChapterIdPath>,
) -> ApiResult<Json<RecalculateResponse>> {
    let report = ScoreService::new(state.service_context())
        .recalculate_chapter(auth.member_id, path.chapter_id()?)
        .await?;
    Ok(Json(report))
}
