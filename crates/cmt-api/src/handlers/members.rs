//! Member handlers
//!
//! Profiles, status history, transitions, roles, and the audit trail.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use cmt_service::dto::{
    ApplyTransitionRequest, AssignRoleRequest, AuditEntryResponse, CurrentMemberResponse,
    MemberResponse, RoleHistoryResponse, StatusHistoryResponse, TransitionOutcomeResponse,
    TransitionResponse, UpdateMemberRequest,
};
use cmt_service::{AuditService, MemberService, RoleService, StatusService};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::extractors::{AuthMember, MemberIdPath, MemberIntervalPath, ValidatedJson};
use crate::response::{ApiResult, Created, ErrorBody};
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuditQuery {
    /// Number of entries, 1 to 200
    pub limit: Option<i64>,
}

/// The caller's record and permissions
#[utoipa::path(get, path = "/api/v1/members/@me", tag = "members",
    security(("bearer" = [])),
    responses((status = 200, body = CurrentMemberResponse)))]
pub async fn get_current_member(
    State(state): State<AppState>,
    auth: AuthMember,
) -> ApiResult<Json<CurrentMemberResponse>> {
    let response = MemberService::new(state.service_context()).me(auth.member_id).await?;
    Ok(Json(response))
}

#[utoipa::path(get, path = "/api/v1/members/{member_id}", tag = "members",
    security(("bearer" = [])),
    params(("member_id" = String, Path)),
    responses(
        (status = 200, body = MemberResponse),
        (status = 404, body = ErrorBody),
    ))]
pub async fn get_member(
    State(state): State<AppState>,
    auth: AuthMember,
    Path(path): Path<MemberIdPath>,
) -> ApiResult<Json<MemberResponse>> {
    let response = MemberService::new(state.service_context())
        .get(auth.member_id, path.member_id()?)
        .await?;
    Ok(Json(response))
}

/// Edit profile fields. Status and roles have their own endpoints.
#[utoipa::path(patch, path = "/api/v1/members/{member_id}", tag = "members",
    security(("bearer" = [])),
    params(("member_id" = String, Path)),
    request_body = UpdateMemberRequest,
    responses(
        (status = 200, body = MemberResponse),
        (status = 403, body = ErrorBody),
    ))]
pub async fn update_member(
    State(state): State<AppState>,
    auth: AuthMember,
    Path(path): Path<MemberIdPath>,
    ValidatedJson(request): ValidatedJson<UpdateMemberRequest>,
) -> ApiResult<Json<MemberResponse>> {
    let response = MemberService::new(state.service_context())
        .update_profile(auth.member_id, path.member_id()?, request)
        .await?;
    Ok(Json(response))
}

/// Full status history
#[utoipa::path(get, path = "/api/v1/members/{member_id}/status", tag = "timeline",
    security(("bearer" = [])),
    params(("member_id" = String, Path)),
    responses(
        (status = 200, body = StatusHistoryResponse),
        (status = 422, description = "Stored history overlaps", body = ErrorBody),
    ))]
pub async fn get_status_history(
    State(state): State<AppState>,
    auth: AuthMember,
    Path(path): Path<MemberIdPath>,
) -> ApiResult<Json<StatusHistoryResponse>> {
    let response = StatusService::new(state.service_context())
        .history(auth.member_id, path.member_id()?)
        .await?;
    Ok(Json(response))
}

/// Submitted transitions, oldest first
#[utoipa::path(get, path = "/api/v1/members/{member_id}/transitions", tag = "timeline",
    security(("bearer" = [])),
    params(("member_id" = String, Path)),
    responses((status = 200, body = [TransitionResponse])))]
pub async fn list_transitions(
    State(state): State<AppState>,
    auth: AuthMember,
    Path(path): Path<MemberIdPath>,
) -> ApiResult<Json<Vec<TransitionResponse>>> {
    let response = StatusService::new(state.service_context())
        .transitions(auth.member_id, path.member_id()?)
        .await?;
    Ok(Json(response))
}

/// Apply a status transition
#[utoipa::path(post, path = "/api/v1/members/{member_id}/transitions", tag = "timeline",
    security(("bearer" = [])),
    params(("member_id" = String, Path)),
    request_body = ApplyTransitionRequest,
    responses(
        (status = 200, body = TransitionOutcomeResponse),
        (status = 409, description = "Concurrent edits kept winning", body = ErrorBody),
        (status = 422, description = "Transition not allowed from the current status", body = ErrorBody),
    ))]
pub async fn apply_transition(
    State(state): State<AppState>,
    auth: AuthMember,
    Path(path): Path<MemberIdPath>,
    ValidatedJson(request): ValidatedJson<ApplyTransitionRequest>,
) -> ApiResult<Json<TransitionOutcomeResponse>> {
    let response = StatusService::new(state.service_context())
        .apply(auth.member_id, path.member_id()?, request)
        .await?;
    Ok(Json(response))
}

/// Full role history
#[utoipa::path(get, path = "/api/v1/members/{member_id}/roles", tag = "roles",
    security(("bearer" = [])),
    params(("member_id" = String, Path)),
    responses((status = 200, body = RoleHistoryResponse)))]
pub async fn get_role_history(
    State(state): State<AppState>,
    auth: AuthMember,
    Path(path): Path<MemberIdPath>,
) -> ApiResult<Json<RoleHistoryResponse>> {
    let response = RoleService::new(state.service_context())
        .history(auth.member_id, path.member_id()?)
        .await?;
    Ok(Json(response))
}

#[utoipa::path(post, path = "/api/v1/members/{member_id}/roles", tag = "roles",
    security(("bearer" = [])),
    params(("member_id" = String, Path)),
    request_body = AssignRoleRequest,
    responses(
        (status = 201, body = RoleHistoryResponse),
        (status = 403, body = ErrorBody),
    ))]
pub async fn assign_role(
    State(state): State<AppState>,
    auth: AuthMember,
    Path(path): Path<MemberIdPath>,
    ValidatedJson(request): ValidatedJson<AssignRoleRequest>,
) -> ApiResult<Created<Json<RoleHistoryResponse>>> {
    let response = RoleService::new(state.service_context())
        .assign(auth.member_id, path.member_id()?, request)
        .await?;
    Ok(Created(Json(response)))
}

/// End a role as of yesterday. A role that has not started is removed.
#[utoipa::path(delete, path = "/api/v1/members/{member_id}/roles/{interval_id}", tag = "roles",
    security(("bearer" = [])),
    params(("member_id" = String, Path), ("interval_id" = String, Path)),
    responses(
        (status = 200, body = RoleHistoryResponse),
        (status = 404, body = ErrorBody),
    ))]
pub async fn end_role(
    State(state): State<AppState>,
    auth: AuthMember,
    Path(path): Path<MemberIntervalPath>,
) -> ApiResult<Json<RoleHistoryResponse>> {
    let response = RoleService::new(state.service_context())
        .end(auth.member_id, path.member_id()?, path.interval_id()?)
        .await?;
    Ok(Json(response))
}

/// Recent audit events about a member, newest first
#[utoipa::path(get, path = "/api/v1/members/{member_id}/audit", tag = "members",
    security(("bearer" = [])),
    params(("member_id" = String, Path), AuditQuery),
    responses((status = 200, body = [AuditEntryResponse])))]
pub async fn get_audit_trail(
    State(state): State<AppState>,
    auth: AuthMember,
    Path(path): Path<MemberIdPath>,
    Query(query): Query<AuditQuery>,
) -> ApiResult<Json<Vec<AuditEntryResponse>>> {
    let response = AuditService::new(state.service_context())
        .list_for_member(auth.member_id, path.member_id()?, query.limit)
        .await?;
    Ok(Json(response))
}
