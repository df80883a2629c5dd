//! Route definitions
//!
//! API routes are mounted under /api/v1. Health probes live outside the
//! rate limiter.

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::handlers::{auth, chapters, health, members, scoring};
use crate::state::AppState;

/// Create the main API router (health routes excluded)
pub fn create_router() -> Router<AppState> {
    Router::new().nest("/api/v1", api_v1_routes())
}

/// Health check routes (exported separately to bypass rate limiting)
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
}

fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .merge(auth_routes())
        .merge(member_routes())
        .merge(chapter_routes())
        .merge(scoring_routes())
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh_token))
}

fn member_routes() -> Router<AppState> {
    Router::new()
        .route("/members/@me", get(members::get_current_member))
        .route(
            "/members/:member_id",
            get(members::get_member).patch(members::update_member),
        )
        // Timeline
        .route("/members/:member_id/status", get(members::get_status_history))
        .route(
            "/members/:member_id/transitions",
            get(members::list_transitions).post(members::apply_transition),
        )
        // Roles
        .route(
            "/members/:member_id/roles",
            get(members::get_role_history).post(members::assign_role),
        )
        .route(
            "/members/:member_id/roles/:interval_id",
            delete(members::end_role),
        )
        .route("/members/:member_id/audit", get(members::get_audit_trail))
}

fn chapter_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/chapters",
            get(chapters::list_chapters).post(chapters::create_chapter),
        )
        .route(
            "/chapters/:chapter_id",
            get(chapters::get_chapter).patch(chapters::update_chapter),
        )
        .route(
            "/chapters/:chapter_id/members",
            get(chapters::get_roster).post(chapters::create_member),
        )
        .route("/chapters/:chapter_id/officers", get(chapters::get_officers))
        .route("/chapters/:chapter_id/elections", post(chapters::hold_election))
}

fn scoring_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/score-types",
            get(scoring::list_score_types).post(scoring::create_score_type),
        )
        .route("/chapters/:chapter_id/events", post(scoring::record_event))
        .route(
            "/chapters/:chapter_id/submissions",
            post(scoring::record_submission),
        )
        .route("/chapters/:chapter_id/scores", get(scoring::get_scores))
        .route(
            "/chapters/:chapter_id/scores/recalculate",
            post(scoring::recalculate_scores),
        )
}
