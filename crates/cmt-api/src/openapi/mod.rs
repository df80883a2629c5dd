//! OpenAPI document and Swagger UI

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::{auth, chapters, health, members, scoring};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(title = "Chapter Management Tool", description = "Membership, officers, and chapter scoring"),
    paths(
        health::health_check,
        health::readiness_check,
        auth::login,
        auth::refresh_token,
        members::get_current_member,
        members::get_member,
        members::update_member,
        members::get_status_history,
        members::list_transitions,
        members::apply_transition,
        members::get_role_history,
        members::assign_role,
        members::end_role,
        members::get_audit_trail,
        chapters::list_chapters,
        chapters::create_chapter,
        chapters::get_chapter,
        chapters::update_chapter,
        chapters::get_roster,
        chapters::create_member,
        chapters::get_officers,
        chapters::hold_election,
        scoring::list_score_types,
        scoring::create_score_type,
        scoring::record_event,
        scoring::record_submission,
        scoring::get_scores,
        scoring::recalculate_scores,
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Liveness and readiness"),
        (name = "auth", description = "Login and token refresh"),
        (name = "members", description = "Member records"),
        (name = "timeline", description = "Status history and transitions"),
        (name = "roles", description = "Officer terms and elections"),
        (name = "chapters", description = "Chapters and rosters"),
        (name = "scoring", description = "Activities and chapter scores"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Swagger UI at /swagger-ui, document at /api-docs/openapi.json
pub fn swagger_routes() -> Router<AppState> {
    Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
