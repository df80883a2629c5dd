//! Response DTOs for API endpoints
//!
//! Snowflake IDs are serialized as strings for JavaScript compatibility.
//! Open-ended interval ends are `null`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;

// ============================================================================
// Auth Responses
// ============================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub member: MemberResponse,
}

// ============================================================================
// Chapter Responses
// ============================================================================

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChapterResponse {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub school: Option<String>,
    pub region: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// A current role holder
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OfficerResponse {
    pub interval_id: String,
    pub member_id: String,
    pub name: String,
    pub role: String,
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ElectionResponse {
    /// Role terms cut short for outgoing holders
    pub ended: usize,
    /// Role terms opened for the elected members
    pub assigned: usize,
    pub officers: Vec<OfficerResponse>,
}

// ============================================================================
// Member Responses
// ============================================================================

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MemberResponse {
    pub id: String,
    pub chapter_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub badge_number: Option<i32>,
    pub graduation_year: Option<i32>,
    pub phone: Option<String>,
    /// Cached current status
    pub status: String,
    /// Cached current roles
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The caller's own record with the permissions derived from it
#[derive(Debug, Serialize, ToSchema)]
pub struct CurrentMemberResponse {
    #[serde(flatten)]
    pub member: MemberResponse,
    pub permissions: Vec<String>,
}

// ============================================================================
// Timeline Responses
// ============================================================================

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatusIntervalResponse {
    pub id: String,
    pub status: String,
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatusHistoryResponse {
    pub member_id: String,
    pub current_status: String,
    pub version: i64,
    pub intervals: Vec<StatusIntervalResponse>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoleIntervalResponse {
    pub id: String,
    pub role: String,
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoleHistoryResponse {
    pub member_id: String,
    pub current_roles: Vec<String>,
    pub intervals: Vec<RoleIntervalResponse>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransitionResponse {
    pub id: String,
    pub kind: String,
    pub effective_date: NaiveDate,
    pub submitted_by: Option<String>,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Result of submitting a transition
#[derive(Debug, Serialize, ToSchema)]
pub struct TransitionOutcomeResponse {
    /// False when the submission repeated history already on record
    pub applied: bool,
    pub chapter_id: String,
    pub transition: Option<TransitionResponse>,
    pub history: StatusHistoryResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuditEntryResponse {
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub payload: serde_json::Value,
}

// ============================================================================
// Scoring Responses
// ============================================================================

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScoreTypeResponse {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub section: String,
    pub kind: String,
    pub points: f64,
    pub term_points: f64,
    pub formula: String,
    pub special: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActivityResponse {
    pub id: String,
    pub chapter_id: String,
    pub score_type_id: String,
    pub kind: String,
    pub name: String,
    pub date: NaiveDate,
    /// Term code such as `fa2024`
    pub term: String,
    pub score: f64,
    /// Capped chapter total for the type and term after this report
    pub term_total: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScoreEntryResponse {
    pub score_type_id: String,
    pub slug: String,
    pub name: String,
    pub section: String,
    pub term: String,
    pub score: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChapterScoresResponse {
    pub chapter_id: String,
    /// Fall year that opens the school year
    pub school_year: i32,
    pub scores: Vec<ScoreEntryResponse>,
    pub total: f64,
}

/// Summary of a score recalculation run
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct RecalculateResponse {
    pub chapters: usize,
    /// Activities whose score changed
    pub activities: usize,
    /// Term totals rewritten
    pub terms: usize,
    /// Chapters skipped after an error
    pub failures: usize,
}

// ============================================================================
// Health Responses
// ============================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadinessResponse {
    pub status: String,
    pub database: bool,
}

impl ReadinessResponse {
    pub fn new(database: bool) -> Self {
        Self {
            status: if database { "ready" } else { "not_ready" }.to_string(),
            database,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_member_flattens_profile() {
        let response = CurrentMemberResponse {
            member: MemberResponse {
                id: "42".to_string(),
                chapter_id: "7".to_string(),
                email: "a@b.edu".to_string(),
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                badge_number: None,
                graduation_year: Some(2026),
                phone: None,
                status: "active".to_string(),
                roles: vec!["treasurer".to_string()],
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            permissions: vec!["MANAGE_MEMBERS".to_string()],
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["id"], "42");
        assert_eq!(json["permissions"][0], "MANAGE_MEMBERS");
    }

    #[test]
    fn test_readiness_status() {
        assert_eq!(ReadinessResponse::new(true).status, "ready");
        assert_eq!(ReadinessResponse::new(false).status, "not_ready");
    }
}
