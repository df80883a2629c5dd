//! Request DTOs for API endpoints
//!
//! All request DTOs implement `Deserialize` and `Validate` for input validation.

use chrono::NaiveDate;
use cmt_core::{MemberStatus, ScoreKind, Section, Snowflake, SpecialScore, Transition};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

// ============================================================================
// Auth Requests
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

// ============================================================================
// Chapter Requests
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateChapterRequest {
    #[validate(length(min = 1, max = 100, message = "Chapter name must be 1-100 characters"))]
    pub name: String,

    /// Derived from the name when omitted
    #[validate(length(min = 1, max = 64, message = "Slug must be 1-64 characters"))]
    pub slug: Option<String>,

    #[validate(length(max = 200))]
    pub school: Option<String>,

    #[validate(length(max = 100))]
    pub region: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateChapterRequest {
    #[validate(length(min = 1, max = 100, message = "Chapter name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 200))]
    pub school: Option<String>,

    #[validate(length(max = 100))]
    pub region: Option<String>,

    pub active: Option<bool>,
}

// ============================================================================
// Member Requests
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateMemberRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, max = 64, message = "First name must be 1-64 characters"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 64, message = "Last name must be 1-64 characters"))]
    pub last_name: String,

    #[validate(range(min = 1, message = "Badge number must be positive"))]
    pub badge_number: Option<i32>,

    #[validate(range(min = 1900, max = 2100, message = "Graduation year is out of range"))]
    pub graduation_year: Option<i32>,

    #[validate(length(max = 32))]
    pub phone: Option<String>,

    /// Opening status, `pnm` when omitted
    #[schema(value_type = Option<String>, example = "pnm")]
    pub status: Option<MemberStatus>,

    /// First day of the opening status, today when omitted
    pub start: Option<NaiveDate>,

    #[validate(length(min = 8, max = 72, message = "Password must be 8-72 characters"))]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateMemberRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 1, max = 64))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 64))]
    pub last_name: Option<String>,

    #[validate(range(min = 1, message = "Badge number must be positive"))]
    pub badge_number: Option<i32>,

    #[validate(range(min = 1900, max = 2100, message = "Graduation year is out of range"))]
    pub graduation_year: Option<i32>,

    #[validate(length(max = 32))]
    pub phone: Option<String>,
}

// ============================================================================
// Timeline Requests
// ============================================================================

/// A form submission, e.g. `{"transition": {"kind": "graduation"}}`
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ApplyTransitionRequest {
    #[schema(value_type = Object, example = json!({"kind": "away", "reason": "coop", "until": "2025-05-15"}))]
    pub transition: Transition,

    /// Defaults to today
    pub effective_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AssignRoleRequest {
    #[validate(length(min = 1, max = 64, message = "Role must be 1-64 characters"))]
    pub role: String,

    /// Defaults to today
    pub start: Option<NaiveDate>,

    /// Defaults to the configured role term
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ElectedOfficer {
    #[schema(value_type = String)]
    pub member_id: Snowflake,

    #[validate(length(min = 1, max = 64, message = "Role must be 1-64 characters"))]
    pub role: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ElectionRequest {
    pub start: NaiveDate,

    pub end: Option<NaiveDate>,

    #[validate(length(min = 1, max = 50, message = "Elect between 1 and 50 officers"), nested)]
    pub officers: Vec<ElectedOfficer>,
}

// ============================================================================
// Scoring Requests
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateScoreTypeRequest {
    #[validate(length(min = 1, max = 64))]
    pub slug: String,

    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: String,

    #[schema(value_type = String, example = "Ser")]
    pub section: Section,

    #[schema(value_type = String, example = "Evt")]
    pub kind: ScoreKind,

    #[validate(range(min = 0.0))]
    pub points: f64,

    #[validate(range(min = 0.0))]
    pub term_points: f64,

    #[serde(default)]
    #[validate(length(max = 500))]
    pub formula: String,

    #[serde(default)]
    pub base_points: f64,
    #[serde(default)]
    pub attendance_multiplier: f64,
    #[serde(default)]
    pub member_add: f64,
    #[serde(default)]
    pub stem_add: f64,
    #[serde(default)]
    pub alumni_add: f64,
    #[serde(default)]
    pub guest_add: f64,

    #[schema(value_type = Option<String>)]
    pub special: Option<SpecialScore>,
}

/// An event or submission report
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RecordActivityRequest {
    /// Score type slug
    #[validate(length(min = 1, max = 64))]
    pub score_type: String,

    #[validate(length(min = 1, max = 200))]
    pub name: String,

    pub date: NaiveDate,

    #[serde(default)]
    #[validate(range(min = 0))]
    pub members: i32,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub alumni: i32,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub guests: i32,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub stem: i32,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub hours: f64,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub miles: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_validation() {
        let valid = LoginRequest {
            email: "scribe@alpha.edu".to_string(),
            password: "Secret123".to_string(),
        };
        assert!(valid.validate().is_ok());

        let bad_email = LoginRequest {
            email: "not-an-email".to_string(),
            password: "Secret123".to_string(),
        };
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn test_transition_request_parses_tagged_payload() {
        let request: ApplyTransitionRequest = serde_json::from_str(
            r#"{"transition": {"kind": "probation", "until": "2025-01-31"}, "effective_date": "2024-10-01"}"#,
        )
        .unwrap();
        assert_eq!(request.transition.kind(), "probation");
        assert_eq!(request.effective_date, NaiveDate::from_ymd_opt(2024, 10, 1));
    }

    #[test]
    fn test_election_requires_officers() {
        let request = ElectionRequest {
            start: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end: None,
            officers: Vec::new(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_election_validates_each_officer() {
        let officer = |role: &str| ElectedOfficer {
            member_id: Snowflake::new(42),
            role: role.to_string(),
        };
        let mut request = ElectionRequest {
            start: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end: None,
            officers: vec![officer("Regent"), officer("Scribe")],
        };
        assert!(request.validate().is_ok());

        request.officers.push(officer(""));
        let errors = request.validate().unwrap_err();
        assert!(errors.errors().contains_key("officers"));
    }

    #[test]
    fn test_activity_counts_default_to_zero() {
        let request: RecordActivityRequest = serde_json::from_str(
            r#"{"score_type": "annual-report", "name": "Annual report", "date": "2024-11-01"}"#,
        )
        .unwrap();
        assert_eq!(request.members, 0);
        assert!(request.validate().is_ok());
    }
}
