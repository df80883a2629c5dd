//! Domain errors - error types for the domain layer

use chrono::NaiveDate;
use thiserror::Error;

use crate::value_objects::{MemberStatus, Snowflake};

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Chapter not found: {0}")]
    ChapterNotFound(String),

    #[error("Member not found: {0}")]
    MemberNotFound(Snowflake),

    #[error("Status or role interval not found: {0}")]
    IntervalNotFound(Snowflake),

    #[error("Score type not found: {0}")]
    ScoreTypeNotFound(String),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Unknown status: {0}")]
    UnknownStatus(String),

    #[error("Invalid date range: {start} is after {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Formula syntax error at position {position}: {message}")]
    FormulaSyntax { position: usize, message: String },

    #[error("Unknown formula variable: {0}")]
    UnknownFormulaVariable(String),

    // =========================================================================
    // Authorization Errors
    // =========================================================================
    #[error("Missing permission: {0}")]
    MissingPermission(String),

    // =========================================================================
    // Conflict Errors
    // =========================================================================
    #[error("Email already in use")]
    EmailAlreadyExists,

    #[error("Chapter slug already in use: {0}")]
    ChapterSlugExists(String),

    #[error("Score type slug already in use: {0}")]
    ScoreTypeSlugExists(String),

    /// Another writer changed the member's timeline first. Safe to retry.
    #[error("Timeline of member {0} was modified concurrently")]
    TimelineConflict(Snowflake),

    // =========================================================================
    // Business Rule Violations
    // =========================================================================
    #[error(
        "Cannot apply {transition} to a member whose status is {}",
        .from.map_or("none", |s| s.as_str())
    )]
    InvalidTransition {
        transition: &'static str,
        from: Option<MemberStatus>,
    },

    #[error("Member {member_id} has overlapping status intervals on {day}")]
    OverlappingStatus { member_id: Snowflake, day: NaiveDate },

    #[error("Member is already in chapter {0}")]
    SameChapterTransfer(Snowflake),

    #[error("Formula evaluation failed: {0}")]
    FormulaEvaluation(String),

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            // Not Found
            Self::ChapterNotFound(_) => "UNKNOWN_CHAPTER",
            Self::MemberNotFound(_) => "UNKNOWN_MEMBER",
            Self::IntervalNotFound(_) => "UNKNOWN_INTERVAL",
            Self::ScoreTypeNotFound(_) => "UNKNOWN_SCORE_TYPE",

            // Validation
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::UnknownStatus(_) => "UNKNOWN_STATUS",
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::FormulaSyntax { .. } => "FORMULA_SYNTAX",
            Self::UnknownFormulaVariable(_) => "UNKNOWN_FORMULA_VARIABLE",

            // Authorization
            Self::MissingPermission(_) => "MISSING_PERMISSIONS",

            // Conflict
            Self::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",
            Self::ChapterSlugExists(_) => "CHAPTER_SLUG_EXISTS",
            Self::ScoreTypeSlugExists(_) => "SCORE_TYPE_SLUG_EXISTS",
            Self::TimelineConflict(_) => "TIMELINE_CONFLICT",

            // Business Rules
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::OverlappingStatus { .. } => "OVERLAPPING_STATUS",
            Self::SameChapterTransfer(_) => "SAME_CHAPTER_TRANSFER",
            Self::FormulaEvaluation(_) => "FORMULA_EVALUATION",

            // Infrastructure
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ChapterNotFound(_)
                | Self::MemberNotFound(_)
                | Self::IntervalNotFound(_)
                | Self::ScoreTypeNotFound(_)
        )
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_)
                | Self::InvalidEmail
                | Self::UnknownStatus(_)
                | Self::InvalidDateRange { .. }
                | Self::FormulaSyntax { .. }
                | Self::UnknownFormulaVariable(_)
        )
    }

    /// Check if this is an authorization error
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::MissingPermission(_))
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::EmailAlreadyExists
                | Self::ChapterSlugExists(_)
                | Self::ScoreTypeSlugExists(_)
                | Self::TimelineConflict(_)
        )
    }

    /// Business rule violations surface as 422
    pub fn is_business_rule(&self) -> bool {
        matches!(
            self,
            Self::InvalidTransition { .. }
                | Self::OverlappingStatus { .. }
                | Self::SameChapterTransfer(_)
                | Self::FormulaEvaluation(_)
        )
    }

    /// Only the optimistic-lock conflict is worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TimelineConflict(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = DomainError::MemberNotFound(Snowflake::new(1));
        assert_eq!(err.code(), "UNKNOWN_MEMBER");

        let err = DomainError::MissingPermission("MANAGE_MEMBERS".to_string());
        assert_eq!(err.code(), "MISSING_PERMISSIONS");
    }

    #[test]
    fn test_classification() {
        assert!(DomainError::ChapterNotFound("alpha".into()).is_not_found());
        assert!(DomainError::InvalidEmail.is_validation());
        assert!(DomainError::TimelineConflict(Snowflake::new(1)).is_conflict());
        assert!(DomainError::TimelineConflict(Snowflake::new(1)).is_retryable());
        assert!(!DomainError::EmailAlreadyExists.is_retryable());
        assert!(DomainError::FormulaEvaluation("x".into()).is_business_rule());
    }

    #[test]
    fn test_invalid_transition_display() {
        let err = DomainError::InvalidTransition {
            transition: "initiation",
            from: Some(MemberStatus::Alumni),
        };
        assert_eq!(
            err.to_string(),
            "Cannot apply initiation to a member whose status is alumni"
        );

        let err = DomainError::InvalidTransition {
            transition: "graduation",
            from: None,
        };
        assert!(err.to_string().ends_with("status is none"));
    }
}
