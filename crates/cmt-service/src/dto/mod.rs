//! Data transfer objects for API requests and responses
//!
//! - Request DTOs with validation for API inputs
//! - Response DTOs for serializing API outputs
//! - Mappers for converting domain entities to DTOs

pub mod mappers;
pub mod requests;
pub mod responses;

pub use requests::{
    ApplyTransitionRequest, AssignRoleRequest, CreateChapterRequest, CreateMemberRequest,
    CreateScoreTypeRequest, ElectedOfficer, ElectionRequest, LoginRequest, RecordActivityRequest,
    RefreshTokenRequest, UpdateChapterRequest, UpdateMemberRequest,
};

pub use responses::{
    ActivityResponse, AuditEntryResponse, AuthResponse, ChapterResponse, ChapterScoresResponse,
    CurrentMemberResponse, ElectionResponse, HealthResponse, MemberResponse, OfficerResponse,
    ReadinessResponse, RecalculateResponse, RoleHistoryResponse, RoleIntervalResponse, ScoreEntryResponse,
    ScoreTypeResponse, StatusHistoryResponse, StatusIntervalResponse, TransitionOutcomeResponse,
    TransitionResponse,
};
