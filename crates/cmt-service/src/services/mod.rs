//! Business logic services
//!
//! This module contains all service layer implementations that handle
//! business logic, validation, and orchestration of domain operations.

pub mod audit;
pub mod auth;
pub mod chapter;
pub mod context;
pub mod error;
pub mod maintenance;
pub mod member;
pub mod permission;
pub mod role;
pub mod score;
pub mod status;

// Re-export all services for convenience
pub use audit::AuditService;
pub use auth::AuthService;
pub use chapter::ChapterService;
pub use context::{ServiceContext, ServiceContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use maintenance::{
    DedupeReport, MaintenanceService, PledgeCheckReport, SyncReport,
};
pub use member::MemberService;
pub use permission::PermissionService;
pub use role::RoleService;
pub use score::{ScoreService, SpecialScoresReport};
pub use status::StatusService;
