//! # cmt-service
//!
//! Application layer: use cases over the repositories, request and response
//! DTOs, and permission checks.

pub mod dto;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;

pub use services::{
    AuditService, AuthService, ChapterService, DedupeReport, MaintenanceService, MemberService,
    PermissionService, PledgeCheckReport, RoleService, ScoreService, ServiceContext,
    ServiceContextBuilder, ServiceError, ServiceResult, SpecialScoresReport, StatusService,
    SyncReport,
};
