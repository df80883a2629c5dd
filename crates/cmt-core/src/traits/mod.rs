//! Repository traits

mod repositories;

pub use repositories::{
    AuditRepository, ChapterRepository, MemberRepository, RepoResult, RoleHolder,
    ScoreRepository, StalePledge, TimelineRepository, TimelineWrite,
};
