//! # cmt-core
//!
//! Domain layer of the chapter management tool: member status and role
//! timelines, the scoring engine, entities, repository traits, and domain
//! events. No infrastructure dependencies.

pub mod entities;
pub mod error;
pub mod events;
pub mod scoring;
pub mod timeline;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    Activity, ActivityCounts, Chapter, ChapterScore, Member, RoleInterval, ScoreKind, ScoreType,
    Section, SpecialScore, StatusInterval, TransitionRecord,
};
pub use error::DomainError;
pub use events::DomainEvent;
pub use timeline::{MemberTimeline, TimelinePlan, TimelinePolicy, Transition};
pub use traits::{
    AuditRepository, ChapterRepository, MemberRepository, RepoResult, ScoreRepository,
    TimelineRepository, TimelineWrite,
};
pub use value_objects::{
    Biennium, DateSpan, MemberStatus, Permissions, Snowflake, SnowflakeGenerator, Term, YearTerm,
};
