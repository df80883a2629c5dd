//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::entities::{
    Activity, Chapter, ChapterScore, Member, RoleInterval, ScoreKind, ScoreType, StatusInterval,
    TransitionRecord,
};
use crate::error::DomainError;
use crate::events::DomainEvent;
use crate::timeline::{MemberTimeline, TimelinePlan};
use crate::value_objects::{DateSpan, MemberStatus, Snowflake, YearTerm};

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

/// Everything one timeline mutation writes for one member.
///
/// Applied atomically. The write fails with
/// [`DomainError::TimelineConflict`] if the member's `timeline_version` no
/// longer equals `expected_version`.
#[derive(Debug, Clone)]
pub struct TimelineWrite {
    pub member_id: Snowflake,
    pub expected_version: i64,
    pub statuses: TimelinePlan<StatusInterval>,
    pub roles: TimelinePlan<RoleInterval>,
    /// Denormalized cache values after the plans are applied
    pub current_status: MemberStatus,
    pub current_roles: Vec<String>,
    /// Move the member to this chapter
    pub chapter_id: Option<Snowflake>,
    pub transition: Option<TransitionRecord>,
    pub events: Vec<DomainEvent>,
}

impl TimelineWrite {
    pub fn new(timeline: &MemberTimeline, today: NaiveDate) -> Self {
        Self {
            member_id: timeline.member_id,
            expected_version: timeline.version,
            statuses: TimelinePlan::default(),
            roles: TimelinePlan::default(),
            current_status: timeline.current_status(today),
            current_roles: timeline.current_roles(today),
            chapter_id: None,
            transition: None,
            events: Vec::new(),
        }
    }

    /// Nothing to store besides the cache refresh
    pub fn is_noop(&self) -> bool {
        self.statuses.is_empty()
            && self.roles.is_empty()
            && self.chapter_id.is_none()
            && self.transition.is_none()
    }
}

/// A pledge who has not been initiated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StalePledge {
    pub member_id: Snowflake,
    pub chapter_id: Snowflake,
    pub name: String,
    pub email: String,
    pub pledged_on: NaiveDate,
}

/// A role interval together with its holder's chapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleHolder {
    pub interval: RoleInterval,
    pub chapter_id: Snowflake,
    pub name: String,
}

// ============================================================================
// Chapter Repository
// ============================================================================

#[async_trait]
pub trait ChapterRepository: Send + Sync {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Chapter>>;

    async fn find_by_slug(&self, slug: &str) -> RepoResult<Option<Chapter>>;

    async fn list(&self, include_inactive: bool) -> RepoResult<Vec<Chapter>>;

    async fn create(&self, chapter: &Chapter) -> RepoResult<()>;

    async fn update(&self, chapter: &Chapter) -> RepoResult<()>;
}

// ============================================================================
// Member Repository
// ============================================================================

#[async_trait]
pub trait MemberRepository: Send + Sync {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Member>>;

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Member>>;

    async fn email_exists(&self, email: &str) -> RepoResult<bool>;

    /// Roster page ordered by id, filtered on the cached status
    async fn list_by_chapter(
        &self,
        chapter_id: Snowflake,
        status: Option<MemberStatus>,
        limit: i64,
        after: Option<Snowflake>,
    ) -> RepoResult<Vec<Member>>;

    /// Page through every member, for batch jobs
    async fn list_page(&self, after: Option<Snowflake>, limit: i64) -> RepoResult<Vec<Member>>;

    /// Count a chapter's members by cached status
    async fn count_by_status(
        &self,
        chapter_id: Snowflake,
        statuses: &[MemberStatus],
    ) -> RepoResult<i64>;

    /// Insert the member with its opening status intervals in one transaction
    async fn create(
        &self,
        member: &Member,
        password_hash: Option<&str>,
        initial: &[StatusInterval],
        event: &DomainEvent,
    ) -> RepoResult<()>;

    /// Update profile fields (not status, roles, or chapter)
    async fn update_profile(&self, member: &Member) -> RepoResult<()>;

    async fn get_password_hash(&self, id: Snowflake) -> RepoResult<Option<String>>;

    async fn update_password(&self, id: Snowflake, password_hash: &str) -> RepoResult<()>;

    /// Refresh the cached status and roles if the timeline is still at
    /// `expected_version`. Returns false when a newer write got there first.
    async fn update_current(
        &self,
        id: Snowflake,
        expected_version: i64,
        status: MemberStatus,
        roles: &[String],
    ) -> RepoResult<bool>;
}

// ============================================================================
// Timeline Repository
// ============================================================================

#[async_trait]
pub trait TimelineRepository: Send + Sync {
    /// Load a member's full status and role history with its version
    async fn load(&self, member_id: Snowflake) -> RepoResult<Option<MemberTimeline>>;

    /// Apply every write in one transaction
    async fn apply(&self, writes: &[TimelineWrite]) -> RepoResult<()>;

    async fn list_transitions(&self, member_id: Snowflake) -> RepoResult<Vec<TransitionRecord>>;

    /// Members with at least two status intervals sharing a day
    async fn members_with_overlaps(&self) -> RepoResult<Vec<Snowflake>>;

    /// Status intervals of `status` in the chapter starting inside `span`
    async fn count_status_starts(
        &self,
        chapter_id: Snowflake,
        status: MemberStatus,
        span: DateSpan,
    ) -> RepoResult<i64>;

    /// Members whose pledge started inside `span` and who were later
    /// initiated, i.e. hold an active interval starting after that pledge
    async fn count_initiated_pledges(&self, chapter_id: Snowflake, span: DateSpan) -> RepoResult<i64>;

    /// Chapter members holding one of `statuses` on `day`
    async fn count_status_on(
        &self,
        chapter_id: Snowflake,
        statuses: &[MemberStatus],
        day: NaiveDate,
    ) -> RepoResult<i64>;

    /// Members still pledging on `today` whose pledge began before `cutoff`
    async fn stale_pledges(
        &self,
        chapter_id: Option<Snowflake>,
        cutoff: NaiveDate,
        today: NaiveDate,
    ) -> RepoResult<Vec<StalePledge>>;

    /// Active chapters without any pledge interval starting on or after `since`
    async fn chapters_without_pledges_since(&self, since: NaiveDate) -> RepoResult<Vec<Chapter>>;

    /// Role intervals of a chapter's members that cover `day`
    async fn roles_on(&self, chapter_id: Snowflake, day: NaiveDate) -> RepoResult<Vec<RoleHolder>>;
}

// ============================================================================
// Score Repository
// ============================================================================

#[async_trait]
pub trait ScoreRepository: Send + Sync {
    async fn list_types(&self) -> RepoResult<Vec<ScoreType>>;

    async fn find_type_by_id(&self, id: Snowflake) -> RepoResult<Option<ScoreType>>;

    async fn find_type_by_slug(&self, slug: &str) -> RepoResult<Option<ScoreType>>;

    async fn create_type(&self, score_type: &ScoreType) -> RepoResult<()>;

    async fn create_activity(&self, activity: &Activity) -> RepoResult<()>;

    /// Activities of a chapter dated inside `span`, optionally for one type
    async fn list_activities(
        &self,
        chapter_id: Snowflake,
        score_type_id: Option<Snowflake>,
        span: DateSpan,
    ) -> RepoResult<Vec<Activity>>;

    /// Chapters with activities of a type dated on or after `since`
    async fn chapters_with_activities(
        &self,
        score_type_id: Snowflake,
        since: NaiveDate,
    ) -> RepoResult<Vec<Snowflake>>;

    async fn update_activity_scores(&self, scores: &[(Snowflake, f64)]) -> RepoResult<()>;

    async fn count_activities(
        &self,
        chapter_id: Snowflake,
        kind: ScoreKind,
        span: DateSpan,
    ) -> RepoResult<i64>;

    async fn find_score(
        &self,
        chapter_id: Snowflake,
        score_type_id: Snowflake,
        term: YearTerm,
    ) -> RepoResult<Option<ChapterScore>>;

    /// Insert or replace term totals in one transaction
    async fn upsert_scores(&self, scores: &[ChapterScore]) -> RepoResult<()>;

    async fn list_scores(
        &self,
        chapter_id: Snowflake,
        terms: &[YearTerm],
    ) -> RepoResult<Vec<ChapterScore>>;
}

// ============================================================================
// Audit Repository
// ============================================================================

#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn append(&self, event: &DomainEvent) -> RepoResult<()>;

    /// Most recent events about a member, newest first
    async fn list_for_member(&self, member_id: Snowflake, limit: i64)
        -> RepoResult<Vec<DomainEvent>>;
}
