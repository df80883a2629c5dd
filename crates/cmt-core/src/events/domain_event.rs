//! Domain events - recorded whenever membership or scoring state changes
//!
//! Every event is appended to the audit log in the same transaction as the
//! change it describes. The audit log is the notification trail; nothing is
//! mailed from the domain layer.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{MemberStatus, Snowflake, YearTerm};

/// All possible domain events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DomainEvent {
    // =========================================================================
    // Chapter Events
    // =========================================================================
    ChapterCreated(ChapterEvent),
    ChapterUpdated(ChapterEvent),

    // =========================================================================
    // Member Events
    // =========================================================================
    MemberCreated(MemberCreatedEvent),
    MemberUpdated(MemberEvent),
    MemberTransferred(MemberTransferredEvent),
    PasswordChanged(MemberEvent),

    // =========================================================================
    // Timeline Events
    // =========================================================================
    StatusChanged(StatusChangedEvent),
    TimelineRepaired(TimelineRepairedEvent),
    RoleAssigned(RoleEvent),
    RoleEnded(RoleEvent),

    // =========================================================================
    // Scoring Events
    // =========================================================================
    ActivityRecorded(ActivityRecordedEvent),
    ScoreRecalculated(ScoreRecalculatedEvent),
}

impl DomainEvent {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ChapterCreated(_) => "CHAPTER_CREATED",
            Self::ChapterUpdated(_) => "CHAPTER_UPDATED",
            Self::MemberCreated(_) => "MEMBER_CREATED",
            Self::MemberUpdated(_) => "MEMBER_UPDATED",
            Self::MemberTransferred(_) => "MEMBER_TRANSFERRED",
            Self::PasswordChanged(_) => "PASSWORD_CHANGED",
            Self::StatusChanged(_) => "STATUS_CHANGED",
            Self::TimelineRepaired(_) => "TIMELINE_REPAIRED",
            Self::RoleAssigned(_) => "ROLE_ASSIGNED",
            Self::RoleEnded(_) => "ROLE_ENDED",
            Self::ActivityRecorded(_) => "ACTIVITY_RECORDED",
            Self::ScoreRecalculated(_) => "SCORE_RECALCULATED",
        }
    }

    /// Get the timestamp of the event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::ChapterCreated(e) | Self::ChapterUpdated(e) => e.timestamp,
            Self::MemberCreated(e) => e.timestamp,
            Self::MemberUpdated(e) | Self::PasswordChanged(e) => e.timestamp,
            Self::MemberTransferred(e) => e.timestamp,
            Self::StatusChanged(e) => e.timestamp,
            Self::TimelineRepaired(e) => e.timestamp,
            Self::RoleAssigned(e) | Self::RoleEnded(e) => e.timestamp,
            Self::ActivityRecorded(e) => e.timestamp,
            Self::ScoreRecalculated(e) => e.timestamp,
        }
    }

    /// Member the event is about, for audit lookups
    pub fn member_id(&self) -> Option<Snowflake> {
        match self {
            Self::MemberCreated(e) => Some(e.member_id),
            Self::MemberUpdated(e) | Self::PasswordChanged(e) => Some(e.member_id),
            Self::MemberTransferred(e) => Some(e.member_id),
            Self::StatusChanged(e) => Some(e.member_id),
            Self::TimelineRepaired(e) => Some(e.member_id),
            Self::RoleAssigned(e) | Self::RoleEnded(e) => Some(e.member_id),
            Self::ChapterCreated(_)
            | Self::ChapterUpdated(_)
            | Self::ActivityRecorded(_)
            | Self::ScoreRecalculated(_) => None,
        }
    }

    pub fn chapter_id(&self) -> Option<Snowflake> {
        match self {
            Self::ChapterCreated(e) | Self::ChapterUpdated(e) => Some(e.chapter_id),
            Self::MemberCreated(e) => Some(e.chapter_id),
            Self::MemberUpdated(e) | Self::PasswordChanged(e) => Some(e.chapter_id),
            Self::MemberTransferred(e) => Some(e.to_chapter_id),
            Self::StatusChanged(e) => Some(e.chapter_id),
            Self::TimelineRepaired(e) => Some(e.chapter_id),
            Self::RoleAssigned(e) | Self::RoleEnded(e) => Some(e.chapter_id),
            Self::ActivityRecorded(e) => Some(e.chapter_id),
            Self::ScoreRecalculated(e) => Some(e.chapter_id),
        }
    }

    /// Member who caused the event, `None` for batch jobs
    pub fn actor_id(&self) -> Option<Snowflake> {
        match self {
            Self::ChapterCreated(e) | Self::ChapterUpdated(e) => e.actor_id,
            Self::MemberCreated(e) => e.actor_id,
            Self::MemberUpdated(e) | Self::PasswordChanged(e) => e.actor_id,
            Self::MemberTransferred(e) => e.actor_id,
            Self::StatusChanged(e) => e.actor_id,
            Self::RoleAssigned(e) | Self::RoleEnded(e) => e.actor_id,
            Self::ActivityRecorded(e) => e.actor_id,
            Self::TimelineRepaired(_) | Self::ScoreRecalculated(_) => None,
        }
    }
}

// ============================================================================
// Event Payloads
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterEvent {
    pub chapter_id: Snowflake,
    pub actor_id: Option<Snowflake>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberCreatedEvent {
    pub member_id: Snowflake,
    pub chapter_id: Snowflake,
    pub status: MemberStatus,
    pub actor_id: Option<Snowflake>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberEvent {
    pub member_id: Snowflake,
    pub chapter_id: Snowflake,
    pub actor_id: Option<Snowflake>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberTransferredEvent {
    pub member_id: Snowflake,
    pub from_chapter_id: Snowflake,
    pub to_chapter_id: Snowflake,
    pub effective_date: NaiveDate,
    pub actor_id: Option<Snowflake>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChangedEvent {
    pub member_id: Snowflake,
    pub chapter_id: Snowflake,
    /// Transition kind that caused the change
    pub transition: String,
    pub previous: Option<MemberStatus>,
    pub status: MemberStatus,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub actor_id: Option<Snowflake>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineRepairedEvent {
    pub member_id: Snowflake,
    pub chapter_id: Snowflake,
    pub removed: usize,
    pub adjusted: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleEvent {
    pub member_id: Snowflake,
    pub chapter_id: Snowflake,
    pub role: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub actor_id: Option<Snowflake>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecordedEvent {
    pub activity_id: Snowflake,
    pub chapter_id: Snowflake,
    pub score_type_id: Snowflake,
    pub score: f64,
    pub actor_id: Option<Snowflake>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecalculatedEvent {
    pub chapter_id: Snowflake,
    pub score_type_id: Snowflake,
    pub term: YearTerm,
    pub score: f64,
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Event Creation Helpers
// ============================================================================

impl ChapterEvent {
    pub fn new(chapter_id: Snowflake, actor_id: Option<Snowflake>) -> Self {
        Self {
            chapter_id,
            actor_id,
            timestamp: Utc::now(),
        }
    }
}

impl MemberEvent {
    pub fn new(member_id: Snowflake, chapter_id: Snowflake, actor_id: Option<Snowflake>) -> Self {
        Self {
            member_id,
            chapter_id,
            actor_id,
            timestamp: Utc::now(),
        }
    }
}

impl ScoreRecalculatedEvent {
    pub fn new(chapter_id: Snowflake, score_type_id: Snowflake, term: YearTerm, score: f64) -> Self {
        Self {
            chapter_id,
            score_type_id,
            term,
            score,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::Term;

    #[test]
    fn test_event_serialization() {
        let event = DomainEvent::ScoreRecalculated(ScoreRecalculatedEvent::new(
            Snowflake::new(1),
            Snowflake::new(2),
            YearTerm::new(2024, Term::Fall),
            12.5,
        ));

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "SCORE_RECALCULATED");
        assert_eq!(json["term"]["term"], "fa");

        let parsed: DomainEvent = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_audit_accessors() {
        let event = DomainEvent::PasswordChanged(MemberEvent::new(
            Snowflake::new(7),
            Snowflake::new(3),
            Some(Snowflake::new(7)),
        ));
        assert_eq!(event.event_type(), "PASSWORD_CHANGED");
        assert_eq!(event.member_id(), Some(Snowflake::new(7)));
        assert_eq!(event.chapter_id(), Some(Snowflake::new(3)));
        assert_eq!(event.actor_id(), Some(Snowflake::new(7)));

        let chapter = DomainEvent::ChapterCreated(ChapterEvent::new(Snowflake::new(3), None));
        assert_eq!(chapter.member_id(), None);
    }
}
