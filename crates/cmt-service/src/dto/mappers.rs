//! Entity to DTO mappers
//!
//! Implements `From` conversions from domain entities to response DTOs.

use chrono::NaiveDate;
use cmt_core::entities::{
    Activity, Chapter, ChapterScore, Member, RoleInterval, ScoreType, StatusInterval,
    TransitionRecord,
};
use cmt_core::traits::RoleHolder;
use cmt_core::{DateSpan, DomainEvent, MemberTimeline};

use super::responses::{
    ActivityResponse, AuditEntryResponse, ChapterResponse, MemberResponse, OfficerResponse,
    RoleHistoryResponse, RoleIntervalResponse, ScoreEntryResponse, ScoreTypeResponse,
    StatusHistoryResponse, StatusIntervalResponse, TransitionResponse,
};

/// Interval end as exposed over the API
fn visible_end(span: DateSpan) -> Option<NaiveDate> {
    (!span.is_open_ended()).then_some(span.end)
}

// ============================================================================
// Chapter Mappers
// ============================================================================

impl From<&Chapter> for ChapterResponse {
    fn from(chapter: &Chapter) -> Self {
        Self {
            id: chapter.id.to_string(),
            name: chapter.name.clone(),
            slug: chapter.slug.clone(),
            school: chapter.school.clone(),
            region: chapter.region.clone(),
            active: chapter.active,
            created_at: chapter.created_at,
        }
    }
}

impl From<&RoleHolder> for OfficerResponse {
    fn from(holder: &RoleHolder) -> Self {
        Self {
            interval_id: holder.interval.id.to_string(),
            member_id: holder.interval.member_id.to_string(),
            name: holder.name.clone(),
            role: holder.interval.role.clone(),
            start: holder.interval.span.start,
            end: visible_end(holder.interval.span),
        }
    }
}

// ============================================================================
// Member Mappers
// ============================================================================

impl From<&Member> for MemberResponse {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id.to_string(),
            chapter_id: member.chapter_id.to_string(),
            email: member.email.clone(),
            first_name: member.first_name.clone(),
            last_name: member.last_name.clone(),
            badge_number: member.badge_number,
            graduation_year: member.graduation_year,
            phone: member.phone.clone(),
            status: member.current_status.to_string(),
            roles: member.current_roles.clone(),
            created_at: member.created_at,
            updated_at: member.updated_at,
        }
    }
}

impl From<Member> for MemberResponse {
    fn from(member: Member) -> Self {
        Self::from(&member)
    }
}

// ============================================================================
// Timeline Mappers
// ============================================================================

impl From<&StatusInterval> for StatusIntervalResponse {
    fn from(interval: &StatusInterval) -> Self {
        Self {
            id: interval.id.to_string(),
            status: interval.status.to_string(),
            start: interval.span.start,
            end: visible_end(interval.span),
        }
    }
}

impl From<&RoleInterval> for RoleIntervalResponse {
    fn from(interval: &RoleInterval) -> Self {
        Self {
            id: interval.id.to_string(),
            role: interval.role.clone(),
            start: interval.span.start,
            end: visible_end(interval.span),
        }
    }
}

impl StatusHistoryResponse {
    pub fn new(timeline: &MemberTimeline, today: NaiveDate) -> Self {
        Self {
            member_id: timeline.member_id.to_string(),
            current_status: timeline.current_status(today).to_string(),
            version: timeline.version,
            intervals: timeline.statuses.iter().map(StatusIntervalResponse::from).collect(),
        }
    }
}

impl RoleHistoryResponse {
    pub fn new(timeline: &MemberTimeline, today: NaiveDate) -> Self {
        Self {
            member_id: timeline.member_id.to_string(),
            current_roles: timeline.current_roles(today),
            intervals: timeline.roles.iter().map(RoleIntervalResponse::from).collect(),
        }
    }
}

impl From<&TransitionRecord> for TransitionResponse {
    fn from(record: &TransitionRecord) -> Self {
        Self {
            id: record.id.to_string(),
            kind: record.kind().to_string(),
            effective_date: record.effective_date,
            submitted_by: record.submitted_by.map(|id| id.to_string()),
            payload: serde_json::to_value(&record.transition).unwrap_or_default(),
            created_at: record.created_at,
        }
    }
}

impl From<&DomainEvent> for AuditEntryResponse {
    fn from(event: &DomainEvent) -> Self {
        Self {
            event_type: event.event_type().to_string(),
            timestamp: event.timestamp(),
            payload: serde_json::to_value(event).unwrap_or_default(),
        }
    }
}

// ============================================================================
// Scoring Mappers
// ============================================================================

impl From<&ScoreType> for ScoreTypeResponse {
    fn from(score_type: &ScoreType) -> Self {
        Self {
            id: score_type.id.to_string(),
            slug: score_type.slug.clone(),
            name: score_type.name.clone(),
            description: score_type.description.clone(),
            section: score_type.section.to_string(),
            kind: score_type.kind.to_string(),
            points: score_type.points,
            term_points: score_type.term_points,
            formula: score_type.formula.clone(),
            special: score_type.special.map(|s| s.to_string()),
        }
    }
}

impl ActivityResponse {
    pub fn new(activity: &Activity, term_total: f64) -> Self {
        Self {
            id: activity.id.to_string(),
            chapter_id: activity.chapter_id.to_string(),
            score_type_id: activity.score_type_id.to_string(),
            kind: activity.kind.to_string(),
            name: activity.name.clone(),
            date: activity.date,
            term: activity.term().to_string(),
            score: activity.score,
            term_total,
        }
    }
}

impl ScoreEntryResponse {
    pub fn new(score: &ChapterScore, score_type: &ScoreType) -> Self {
        Self {
            score_type_id: score.score_type_id.to_string(),
            slug: score_type.slug.clone(),
            name: score_type.name.clone(),
            section: score_type.section.to_string(),
            term: score.term.to_string(),
            score: score.score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmt_core::{MemberStatus, Snowflake, Transition};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_open_interval_has_null_end() {
        let open = StatusInterval::new(
            Snowflake::new(1),
            Snowflake::new(2),
            MemberStatus::Active,
            DateSpan::open(d(2024, 1, 1)),
        );
        let json = serde_json::to_value(StatusIntervalResponse::from(&open)).unwrap();
        assert_eq!(json["status"], "active");
        assert!(json["end"].is_null());

        let closed = StatusInterval::new(
            Snowflake::new(3),
            Snowflake::new(2),
            MemberStatus::Pnm,
            DateSpan::new(d(2023, 9, 1), d(2023, 12, 31)).unwrap(),
        );
        assert_eq!(StatusIntervalResponse::from(&closed).end, Some(d(2023, 12, 31)));
    }

    #[test]
    fn test_transition_payload_keeps_kind_tag() {
        let record = TransitionRecord::new(
            Snowflake::new(9),
            Snowflake::new(2),
            Transition::Graduation,
            d(2025, 5, 10),
            None,
        );
        let response = TransitionResponse::from(&record);
        assert_eq!(response.kind, "graduation");
        assert_eq!(response.payload["kind"], "graduation");
        assert!(response.submitted_by.is_none());
    }
}
