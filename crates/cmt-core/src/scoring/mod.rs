//! Chapter scoring
//!
//! Activities earn points through their score type's formula. Term totals
//! are capped per term and per school year (see [`cap_school_year`]).

mod biennium;
mod formula;
mod special;

pub use biennium::{cap_school_year, clamp_term, CappedScores};
pub use formula::{round_to, Bindings, Formula, Variable};
pub use special::{
    compute as compute_special, membership, pledge_ratio, report_review, ChapterTermStats,
    MEMBERSHIP_MAX, PLEDGE_RATIO_MAX, REPORT_REVIEW_POINTS,
};

use crate::entities::{ActivityCounts, ScoreKind, ScoreType};
use crate::error::DomainError;

/// Variable bindings for scoring one activity
#[derive(Debug, Clone, Copy)]
pub struct ActivityBindings<'a> {
    pub score_type: &'a ScoreType,
    pub counts: ActivityCounts,
    /// Chapter members counted as active on the activity date
    pub chapter_actives: i64,
}

impl Bindings for ActivityBindings<'_> {
    fn value(&self, var: Variable) -> f64 {
        let st = self.score_type;
        match var {
            Variable::Members => f64::from(self.counts.members),
            Variable::Alumni => f64::from(self.counts.alumni),
            Variable::Guests => f64::from(self.counts.guests),
            Variable::Stem => f64::from(self.counts.stem),
            Variable::Hours => self.counts.hours,
            Variable::Miles => self.counts.miles,
            Variable::Attendance if self.chapter_actives > 0 => {
                f64::from(self.counts.members) / self.chapter_actives as f64
            }
            Variable::Attendance => 0.0,
            Variable::Base => st.base_points,
            Variable::AttendanceMultiplier => st.attendance_multiplier,
            Variable::MemberAdd => st.member_add,
            Variable::StemAdd => st.stem_add,
            Variable::AlumniAdd => st.alumni_add,
            Variable::GuestAdd => st.guest_add,
        }
    }
}

/// Points one activity earns, rounded to cents and never negative.
///
/// Submissions ignore attendance. Special types are computed in batch and
/// cannot be reported directly.
pub fn score_activity(
    score_type: &ScoreType,
    counts: &ActivityCounts,
    chapter_actives: i64,
) -> Result<f64, DomainError> {
    let counts = match score_type.kind {
        ScoreKind::Event => *counts,
        ScoreKind::Submission => ActivityCounts::default(),
        ScoreKind::Special => {
            return Err(DomainError::ValidationError(format!(
                "{} is computed automatically and cannot be reported",
                score_type.slug
            )))
        }
    };

    let formula = Formula::parse(&score_type.formula)?;
    let raw = formula.evaluate(&ActivityBindings {
        score_type,
        counts,
        chapter_actives,
    })?;
    Ok(round_to(raw, 2).max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Section;
    use crate::value_objects::Snowflake;

    fn service_event() -> ScoreType {
        let mut st = ScoreType::new(
            Snowflake::new(1),
            "service-hours".into(),
            "Service Hours".into(),
            Section::Service,
            ScoreKind::Event,
            80.0,
            40.0,
        );
        st.base_points = 1.0;
        st.attendance_multiplier = 4.0;
        st.guest_add = 0.5;
        st
    }

    #[test]
    fn test_default_formula_uses_attendance_ratio() {
        let counts = ActivityCounts {
            members: 15,
            guests: 4,
            ..Default::default()
        };
        // 1 + 4 * (15 / 20) + 0.5 * 4
        assert_eq!(score_activity(&service_event(), &counts, 20).unwrap(), 6.0);
        // no actives means attendance contributes nothing
        assert_eq!(score_activity(&service_event(), &counts, 0).unwrap(), 3.0);
    }

    #[test]
    fn test_custom_formula() {
        let mut st = service_event();
        st.formula = "min(HOURS * MEMBERS / 10, 12)".into();
        let counts = ActivityCounts {
            members: 8,
            hours: 3.0,
            ..Default::default()
        };
        assert_eq!(score_activity(&st, &counts, 20).unwrap(), 2.4);
    }

    #[test]
    fn test_submission_scores_flat() {
        let mut st = service_event();
        st.kind = ScoreKind::Submission;
        st.base_points = 5.0;
        let counts = ActivityCounts {
            members: 40,
            ..Default::default()
        };
        assert_eq!(score_activity(&st, &counts, 20).unwrap(), 5.0);
    }

    #[test]
    fn test_negative_results_floor_at_zero() {
        let mut st = service_event();
        st.formula = "BASE - 10".into();
        assert_eq!(score_activity(&st, &ActivityCounts::default(), 1).unwrap(), 0.0);
    }

    #[test]
    fn test_special_types_cannot_be_reported() {
        let mut st = service_event();
        st.kind = ScoreKind::Special;
        assert!(score_activity(&st, &ActivityCounts::default(), 1).is_err());
    }
}
