//! Batch-computed scores that do not come from reported activities

use crate::entities::SpecialScore;

use super::formula::round_to;

pub const PLEDGE_RATIO_MAX: f64 = 10.0;
pub const MEMBERSHIP_MAX: f64 = 25.0;
pub const REPORT_REVIEW_POINTS: f64 = 10.0;
pub const PLEDGE_PROGRAM_POINTS: f64 = 10.0;

/// Term figures a chapter's special scores are computed from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChapterTermStats {
    /// Members who started pledging in the term
    pub pledged: i64,
    /// Members initiated in the term
    pub initiated: i64,
    /// Members who graduated in the term
    pub graduated: i64,
    /// Active members on the last day of the term
    pub actives: i64,
    /// Events reported in the term
    pub events: i64,
}

/// Share of pledges who were initiated, scaled to 10
pub fn pledge_ratio(stats: &ChapterTermStats) -> f64 {
    let ratio = 10.0 * stats.initiated as f64 / stats.pledged.max(1) as f64;
    round_to(ratio, 2).min(PLEDGE_RATIO_MAX)
}

/// Growth relative to graduation losses, scaled by chapter size
pub fn membership(stats: &ChapterTermStats) -> f64 {
    let growth =
        stats.actives as f64 * stats.initiated as f64 / (stats.graduated.max(1) as f64 * 2.0);
    round_to(growth, 2).min(MEMBERSHIP_MAX)
}

/// Flat award for chapters that report more than one event
pub fn report_review(stats: &ChapterTermStats) -> f64 {
    if stats.events > 1 {
        REPORT_REVIEW_POINTS
    } else {
        0.0
    }
}

pub fn compute(kind: SpecialScore, stats: &ChapterTermStats) -> f64 {
    match kind {
        SpecialScore::PledgeRatio => pledge_ratio(stats),
        SpecialScore::Membership => membership(stats),
        SpecialScore::ReportReview => report_review(stats),
        // Every chapter runs the unmodified program
        SpecialScore::PledgeProgram => PLEDGE_PROGRAM_POINTS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pledge_ratio() {
        let stats = ChapterTermStats {
            pledged: 9,
            initiated: 6,
            ..Default::default()
        };
        assert_eq!(pledge_ratio(&stats), 6.67);

        let none_pledged = ChapterTermStats {
            initiated: 3,
            ..Default::default()
        };
        assert_eq!(pledge_ratio(&none_pledged), PLEDGE_RATIO_MAX);
    }

    #[test]
    fn test_membership_is_capped() {
        let stats = ChapterTermStats {
            initiated: 8,
            graduated: 4,
            actives: 30,
            ..Default::default()
        };
        assert_eq!(membership(&stats), 25.0);

        let small = ChapterTermStats {
            initiated: 2,
            graduated: 5,
            actives: 20,
            ..Default::default()
        };
        assert_eq!(membership(&small), 4.0);
    }

    #[test]
    fn test_report_review_needs_two_events() {
        let mut stats = ChapterTermStats {
            events: 1,
            ..Default::default()
        };
        assert_eq!(compute(SpecialScore::ReportReview, &stats), 0.0);
        stats.events = 2;
        assert_eq!(compute(SpecialScore::ReportReview, &stats), 10.0);
    }

    #[test]
    fn test_pledge_program_is_flat() {
        assert_eq!(
            compute(SpecialScore::PledgeProgram, &ChapterTermStats::default()),
            PLEDGE_PROGRAM_POINTS
        );
        assert_eq!("pledge_program".parse::<SpecialScore>().unwrap(), SpecialScore::PledgeProgram);
    }
}
