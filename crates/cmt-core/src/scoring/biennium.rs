//! Term and school-year caps

use crate::value_objects::Term;

use super::formula::round_to;

/// Scores of the two terms of one school year after capping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CappedScores {
    /// Term being recalculated
    pub current: f64,
    /// Recorded score of the other term in the same school year
    pub other: f64,
}

/// Cap a raw term total at `term_points`, never below zero
pub fn clamp_term(raw: f64, term_points: f64) -> f64 {
    round_to(raw.min(term_points).max(0.0), 2)
}

/// Apply the term cap to `raw_current` and the year cap to the pair.
///
/// When the pair exceeds `points`, a fall recalculation gives up the excess
/// from the current term. A spring recalculation takes it from the fall
/// score already on record, which keeps the newer spring activity.
pub fn cap_school_year(
    term: Term,
    raw_current: f64,
    recorded_other: f64,
    term_points: f64,
    points: f64,
) -> CappedScores {
    let mut current = clamp_term(raw_current, term_points);
    let mut other = clamp_term(recorded_other, term_points);
    let points = points.max(0.0);

    let overflow = current + other - points;
    if overflow > 0.0 {
        match term {
            Term::Fall => {
                current = (current - overflow).max(0.0);
                other = other.min(points);
            }
            Term::Spring => {
                other = (other - overflow).max(0.0);
                current = current.min(points);
            }
        }
    }

    CappedScores {
        current: round_to(current, 2),
        other: round_to(other, 2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_cap() {
        assert_eq!(clamp_term(37.5, 30.0), 30.0);
        assert_eq!(clamp_term(-4.0, 30.0), 0.0);
        assert_eq!(clamp_term(12.346, 30.0), 12.35);
    }

    #[test]
    fn test_under_year_cap_is_untouched() {
        let capped = cap_school_year(Term::Fall, 20.0, 15.0, 30.0, 40.0);
        assert_eq!(capped, CappedScores { current: 20.0, other: 15.0 });
    }

    #[test]
    fn test_fall_absorbs_overflow() {
        let capped = cap_school_year(Term::Fall, 30.0, 25.0, 30.0, 40.0);
        assert_eq!(capped, CappedScores { current: 15.0, other: 25.0 });
    }

    #[test]
    fn test_spring_takes_overflow_from_fall() {
        let capped = cap_school_year(Term::Spring, 30.0, 25.0, 30.0, 40.0);
        assert_eq!(capped, CappedScores { current: 30.0, other: 10.0 });
    }

    #[test]
    fn test_caps_hold_for_a_sweep_of_inputs() {
        let (term_points, points) = (25.0, 40.0);
        for raw in [0.0, 5.0, 19.5, 25.0, 60.0] {
            for other in [0.0, 10.0, 25.0, 70.0] {
                for term in [Term::Fall, Term::Spring] {
                    let c = cap_school_year(term, raw, other, term_points, points);
                    assert!(c.current <= term_points && c.other <= term_points);
                    assert!(c.current + c.other <= points + 1e-9);
                    assert!(c.current >= 0.0 && c.other >= 0.0);
                }
            }
        }
    }
}
