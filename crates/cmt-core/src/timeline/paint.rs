//! Interval painting
//!
//! A new interval is painted over existing ones of the same kind. Whatever it
//! covers is removed, whatever sticks out on either side is kept. The result
//! is expressed as a plan of row-level edits so the storage layer can apply it
//! inside one transaction.

use crate::value_objects::{day_after, day_before, DateSpan, Snowflake};

/// A date-ranged row that can be painted over
pub trait Interval: Clone {
    fn id(&self) -> Snowflake;

    fn span(&self) -> DateSpan;

    /// Copy of `self` with a different id and span
    fn respan(&self, id: Snowflake, span: DateSpan) -> Self;

    /// Same status, or same role name
    fn same_value(&self, other: &Self) -> bool;
}

/// Row-level edits that turn one timeline into another
#[derive(Debug, Clone, PartialEq)]
pub struct TimelinePlan<I> {
    pub inserts: Vec<I>,
    /// Existing rows with a new span, keyed by their unchanged id
    pub updates: Vec<I>,
    pub deletes: Vec<Snowflake>,
}

impl<I> Default for TimelinePlan<I> {
    fn default() -> Self {
        Self {
            inserts: Vec::new(),
            updates: Vec::new(),
            deletes: Vec::new(),
        }
    }
}

impl<I> TimelinePlan<I> {
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }

    pub fn extend(&mut self, other: TimelinePlan<I>) {
        self.inserts.extend(other.inserts);
        self.updates.extend(other.updates);
        self.deletes.extend(other.deletes);
    }
}

impl<I: Interval> TimelinePlan<I> {
    /// Apply the plan to an in-memory copy of the rows
    pub fn apply_to(&self, rows: &mut Vec<I>) {
        rows.retain(|row| !self.deletes.contains(&row.id()));
        for updated in &self.updates {
            if let Some(row) = rows.iter_mut().find(|row| row.id() == updated.id()) {
                *row = updated.clone();
            }
        }
        rows.extend(self.inserts.iter().cloned());
        rows.sort_by_key(|row| (row.span().start, row.id()));
    }

    /// Fold in a plan that was computed against the result of `self`, so
    /// both apply as one set of edits against the original rows.
    pub fn merge(&mut self, later: TimelinePlan<I>) {
        for id in later.deletes {
            if let Some(pos) = self.inserts.iter().position(|row| row.id() == id) {
                self.inserts.remove(pos);
            } else {
                self.updates.retain(|row| row.id() != id);
                self.deletes.push(id);
            }
        }
        for updated in later.updates {
            let slot = self
                .inserts
                .iter_mut()
                .chain(self.updates.iter_mut())
                .find(|row| row.id() == updated.id());
            match slot {
                Some(row) => *row = updated,
                None => self.updates.push(updated),
            }
        }
        self.inserts.extend(later.inserts);
    }
}

/// Paint `new` over `existing`.
///
/// Every row in `existing` is considered, so callers scope the slice first
/// (all statuses of a member, or one role of a member). Painting an interval
/// that is already present verbatim, with nothing else overlapping it,
/// yields an empty plan.
pub fn paint<I, F>(existing: &[I], new: I, next_id: &mut F) -> TimelinePlan<I>
where
    I: Interval,
    F: FnMut() -> Snowflake,
{
    let target = new.span();
    let overlapping: Vec<&I> = existing
        .iter()
        .filter(|row| row.span().overlaps(&target))
        .collect();

    if let [only] = overlapping.as_slice() {
        if only.span() == target && only.same_value(&new) {
            return TimelinePlan::default();
        }
    }

    let mut plan = TimelinePlan::default();
    for row in overlapping {
        let span = row.span();
        let head = (span.start < target.start).then(|| DateSpan {
            start: span.start,
            end: day_before(target.start),
        });
        let tail = (span.end > target.end).then(|| DateSpan {
            start: day_after(target.end),
            end: span.end,
        });

        match (head, tail) {
            (None, None) => plan.deletes.push(row.id()),
            (Some(head), None) => plan.updates.push(row.respan(row.id(), head)),
            (None, Some(tail)) => plan.updates.push(row.respan(row.id(), tail)),
            (Some(head), Some(tail)) => {
                plan.updates.push(row.respan(row.id(), head));
                plan.inserts.push(row.respan(next_id(), tail));
            }
        }
    }
    plan.inserts.push(new);
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: Snowflake,
        tag: char,
        span: DateSpan,
    }

    impl Interval for Row {
        fn id(&self) -> Snowflake {
            self.id
        }
        fn span(&self) -> DateSpan {
            self.span
        }
        fn respan(&self, id: Snowflake, span: DateSpan) -> Self {
            Row {
                id,
                tag: self.tag,
                span,
            }
        }
        fn same_value(&self, other: &Self) -> bool {
            self.tag == other.tag
        }
    }

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    fn row(id: i64, tag: char, start: NaiveDate, end: NaiveDate) -> Row {
        Row {
            id: Snowflake::new(id),
            tag,
            span: DateSpan::new(start, end).unwrap(),
        }
    }

    fn ids() -> impl FnMut() -> Snowflake {
        let mut next = 100;
        move || {
            next += 1;
            Snowflake::new(next)
        }
    }

    #[test]
    fn test_open_row_is_capped_at_day_before() {
        let existing = vec![Row {
            id: Snowflake::new(1),
            tag: 'a',
            span: DateSpan::open(d(1, 1)),
        }];
        let new = Row {
            id: Snowflake::new(2),
            tag: 'b',
            span: DateSpan::open(d(3, 1)),
        };

        let plan = paint(&existing, new.clone(), &mut ids());
        assert_eq!(plan.updates, vec![row(1, 'a', d(1, 1), d(2, 29))]);
        assert!(plan.deletes.is_empty());
        assert_eq!(plan.inserts, vec![new]);
    }

    #[test]
    fn test_covered_rows_are_deleted() {
        let existing = vec![row(1, 'a', d(3, 5), d(3, 10)), row(2, 'b', d(3, 11), d(3, 20))];
        let new = row(3, 'c', d(3, 1), d(3, 31));
        let plan = paint(&existing, new, &mut ids());
        assert_eq!(plan.deletes, vec![Snowflake::new(1), Snowflake::new(2)]);
        assert!(plan.updates.is_empty());
    }

    #[test]
    fn test_enclosing_row_is_split_and_resumes() {
        let existing = vec![Row {
            id: Snowflake::new(1),
            tag: 'a',
            span: DateSpan::open(d(1, 1)),
        }];
        let new = row(2, 'w', d(5, 1), d(5, 31));
        let plan = paint(&existing, new, &mut ids());

        assert_eq!(plan.updates, vec![row(1, 'a', d(1, 1), d(4, 30))]);
        assert_eq!(plan.inserts.len(), 2);
        let resumed = &plan.inserts[0];
        assert_eq!(resumed.tag, 'a');
        assert_eq!(resumed.id, Snowflake::new(101));
        assert_eq!(resumed.span.start, d(6, 1));
        assert!(resumed.span.is_open_ended());
    }

    #[test]
    fn test_row_starting_inside_new_span_is_pushed_back() {
        let existing = vec![row(1, 'a', d(2, 10), d(2, 20))];
        let new = row(2, 'b', d(2, 1), d(2, 14));
        let plan = paint(&existing, new, &mut ids());
        assert_eq!(plan.updates, vec![row(1, 'a', d(2, 15), d(2, 20))]);
    }

    #[test]
    fn test_exact_repaint_is_noop() {
        let existing = vec![row(1, 'a', d(1, 1), d(1, 31))];
        let plan = paint(&existing, row(9, 'a', d(1, 1), d(1, 31)), &mut ids());
        assert!(plan.is_empty());
    }

    #[test]
    fn test_exact_span_with_other_value_replaces() {
        let existing = vec![row(1, 'a', d(1, 1), d(1, 31))];
        let plan = paint(&existing, row(9, 'b', d(1, 1), d(1, 31)), &mut ids());
        assert_eq!(plan.deletes, vec![Snowflake::new(1)]);
        assert_eq!(plan.inserts.len(), 1);
    }

    #[test]
    fn test_merge_matches_sequential_application() {
        let original = vec![row(1, 'a', d(1, 1), d(6, 30)), row(2, 'b', d(7, 1), d(12, 31))];

        let mut ids = ids();
        let first = paint(&original, row(3, 'c', d(3, 1), d(3, 31)), &mut ids);
        let mut step = original.clone();
        first.apply_to(&mut step);
        let second = paint(&step, row(4, 'd', d(3, 10), d(7, 10)), &mut ids);

        let mut sequential = step.clone();
        second.apply_to(&mut sequential);

        let mut merged = first;
        merged.merge(second);
        let mut combined = original;
        merged.apply_to(&mut combined);

        assert_eq!(combined, sequential);
        assert!(merged.updates.iter().all(|r| !merged.deletes.contains(&r.id)));
    }

    #[test]
    fn test_apply_to_produces_disjoint_rows() {
        let mut rows = vec![
            row(1, 'a', d(1, 1), d(3, 31)),
            row(2, 'b', d(4, 1), d(6, 30)),
            row(3, 'c', d(7, 1), d(12, 31)),
        ];
        let plan = paint(&rows, row(4, 'z', d(3, 15), d(7, 15)), &mut ids());
        plan.apply_to(&mut rows);

        let tags: Vec<char> = rows.iter().map(|r| r.tag).collect();
        assert_eq!(tags, vec!['a', 'z', 'c']);
        for pair in rows.windows(2) {
            assert_eq!(day_after(pair[0].span.end), pair[1].span.start);
        }
    }
}
