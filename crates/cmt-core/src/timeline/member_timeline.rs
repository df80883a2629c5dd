//! A member's full status and role history

use chrono::{Days, NaiveDate};
use std::collections::BTreeSet;

use crate::entities::{RoleInterval, StatusInterval};
use crate::error::DomainError;
use crate::value_objects::{day_before, normalize_role, DateSpan, MemberStatus, Snowflake};

use super::paint::{paint, Interval, TimelinePlan};

/// Status reported when a member has no status history at all
pub const FALLBACK_STATUS: MemberStatus = MemberStatus::Alumni;

/// Tunables for timeline rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelinePolicy {
    /// Length of the pledge period fabricated for members initiated with no history
    pub synthetic_pledge_days: u64,
    /// Fixed role term length overriding the default of one calendar year
    pub role_term_days: Option<u64>,
}

impl Default for TimelinePolicy {
    fn default() -> Self {
        Self {
            synthetic_pledge_days: 120,
            role_term_days: None,
        }
    }
}

impl TimelinePolicy {
    /// Default span of a role assumed on `start`
    pub fn role_span(&self, start: NaiveDate) -> DateSpan {
        match self.role_term_days {
            Some(days) => DateSpan::for_days(start, days),
            None => DateSpan::for_months(start, 12),
        }
    }

    /// Pledge period ending the day before `initiated_on`
    pub fn synthetic_pledge_span(&self, initiated_on: NaiveDate) -> DateSpan {
        let start = initiated_on
            .checked_sub_days(Days::new(self.synthetic_pledge_days))
            .unwrap_or(initiated_on);
        DateSpan {
            start,
            end: day_before(initiated_on).max(start),
        }
    }
}

/// A resolved status effect, ready to be painted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub status: MemberStatus,
    pub span: DateSpan,
    /// Pledge period to fabricate ahead of the change
    pub synthetic_pledge: Option<DateSpan>,
}

impl StatusChange {
    pub fn new(status: MemberStatus, span: DateSpan) -> Self {
        Self {
            status,
            span,
            synthetic_pledge: None,
        }
    }
}

/// Status and role intervals of one member, sorted by start date.
///
/// Every mutation is computed as a [`TimelinePlan`] first. Nothing here
/// touches storage.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberTimeline {
    pub member_id: Snowflake,
    /// Optimistic lock value read with the rows
    pub version: i64,
    pub statuses: Vec<StatusInterval>,
    pub roles: Vec<RoleInterval>,
}

impl MemberTimeline {
    pub fn new(
        member_id: Snowflake,
        version: i64,
        mut statuses: Vec<StatusInterval>,
        mut roles: Vec<RoleInterval>,
    ) -> Self {
        statuses.sort_by_key(|s| (s.span.start, s.id));
        roles.sort_by_key(|r| (r.span.start, r.id));
        Self {
            member_id,
            version,
            statuses,
            roles,
        }
    }

    pub fn empty(member_id: Snowflake) -> Self {
        Self::new(member_id, 0, Vec::new(), Vec::new())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Interval covering `day`. With corrupt overlapping rows the latest
    /// start wins.
    pub fn interval_on(&self, day: NaiveDate) -> Option<&StatusInterval> {
        self.statuses
            .iter()
            .filter(|s| s.span.contains(day))
            .max_by_key(|s| (s.span.start, s.id))
    }

    pub fn status_on(&self, day: NaiveDate) -> Option<MemberStatus> {
        self.interval_on(day).map(|s| s.status)
    }

    /// Status to cache on the member row: the one covering `today`, else the
    /// most recently started one, else [`FALLBACK_STATUS`].
    pub fn current_status(&self, today: NaiveDate) -> MemberStatus {
        self.status_on(today)
            .or_else(|| {
                self.statuses
                    .iter()
                    .max_by_key(|s| (s.span.start, s.id))
                    .map(|s| s.status)
            })
            .unwrap_or(FALLBACK_STATUS)
    }

    /// Distinct role names held on `today`, sorted
    pub fn current_roles(&self, today: NaiveDate) -> Vec<String> {
        self.roles
            .iter()
            .filter(|r| r.span.contains(today))
            .map(|r| r.role.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn has_exact_status(&self, status: MemberStatus, span: DateSpan) -> bool {
        self.statuses
            .iter()
            .any(|s| s.status == status && s.span == span)
    }

    /// First day covered by two status intervals, if any
    pub fn first_overlap(&self) -> Option<NaiveDate> {
        let mut covered_until: Option<NaiveDate> = None;
        for interval in &self.statuses {
            if let Some(until) = covered_until {
                if interval.span.start <= until {
                    return Some(interval.span.start);
                }
            }
            covered_until = Some(covered_until.map_or(interval.span.end, |u| u.max(interval.span.end)));
        }
        None
    }

    pub fn ensure_disjoint(&self) -> Result<(), DomainError> {
        match self.first_overlap() {
            Some(day) => Err(DomainError::OverlappingStatus {
                member_id: self.member_id,
                day,
            }),
            None => Ok(()),
        }
    }

    // =========================================================================
    // Planning
    // =========================================================================

    /// Paint a status change over the whole status history
    pub fn plan_status<F>(&self, change: &StatusChange, next_id: &mut F) -> TimelinePlan<StatusInterval>
    where
        F: FnMut() -> Snowflake,
    {
        let new = StatusInterval::new(next_id(), self.member_id, change.status, change.span);
        let mut plan = paint(&self.statuses, new, next_id);

        if let Some(pledge) = change.synthetic_pledge {
            if !plan.is_empty() {
                let synthetic = StatusInterval::new(next_id(), self.member_id, MemberStatus::Pnm, pledge);
                plan.extend(paint(&[], synthetic, next_id));
            }
        }
        plan
    }

    /// Paint a role interval over earlier terms of the same role only
    pub fn plan_role<F>(&self, role: &str, span: DateSpan, next_id: &mut F) -> TimelinePlan<RoleInterval>
    where
        F: FnMut() -> Snowflake,
    {
        let role = normalize_role(role);
        let same_role: Vec<RoleInterval> = self
            .roles
            .iter()
            .filter(|r| r.role == role)
            .cloned()
            .collect();
        let new = RoleInterval::new(next_id(), self.member_id, role, span);
        paint(&same_role, new, next_id)
    }

    /// Close a role interval so that its last day is `last_day`.
    ///
    /// A term that has not started by then is removed outright, one that
    /// already ended is left alone.
    pub fn plan_end_role(
        &self,
        interval_id: Snowflake,
        last_day: NaiveDate,
    ) -> Result<TimelinePlan<RoleInterval>, DomainError> {
        let interval = self
            .roles
            .iter()
            .find(|r| r.id == interval_id)
            .ok_or(DomainError::IntervalNotFound(interval_id))?;

        let mut plan = TimelinePlan::default();
        if interval.span.start > last_day {
            plan.deletes.push(interval.id);
        } else if interval.span.end > last_day {
            let span = DateSpan {
                start: interval.span.start,
                end: last_day,
            };
            plan.updates.push(interval.respan(interval.id, span));
        }
        Ok(plan)
    }

    /// End every interval of `role` that is still running on `day`
    pub fn plan_vacate_role(&self, role: &str, day: NaiveDate) -> TimelinePlan<RoleInterval> {
        let role = normalize_role(role);
        let last_day = day_before(day);
        let mut plan = TimelinePlan::default();
        for interval in self.roles.iter().filter(|r| r.role == role && r.span.end >= day) {
            if interval.span.start > last_day {
                plan.deletes.push(interval.id);
            } else {
                let span = DateSpan {
                    start: interval.span.start,
                    end: last_day,
                };
                plan.updates.push(interval.respan(interval.id, span));
            }
        }
        plan
    }

    /// Resolve pre-existing status overlaps.
    ///
    /// Overlapping intervals with the same status merge into one spanning
    /// both. Otherwise the later start wins and the earlier interval is cut
    /// back to the day before, or removed if nothing of it remains.
    pub fn plan_repair(&self) -> TimelinePlan<StatusInterval> {
        let mut ordered = self.statuses.clone();
        ordered.sort_by_key(|s| (s.span.start, s.created_at, s.id));

        let mut kept: Vec<StatusInterval> = Vec::with_capacity(ordered.len());
        let mut plan = TimelinePlan::default();

        for interval in ordered {
            let Some(last) = kept.last_mut() else {
                kept.push(interval);
                continue;
            };
            if !last.span.overlaps(&interval.span) {
                kept.push(interval);
                continue;
            }

            if last.status == interval.status {
                last.span.end = last.span.end.max(interval.span.end);
                plan.deletes.push(interval.id);
            } else if last.span.start >= interval.span.start {
                plan.deletes.push(last.id);
                kept.pop();
                kept.push(interval);
            } else {
                last.span.end = day_before(interval.span.start);
                kept.push(interval);
            }
        }

        for interval in kept {
            let original = self.statuses.iter().find(|s| s.id == interval.id);
            if original.is_some_and(|o| o.span != interval.span) {
                plan.updates.push(interval);
            }
        }
        plan
    }

    // =========================================================================
    // In-memory application
    // =========================================================================

    pub fn apply_status_plan(&mut self, plan: &TimelinePlan<StatusInterval>) {
        plan.apply_to(&mut self.statuses);
    }

    pub fn apply_role_plan(&mut self, plan: &TimelinePlan<RoleInterval>) {
        plan.apply_to(&mut self.roles);
    }
}
