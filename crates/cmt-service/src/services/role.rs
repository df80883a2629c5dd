//! Role service
//!
//! Role intervals follow the same paint rule as statuses, but only terms of
//! the same role interact. Elections hand a role over from its current
//! holders to the elected member in one write.

use std::collections::BTreeMap;

use chrono::Utc;
use cmt_core::entities::RoleInterval;
use cmt_core::events::{DomainEvent, RoleEvent};
use cmt_core::timeline::TimelinePlan;
use cmt_core::traits::TimelineWrite;
use cmt_core::value_objects::{day_before, normalize_role};
use cmt_core::{DateSpan, DomainError, MemberTimeline, Permissions, Snowflake};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::dto::{
    AssignRoleRequest, ElectionRequest, ElectionResponse, OfficerResponse, RoleHistoryResponse,
};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::member::MemberService;
use super::permission::PermissionService;

/// Role service
pub struct RoleService<'a> {
    ctx: &'a ServiceContext,
}

/// Pending role changes for one member during an election
struct Ballot {
    original: MemberTimeline,
    working: MemberTimeline,
    plan: TimelinePlan<RoleInterval>,
    events: Vec<DomainEvent>,
}

impl<'a> RoleService<'a> {
    /// Create a new RoleService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Full role history of a member
    #[instrument(skip(self))]
    pub async fn history(
        &self,
        actor_id: Snowflake,
        member_id: Snowflake,
    ) -> ServiceResult<RoleHistoryResponse> {
        let member = MemberService::new(self.ctx).get_entity(member_id).await?;
        PermissionService::new(self.ctx)
            .require_view(actor_id, &member)
            .await?;

        let timeline = self.load(member_id).await?;
        Ok(RoleHistoryResponse::new(&timeline, self.ctx.today()))
    }

    /// Give a member a role term, one year long unless an end is given
    #[instrument(skip(self, request), fields(role = %request.role))]
    pub async fn assign(
        &self,
        actor_id: Snowflake,
        member_id: Snowflake,
        request: AssignRoleRequest,
    ) -> ServiceResult<RoleHistoryResponse> {
        request.validate()?;
        let member = MemberService::new(self.ctx).get_entity(member_id).await?;
        PermissionService::new(self.ctx)
            .require(actor_id, member.chapter_id, Permissions::MANAGE_ROLES)
            .await?;

        let start = request.start.unwrap_or_else(|| self.ctx.today());
        let span = match request.end {
            Some(end) => DateSpan::new(start, end)?,
            None => self.ctx.policy().role_span(start),
        };
        let role = normalize_role(&request.role);

        let mut attempt = 0;
        loop {
            match self.try_assign(member_id, member.chapter_id, &role, span, actor_id).await {
                Err(err) => {
                    if !self.ctx.retry_after(&err, attempt).await {
                        return Err(err);
                    }
                    attempt += 1;
                    warn!(member_id = %member_id, attempt, "Timeline changed underneath, retrying");
                }
                outcome => return outcome,
            }
        }
    }

    async fn try_assign(
        &self,
        member_id: Snowflake,
        chapter_id: Snowflake,
        role: &str,
        span: DateSpan,
        actor_id: Snowflake,
    ) -> ServiceResult<RoleHistoryResponse> {
        let timeline = self.load(member_id).await?;
        let today = self.ctx.today();

        let mut next_id = || self.ctx.generate_id();
        let plan = timeline.plan_role(role, span, &mut next_id);
        if plan.is_empty() {
            return Ok(RoleHistoryResponse::new(&timeline, today));
        }

        let mut after = timeline.clone();
        after.apply_role_plan(&plan);

        let mut write = TimelineWrite::new(&timeline, today);
        write.roles = plan;
        write.current_roles = after.current_roles(today);
        write.events.push(role_event(
            true,
            member_id,
            chapter_id,
            role,
            span,
            Some(actor_id),
        ));
        self.ctx.timeline_repo().apply(&[write]).await?;
        after.version += 1;

        info!(member_id = %member_id, role, start = %span.start, end = %span.end, "Role assigned");
        Ok(RoleHistoryResponse::new(&after, today))
    }

    /// End a role term so that yesterday is its last day
    #[instrument(skip(self))]
    pub async fn end(
        &self,
        actor_id: Snowflake,
        member_id: Snowflake,
        interval_id: Snowflake,
    ) -> ServiceResult<RoleHistoryResponse> {
        let member = MemberService::new(self.ctx).get_entity(member_id).await?;
        PermissionService::new(self.ctx)
            .require(actor_id, member.chapter_id, Permissions::MANAGE_ROLES)
            .await?;

        let mut attempt = 0;
        loop {
            match self.try_end(member_id, member.chapter_id, interval_id, actor_id).await {
                Err(err) => {
                    if !self.ctx.retry_after(&err, attempt).await {
                        return Err(err);
                    }
                    attempt += 1;
                    warn!(member_id = %member_id, attempt, "Timeline changed underneath, retrying");
                }
                outcome => return outcome,
            }
        }
    }

    async fn try_end(
        &self,
        member_id: Snowflake,
        chapter_id: Snowflake,
        interval_id: Snowflake,
        actor_id: Snowflake,
    ) -> ServiceResult<RoleHistoryResponse> {
        let timeline = self.load(member_id).await?;
        let today = self.ctx.today();

        let plan = timeline.plan_end_role(interval_id, day_before(today))?;
        if plan.is_empty() {
            return Ok(RoleHistoryResponse::new(&timeline, today));
        }

        let mut after = timeline.clone();
        after.apply_role_plan(&plan);
        // A term that never started is deleted; report its planned span
        let ended = after
            .roles
            .iter()
            .chain(&timeline.roles)
            .find(|r| r.id == interval_id)
            .map(|r| role_event(false, member_id, chapter_id, &r.role, r.span, Some(actor_id)));

        let mut write = TimelineWrite::new(&timeline, today);
        write.roles = plan;
        write.current_roles = after.current_roles(today);
        write.events.extend(ended);
        self.ctx.timeline_repo().apply(&[write]).await?;
        after.version += 1;

        info!(member_id = %member_id, interval_id = %interval_id, "Role ended");
        Ok(RoleHistoryResponse::new(&after, today))
    }

    /// Replace the holders of each listed role from `start`.
    ///
    /// Outgoing holders get their term cut to the day before; each elected
    /// member gets a fresh term. All members are written together.
    #[instrument(skip(self, request), fields(officers = request.officers.len()))]
    pub async fn elect(
        &self,
        actor_id: Snowflake,
        chapter_id: Snowflake,
        request: ElectionRequest,
    ) -> ServiceResult<ElectionResponse> {
        request.validate()?;
        if self.ctx.chapter_repo().find_by_id(chapter_id).await?.is_none() {
            return Err(DomainError::ChapterNotFound(chapter_id.to_string()).into());
        }
        PermissionService::new(self.ctx)
            .require(actor_id, chapter_id, Permissions::MANAGE_ROLES)
            .await?;

        let span = match request.end {
            Some(end) => DateSpan::new(request.start, end)?,
            None => self.ctx.policy().role_span(request.start),
        };

        let mut seen = Vec::with_capacity(request.officers.len());
        for officer in &request.officers {
            let role = normalize_role(&officer.role);
            if seen.contains(&role) {
                return Err(ServiceError::validation(format!("Role elected twice: {role}")));
            }
            seen.push(role);

            let member = MemberService::new(self.ctx).get_entity(officer.member_id).await?;
            if member.chapter_id != chapter_id {
                return Err(ServiceError::validation(format!(
                    "Member {} does not belong to this chapter",
                    officer.member_id
                )));
            }
        }

        let mut attempt = 0;
        loop {
            match self.try_elect(chapter_id, &request, span, actor_id).await {
                Err(err) => {
                    if !self.ctx.retry_after(&err, attempt).await {
                        return Err(err);
                    }
                    attempt += 1;
                    warn!(chapter_id = %chapter_id, attempt, "Election raced another write, retrying");
                }
                outcome => return outcome,
            }
        }
    }

    async fn try_elect(
        &self,
        chapter_id: Snowflake,
        request: &ElectionRequest,
        span: DateSpan,
        actor_id: Snowflake,
    ) -> ServiceResult<ElectionResponse> {
        let today = self.ctx.today();
        let holders = self.ctx.timeline_repo().roles_on(chapter_id, span.start).await?;
        let mut ballots: BTreeMap<Snowflake, Ballot> = BTreeMap::new();
        let mut ended = 0;
        let mut assigned = 0;

        for officer in &request.officers {
            let role = normalize_role(&officer.role);

            for holder in holders.iter().filter(|h| h.interval.role == role) {
                let member_id = holder.interval.member_id;
                let ballot = self.ballot(&mut ballots, member_id).await?;
                let plan = ballot.working.plan_vacate_role(&role, span.start);
                if plan.is_empty() {
                    continue;
                }
                ended += plan.updates.len() + plan.deletes.len();
                ballot.working.apply_role_plan(&plan);
                ballot.plan.merge(plan);

                let last_day = day_before(span.start);
                let served = DateSpan {
                    start: holder.interval.span.start.min(last_day),
                    end: last_day,
                };
                ballot.events.push(role_event(
                    false,
                    member_id,
                    chapter_id,
                    &role,
                    served,
                    Some(actor_id),
                ));
            }

            let ballot = self.ballot(&mut ballots, officer.member_id).await?;
            let mut next_id = || self.ctx.generate_id();
            let plan = ballot.working.plan_role(&role, span, &mut next_id);
            if plan.is_empty() {
                continue;
            }
            assigned += 1;
            ballot.working.apply_role_plan(&plan);
            ballot.plan.merge(plan);
            ballot.events.push(role_event(
                true,
                officer.member_id,
                chapter_id,
                &role,
                span,
                Some(actor_id),
            ));
        }

        let writes: Vec<TimelineWrite> = ballots
            .into_values()
            .filter(|b| !b.plan.is_empty())
            .map(|b| {
                let mut write = TimelineWrite::new(&b.original, today);
                write.current_roles = b.working.current_roles(today);
                write.roles = b.plan;
                write.events = b.events;
                write
            })
            .collect();
        if !writes.is_empty() {
            self.ctx.timeline_repo().apply(&writes).await?;
        }

        info!(chapter_id = %chapter_id, ended, assigned, members = writes.len(), "Election recorded");

        let mut officers = self.ctx.timeline_repo().roles_on(chapter_id, span.start).await?;
        officers.sort_by(|a, b| a.interval.role.cmp(&b.interval.role));
        Ok(ElectionResponse {
            ended,
            assigned,
            officers: officers.iter().map(OfficerResponse::from).collect(),
        })
    }

    async fn ballot<'b>(
        &self,
        ballots: &'b mut BTreeMap<Snowflake, Ballot>,
        member_id: Snowflake,
    ) -> ServiceResult<&'b mut Ballot> {
        if !ballots.contains_key(&member_id) {
            let timeline = self.load(member_id).await?;
            ballots.insert(
                member_id,
                Ballot {
                    working: timeline.clone(),
                    original: timeline,
                    plan: TimelinePlan::default(),
                    events: Vec::new(),
                },
            );
        }
        ballots
            .get_mut(&member_id)
            .ok_or_else(|| ServiceError::internal("ballot vanished"))
    }

    async fn load(&self, member_id: Snowflake) -> ServiceResult<MemberTimeline> {
        self.ctx
            .timeline_repo()
            .load(member_id)
            .await?
            .ok_or_else(|| ServiceError::from(DomainError::MemberNotFound(member_id)))
    }
}

fn role_event(
    assigned: bool,
    member_id: Snowflake,
    chapter_id: Snowflake,
    role: &str,
    span: DateSpan,
    actor_id: Option<Snowflake>,
) -> DomainEvent {
    let event = RoleEvent {
        member_id,
        chapter_id,
        role: role.to_string(),
        start: span.start,
        end: span.end,
        actor_id,
        timestamp: Utc::now(),
    };
    if assigned {
        DomainEvent::RoleAssigned(event)
    } else {
        DomainEvent::RoleEnded(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::ElectedOfficer;
    use crate::testing::{day, MemoryStore};
    use cmt_core::entities::{Chapter, Member};
    use cmt_core::MemberStatus;

    struct Fixture {
        store: MemoryStore,
        alpha: Chapter,
        president: Member,
    }

    fn fixture() -> Fixture {
        let store = MemoryStore::default();
        let alpha = store.add_chapter(1, "alpha");
        let president = store.add_member(10, &alpha, &[(MemberStatus::Active, day(2022, 9, 1), None)]);
        store.add_role(900, &president, "president", DateSpan::open(day(2023, 1, 1)));
        Fixture {
            store,
            alpha,
            president,
        }
    }

    #[tokio::test]
    async fn test_assign_defaults_to_one_year_term() {
        let f = fixture();
        let member = f.store.add_member(11, &f.alpha, &[(MemberStatus::Active, day(2022, 9, 1), None)]);
        let ctx = f.store.context();

        let history = RoleService::new(&ctx)
            .assign(
                f.president.id,
                member.id,
                AssignRoleRequest {
                    role: "Treasurer".to_string(),
                    start: Some(day(2025, 1, 1)),
                    end: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(history.intervals.len(), 1);
        assert_eq!(history.intervals[0].role, "treasurer");
        assert_eq!(history.intervals[0].end, Some(day(2025, 12, 31)));
    }

    #[tokio::test]
    async fn test_default_term_covers_leap_year() {
        let f = fixture();
        let member = f.store.add_member(12, &f.alpha, &[(MemberStatus::Active, day(2022, 9, 1), None)]);
        let ctx = f.store.context();

        let history = RoleService::new(&ctx)
            .assign(
                f.president.id,
                member.id,
                AssignRoleRequest {
                    role: "Scribe".to_string(),
                    start: Some(day(2024, 1, 1)),
                    end: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(history.intervals[0].start, day(2024, 1, 1));
        assert_eq!(history.intervals[0].end, Some(day(2024, 12, 31)));
    }

    #[tokio::test]
    async fn test_assign_rejects_inverted_range() {
        let f = fixture();
        let ctx = f.store.context();
        let err = RoleService::new(&ctx)
            .assign(
                f.president.id,
                f.president.id,
                AssignRoleRequest {
                    role: "scribe".to_string(),
                    start: Some(day(2025, 6, 1)),
                    end: Some(day(2025, 1, 1)),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_end_role_closes_term_yesterday() {
        let f = fixture();
        let member = f.store.add_member(11, &f.alpha, &[(MemberStatus::Active, day(2022, 9, 1), None)]);
        f.store.add_role(901, &member, "scribe", DateSpan::open(day(2024, 1, 1)));
        let ctx = f.store.context();

        let history = RoleService::new(&ctx)
            .end(f.president.id, member.id, Snowflake::new(901))
            .await
            .unwrap();
        let yesterday = day_before(ctx.today());
        assert_eq!(history.intervals[0].end, Some(yesterday));
        assert!(history.current_roles.is_empty());
        assert!(f.store.member(member.id).current_roles.is_empty());
    }

    #[tokio::test]
    async fn test_end_unknown_interval_is_not_found() {
        let f = fixture();
        let ctx = f.store.context();
        let err = RoleService::new(&ctx)
            .end(f.president.id, f.president.id, Snowflake::new(4040))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_election_hands_role_over() {
        let f = fixture();
        let old = f.store.add_member(11, &f.alpha, &[(MemberStatus::Active, day(2020, 9, 1), None)]);
        let new = f.store.add_member(12, &f.alpha, &[(MemberStatus::Active, day(2022, 9, 1), None)]);
        f.store.add_role(901, &old, "treasurer", DateSpan::open(day(2024, 1, 1)));
        let ctx = f.store.context();

        let response = RoleService::new(&ctx)
            .elect(
                f.president.id,
                f.alpha.id,
                ElectionRequest {
                    start: day(2025, 1, 1),
                    end: None,
                    officers: vec![ElectedOfficer {
                        member_id: new.id,
                        role: "treasurer".to_string(),
                    }],
                },
            )
            .await
            .unwrap();
        assert_eq!(response.ended, 1);
        assert_eq!(response.assigned, 1);

        let treasurers: Vec<_> = response
            .officers
            .iter()
            .filter(|o| o.role == "treasurer")
            .collect();
        assert_eq!(treasurers.len(), 1);
        assert_eq!(treasurers[0].member_id, new.id.to_string());

        let old_roles = RoleService::new(&ctx).history(f.president.id, old.id).await.unwrap();
        assert_eq!(old_roles.intervals[0].end, Some(day(2024, 12, 31)));
    }

    #[tokio::test]
    async fn test_election_rejects_members_of_other_chapters() {
        let f = fixture();
        let beta = f.store.add_chapter(2, "beta");
        let outsider = f.store.add_member(20, &beta, &[(MemberStatus::Active, day(2022, 9, 1), None)]);
        let ctx = f.store.context();

        let err = RoleService::new(&ctx)
            .elect(
                f.president.id,
                f.alpha.id,
                ElectionRequest {
                    start: day(2025, 1, 1),
                    end: None,
                    officers: vec![ElectedOfficer {
                        member_id: outsider.id,
                        role: "scribe".to_string(),
                    }],
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
