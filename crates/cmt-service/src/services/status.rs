//! Status timeline service
//!
//! Every status change goes through [`StatusService::apply`]: the transition
//! is validated against the member's history, painted onto it, and stored
//! together with the transition record, the refreshed status cache, and an
//! audit event in one versioned write.

use chrono::{NaiveDate, Utc};
use cmt_core::entities::{Member, TransitionRecord};
use cmt_core::events::{DomainEvent, MemberTransferredEvent, StatusChangedEvent};
use cmt_core::traits::TimelineWrite;
use cmt_core::{DomainError, MemberTimeline, Permissions, Snowflake, Transition};
use tracing::{debug, info, instrument, warn};
use validator::Validate;

use crate::dto::{
    ApplyTransitionRequest, StatusHistoryResponse, TransitionOutcomeResponse, TransitionResponse,
};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::member::MemberService;
use super::permission::PermissionService;

/// Status timeline service
pub struct StatusService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> StatusService<'a> {
    /// Create a new StatusService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Full status history of a member
    #[instrument(skip(self))]
    pub async fn history(
        &self,
        actor_id: Snowflake,
        member_id: Snowflake,
    ) -> ServiceResult<StatusHistoryResponse> {
        let member = MemberService::new(self.ctx).get_entity(member_id).await?;
        PermissionService::new(self.ctx)
            .require_view(actor_id, &member)
            .await?;

        let timeline = self.load(member_id).await?;
        Ok(StatusHistoryResponse::new(&timeline, self.ctx.today()))
    }

    /// Transitions submitted for a member, oldest first
    #[instrument(skip(self))]
    pub async fn transitions(
        &self,
        actor_id: Snowflake,
        member_id: Snowflake,
    ) -> ServiceResult<Vec<TransitionResponse>> {
        let member = MemberService::new(self.ctx).get_entity(member_id).await?;
        PermissionService::new(self.ctx)
            .require_view(actor_id, &member)
            .await?;

        let mut records = self.ctx.timeline_repo().list_transitions(member_id).await?;
        records.sort_by_key(|r| (r.effective_date, r.created_at));
        Ok(records.iter().map(TransitionResponse::from).collect())
    }

    /// Submit a transition for a member.
    ///
    /// Officers manage their own chapter. An explicit `admin_set` is
    /// reserved for national officers.
    #[instrument(skip(self, request), fields(kind = request.transition.kind()))]
    pub async fn apply(
        &self,
        actor_id: Snowflake,
        member_id: Snowflake,
        request: ApplyTransitionRequest,
    ) -> ServiceResult<TransitionOutcomeResponse> {
        request.validate()?;
        let member = MemberService::new(self.ctx).get_entity(member_id).await?;

        let needed = match request.transition {
            Transition::AdminSet { .. } => Permissions::NATIONAL,
            _ => Permissions::MANAGE_MEMBERS,
        };
        PermissionService::new(self.ctx)
            .require(actor_id, member.chapter_id, needed)
            .await?;

        if let Transition::Transfer { chapter_id } = request.transition {
            self.check_transfer_target(&member, chapter_id).await?;
        }

        let effective = request.effective_date.unwrap_or_else(|| self.ctx.today());
        let mut attempt = 0;
        loop {
            match self
                .submit(member_id, &request.transition, effective, Some(actor_id))
                .await
            {
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

    async fn check_transfer_target(
        &self,
        member: &Member,
        chapter_id: Snowflake,
    ) -> ServiceResult<()> {
        if chapter_id == member.chapter_id {
            return Err(DomainError::SameChapterTransfer(chapter_id).into());
        }
        if self.ctx.chapter_repo().find_by_id(chapter_id).await?.is_none() {
            return Err(DomainError::ChapterNotFound(chapter_id.to_string()).into());
        }
        Ok(())
    }

    /// One attempt: read the timeline, plan, write with the read version
    async fn submit(
        &self,
        member_id: Snowflake,
        transition: &Transition,
        effective: NaiveDate,
        actor_id: Option<Snowflake>,
    ) -> ServiceResult<TransitionOutcomeResponse> {
        // The chapter can change between attempts through a concurrent transfer
        let member = MemberService::new(self.ctx).get_entity(member_id).await?;
        let timeline = self.load(member_id).await?;
        let today = self.ctx.today();

        let change = transition.resolve(&timeline, effective, &self.ctx.policy())?;
        let mut write = TimelineWrite::new(&timeline, today);
        let mut after = timeline.clone();

        if let Some(change) = change {
            let mut next_id = || self.ctx.generate_id();
            let plan = timeline.plan_status(&change, &mut next_id);
            if !plan.is_empty() {
                after.apply_status_plan(&plan);
                after.ensure_disjoint()?;
                write.statuses = plan;
                write.events.push(DomainEvent::StatusChanged(StatusChangedEvent {
                    member_id,
                    chapter_id: member.chapter_id,
                    transition: transition.kind().to_string(),
                    previous: timeline.status_on(effective),
                    status: change.status,
                    start: change.span.start,
                    end: change.span.end,
                    actor_id,
                    timestamp: Utc::now(),
                }));
            }
        }

        if let Transition::Transfer { chapter_id } = *transition {
            write.chapter_id = Some(chapter_id);
            write.events.push(DomainEvent::MemberTransferred(MemberTransferredEvent {
                member_id,
                from_chapter_id: member.chapter_id,
                to_chapter_id: chapter_id,
                effective_date: effective,
                actor_id,
                timestamp: Utc::now(),
            }));
        }

        if write.is_noop() {
            debug!(member_id = %member_id, "Transition already on record");
            return Ok(TransitionOutcomeResponse {
                applied: false,
                chapter_id: member.chapter_id.to_string(),
                transition: None,
                history: StatusHistoryResponse::new(&timeline, today),
            });
        }

        let record = TransitionRecord::new(
            self.ctx.generate_id(),
            member_id,
            transition.clone(),
            effective,
            actor_id,
        );
        write.current_status = after.current_status(today);
        write.current_roles = after.current_roles(today);
        write.transition = Some(record.clone());
        let chapter_id = write.chapter_id.unwrap_or(member.chapter_id);

        self.ctx.timeline_repo().apply(&[write]).await?;
        after.version += 1;

        info!(
            member_id = %member_id,
            kind = transition.kind(),
            effective = %effective,
            status = %after.current_status(today),
            "Transition applied"
        );

        Ok(TransitionOutcomeResponse {
            applied: true,
            chapter_id: chapter_id.to_string(),
            transition: Some(TransitionResponse::from(&record)),
            history: StatusHistoryResponse::new(&after, today),
        })
    }

    async fn load(&self, member_id: Snowflake) -> ServiceResult<MemberTimeline> {
        self.ctx
            .timeline_repo()
            .load(member_id)
            .await?
            .ok_or_else(|| ServiceError::from(DomainError::MemberNotFound(member_id)))
    }
}
