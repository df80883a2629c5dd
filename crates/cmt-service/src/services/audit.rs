//! Audit trail lookups

use cmt_core::{Permissions, Snowflake};
use tracing::instrument;

use crate::dto::AuditEntryResponse;

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::member::MemberService;
use super::permission::PermissionService;

const MAX_AUDIT_PAGE: i64 = 200;

/// Audit service
pub struct AuditService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AuditService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Most recent events about a member, newest first. Members may read
    /// their own trail; officers read their chapter's.
    #[instrument(skip(self))]
    pub async fn list_for_member(
        &self,
        actor_id: Snowflake,
        member_id: Snowflake,
        limit: Option<i64>,
    ) -> ServiceResult<Vec<AuditEntryResponse>> {
        let member = MemberService::new(self.ctx).get_entity(member_id).await?;
        if actor_id != member_id {
            PermissionService::new(self.ctx)
                .require(actor_id, member.chapter_id, Permissions::MANAGE_MEMBERS)
                .await?;
        }

        let limit = limit.unwrap_or(50).clamp(1, MAX_AUDIT_PAGE);
        let events = self
            .ctx
            .audit_repo()
            .list_for_member(member_id, limit)
            .await?;
        Ok(events.iter().map(AuditEntryResponse::from).collect())
    }
}
