//! Permission service
//!
//! Permissions are never stored. They are derived on every call from the
//! roles the actor's timeline shows for today, so a role that lapsed
//! yesterday stops granting access even before the nightly cache refresh.

use cmt_core::entities::Member;
use cmt_core::{Permissions, Snowflake};
use tracing::{debug, instrument};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Permission service for access control
pub struct PermissionService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> PermissionService<'a> {
    /// Create a new PermissionService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Load the acting member with roles taken from the timeline
    #[instrument(skip(self))]
    pub async fn actor(&self, actor_id: Snowflake) -> ServiceResult<Member> {
        let mut member = self
            .ctx
            .member_repo()
            .find_by_id(actor_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Member", actor_id.to_string()))?;

        if let Some(timeline) = self.ctx.timeline_repo().load(actor_id).await? {
            member.current_roles = timeline.current_roles(self.ctx.today());
        }
        Ok(member)
    }

    /// Permissions the actor holds on a chapter
    #[instrument(skip(self))]
    pub async fn permissions(
        &self,
        actor_id: Snowflake,
        chapter_id: Snowflake,
    ) -> ServiceResult<Permissions> {
        let actor = self.actor(actor_id).await?;
        let permissions = actor.permissions_in(chapter_id);
        debug!(
            actor_id = %actor_id,
            chapter_id = %chapter_id,
            permissions = ?permissions,
            "Computed member permissions"
        );
        Ok(permissions)
    }

    /// Check a chapter permission and return the actor if granted
    #[instrument(skip(self))]
    pub async fn require(
        &self,
        actor_id: Snowflake,
        chapter_id: Snowflake,
        permission: Permissions,
    ) -> ServiceResult<Member> {
        let actor = self.actor(actor_id).await?;
        if !actor.permissions_in(chapter_id).has(permission) {
            return Err(denied(permission));
        }
        Ok(actor)
    }

    /// Check a permission that is not tied to one chapter (national actions)
    #[instrument(skip(self))]
    pub async fn require_global(
        &self,
        actor_id: Snowflake,
        permission: Permissions,
    ) -> ServiceResult<Member> {
        let actor = self.actor(actor_id).await?;
        if !actor.permissions_in(actor.chapter_id).has(permission) {
            return Err(denied(permission));
        }
        Ok(actor)
    }

    /// Members read themselves; anyone else needs roster access to the
    /// target's chapter.
    #[instrument(skip(self, target), fields(target_id = %target.id))]
    pub async fn require_view(&self, actor_id: Snowflake, target: &Member) -> ServiceResult<()> {
        let needed = if actor_id == target.id {
            Permissions::VIEW_SELF
        } else {
            Permissions::VIEW_ROSTER
        };
        self.require(actor_id, target.chapter_id, needed).await.map(|_| ())
    }

    /// Members edit their own profile; officers edit anyone in their chapter
    #[instrument(skip(self, target), fields(target_id = %target.id))]
    pub async fn require_edit(&self, actor_id: Snowflake, target: &Member) -> ServiceResult<()> {
        let needed = if actor_id == target.id {
            Permissions::EDIT_SELF
        } else {
            Permissions::MANAGE_MEMBERS
        };
        self.require(actor_id, target.chapter_id, needed).await.map(|_| ())
    }
}

fn denied(permission: Permissions) -> ServiceError {
    ServiceError::permission_denied(permission.list().join(", "))
}
