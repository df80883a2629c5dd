//! Member service
//!
//! Profiles and member creation. Status and roles are never edited here;
//! see [`StatusService`](super::StatusService) and
//! [`RoleService`](super::RoleService).

use cmt_common::validate_password_strength;
use cmt_core::entities::{Member, StatusInterval};
use cmt_core::events::{DomainEvent, MemberCreatedEvent, MemberEvent};
use cmt_core::{DateSpan, DomainError, MemberStatus, MemberTimeline, Permissions, Snowflake};
use chrono::Utc;
use tracing::{info, instrument};
use validator::Validate;

use crate::dto::{CreateMemberRequest, CurrentMemberResponse, MemberResponse, UpdateMemberRequest};

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::permission::PermissionService;

/// Member service
pub struct MemberService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> MemberService<'a> {
    /// Create a new MemberService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Get member entity by ID
    #[instrument(skip(self))]
    pub async fn get_entity(&self, member_id: Snowflake) -> ServiceResult<Member> {
        self.ctx
            .member_repo()
            .find_by_id(member_id)
            .await?
            .ok_or_else(|| DomainError::MemberNotFound(member_id).into())
    }

    /// The caller's own record with its derived permissions
    #[instrument(skip(self))]
    pub async fn me(&self, actor_id: Snowflake) -> ServiceResult<CurrentMemberResponse> {
        let actor = PermissionService::new(self.ctx).actor(actor_id).await?;
        let permissions = actor
            .permissions_in(actor.chapter_id)
            .list()
            .into_iter()
            .map(str::to_string)
            .collect();

        Ok(CurrentMemberResponse {
            member: MemberResponse::from(actor),
            permissions,
        })
    }

    /// Get a member visible to the caller
    #[instrument(skip(self))]
    pub async fn get(&self, actor_id: Snowflake, member_id: Snowflake) -> ServiceResult<MemberResponse> {
        let member = self.get_entity(member_id).await?;
        PermissionService::new(self.ctx)
            .require_view(actor_id, &member)
            .await?;
        Ok(MemberResponse::from(member))
    }

    /// Update profile fields
    #[instrument(skip(self, request))]
    pub async fn update_profile(
        &self,
        actor_id: Snowflake,
        member_id: Snowflake,
        request: UpdateMemberRequest,
    ) -> ServiceResult<MemberResponse> {
        request.validate()?;
        let mut member = self.get_entity(member_id).await?;
        PermissionService::new(self.ctx)
            .require_edit(actor_id, &member)
            .await?;

        if let Some(email) = request.email {
            member.email = email;
        }
        if let Some(first_name) = request.first_name {
            member.first_name = first_name;
        }
        if let Some(last_name) = request.last_name {
            member.last_name = last_name;
        }
        if let Some(badge_number) = request.badge_number {
            member.badge_number = Some(badge_number);
        }
        if let Some(graduation_year) = request.graduation_year {
            member.graduation_year = Some(graduation_year);
        }
        if let Some(phone) = request.phone {
            member.phone = Some(phone);
        }
        member.updated_at = Utc::now();

        self.ctx.member_repo().update_profile(&member).await?;
        self.ctx
            .audit_repo()
            .append(&DomainEvent::MemberUpdated(MemberEvent::new(
                member.id,
                member.chapter_id,
                Some(actor_id),
            )))
            .await?;

        info!(member_id = %member.id, "Member profile updated");
        Ok(MemberResponse::from(member))
    }

    /// Create a member in a chapter with an opening status.
    ///
    /// A member created straight into `active` gets the same fabricated
    /// pledge period an initiation with no history would.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn create(
        &self,
        actor_id: Snowflake,
        chapter_id: Snowflake,
        request: CreateMemberRequest,
    ) -> ServiceResult<MemberResponse> {
        request.validate()?;
        if self.ctx.chapter_repo().find_by_id(chapter_id).await?.is_none() {
            return Err(DomainError::ChapterNotFound(chapter_id.to_string()).into());
        }
        PermissionService::new(self.ctx)
            .require(actor_id, chapter_id, Permissions::MANAGE_MEMBERS)
            .await?;

        let password_hash = match request.password.as_deref() {
            Some(password) => {
                validate_password_strength(password)?;
                Some(self.ctx.password_service().hash(password)?)
            }
            None => None,
        };
        if self.ctx.member_repo().email_exists(&request.email).await? {
            return Err(DomainError::EmailAlreadyExists.into());
        }

        let today = self.ctx.today();
        let status = request.status.unwrap_or(MemberStatus::Pnm);
        let start = request.start.unwrap_or(today);
        let member_id = self.ctx.generate_id();

        let mut initial = Vec::with_capacity(2);
        if status == MemberStatus::Active {
            let pledge = self.ctx.policy().synthetic_pledge_span(start);
            initial.push(StatusInterval::new(
                self.ctx.generate_id(),
                member_id,
                MemberStatus::Pnm,
                pledge,
            ));
        }
        initial.push(StatusInterval::new(
            self.ctx.generate_id(),
            member_id,
            status,
            DateSpan::open(start),
        ));
        let timeline = MemberTimeline::new(member_id, 0, initial.clone(), Vec::new());

        let mut member = Member::new(
            member_id,
            chapter_id,
            request.email,
            request.first_name,
            request.last_name,
        );
        member.badge_number = request.badge_number;
        member.graduation_year = request.graduation_year;
        member.phone = request.phone;
        member.current_status = timeline.current_status(today);

        let event = DomainEvent::MemberCreated(MemberCreatedEvent {
            member_id,
            chapter_id,
            status,
            actor_id: Some(actor_id),
            timestamp: Utc::now(),
        });
        self.ctx
            .member_repo()
            .create(&member, password_hash.as_deref(), &initial, &event)
            .await?;

        info!(member_id = %member_id, chapter_id = %chapter_id, status = %status, "Member created");
        Ok(MemberResponse::from(member))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{day, MemoryStore};

    fn officer(store: &MemoryStore, chapter: &cmt_core::entities::Chapter) -> Member {
        let member = store.add_member(10, chapter, &[(MemberStatus::Active, day(2022, 9, 1), None)]);
        store.add_role(900, &member, "president", DateSpan::open(day(2023, 1, 1)));
        member
    }

    fn request(email: &str) -> CreateMemberRequest {
        CreateMemberRequest {
            email: email.to_string(),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            badge_number: None,
            graduation_year: Some(2027),
            phone: None,
            status: None,
            start: None,
            password: None,
        }
    }

    #[tokio::test]
    async fn test_new_member_defaults_to_pnm() {
        let store = MemoryStore::default();
        let alpha = store.add_chapter(1, "alpha");
        let president = officer(&store, &alpha);
        let ctx = store.context();

        let created = MemberService::new(&ctx)
            .create(president.id, alpha.id, request("grace@alpha.edu"))
            .await
            .unwrap();
        assert_eq!(created.status, "pnm");

        let id = Snowflake::parse(&created.id).unwrap();
        let history = store.statuses_of(id);
        assert_eq!(history.len(), 1);
        assert!(history[0].span.is_open_ended());
    }

    #[tokio::test]
    async fn test_active_member_gets_pledge_period() {
        let store = MemoryStore::default();
        let alpha = store.add_chapter(1, "alpha");
        let president = officer(&store, &alpha);
        let ctx = store.context();

        let mut req = request("grace@alpha.edu");
        req.status = Some(MemberStatus::Active);
        req.start = Some(day(2024, 9, 1));
        let created = MemberService::new(&ctx)
            .create(president.id, alpha.id, req)
            .await
            .unwrap();

        let id = Snowflake::parse(&created.id).unwrap();
        let history = store.statuses_of(id);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].status, MemberStatus::Pnm);
        assert_eq!(history[0].span.end, day(2024, 8, 31));
        assert_eq!(history[1].status, MemberStatus::Active);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::default();
        let alpha = store.add_chapter(1, "alpha");
        let president = officer(&store, &alpha);
        let ctx = store.context();

        let err = MemberService::new(&ctx)
            .create(president.id, alpha.id, request(&president.email))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 409);
    }

    #[tokio::test]
    async fn test_plain_member_cannot_add_members() {
        let store = MemoryStore::default();
        let alpha = store.add_chapter(1, "alpha");
        let member = store.add_member(10, &alpha, &[(MemberStatus::Active, day(2022, 9, 1), None)]);
        let ctx = store.context();

        let err = MemberService::new(&ctx)
            .create(member.id, alpha.id, request("new@alpha.edu"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[tokio::test]
    async fn test_me_reports_permissions() {
        let store = MemoryStore::default();
        let alpha = store.add_chapter(1, "alpha");
        let president = officer(&store, &alpha);
        let ctx = store.context();

        let me = MemberService::new(&ctx).me(president.id).await.unwrap();
        assert!(me.permissions.iter().any(|p| p == "MANAGE_ROLES"));
        assert_eq!(me.member.roles, vec!["president".to_string()]);
    }

    #[tokio::test]
    async fn test_member_edits_own_profile() {
        let store = MemoryStore::default();
        let alpha = store.add_chapter(1, "alpha");
        let member = store.add_member(10, &alpha, &[(MemberStatus::Active, day(2022, 9, 1), None)]);
        let ctx = store.context();

        let updated = MemberService::new(&ctx)
            .update_profile(
                member.id,
                member.id,
                UpdateMemberRequest {
                    phone: Some("555-0100".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.phone.as_deref(), Some("555-0100"));
        assert_eq!(store.member(member.id).phone.as_deref(), Some("555-0100"));
    }
}
