//! Chapter service
//!
//! Chapter creation and settings, the roster, and the officer list.

use cmt_core::entities::Chapter;
use cmt_core::events::{ChapterEvent, DomainEvent};
use cmt_core::{DomainError, MemberStatus, Permissions, Snowflake};
use tracing::{info, instrument};
use validator::Validate;

use crate::dto::{
    ChapterResponse, CreateChapterRequest, MemberResponse, OfficerResponse, UpdateChapterRequest,
};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::permission::PermissionService;

/// Largest roster page served at once
pub const MAX_ROSTER_PAGE: i64 = 200;

/// Chapter service
pub struct ChapterService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ChapterService<'a> {
    /// Create a new ChapterService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// List chapters, active ones only unless asked otherwise
    #[instrument(skip(self))]
    pub async fn list(&self, include_inactive: bool) -> ServiceResult<Vec<ChapterResponse>> {
        let chapters = self.ctx.chapter_repo().list(include_inactive).await?;
        Ok(chapters.iter().map(ChapterResponse::from).collect())
    }

    /// Get chapter by ID
    #[instrument(skip(self))]
    pub async fn get(&self, chapter_id: Snowflake) -> ServiceResult<ChapterResponse> {
        let chapter = self.get_entity(chapter_id).await?;
        Ok(ChapterResponse::from(&chapter))
    }

    /// Get chapter entity by ID
    #[instrument(skip(self))]
    pub async fn get_entity(&self, chapter_id: Snowflake) -> ServiceResult<Chapter> {
        self.ctx
            .chapter_repo()
            .find_by_id(chapter_id)
            .await?
            .ok_or_else(|| DomainError::ChapterNotFound(chapter_id.to_string()).into())
    }

    /// Get chapter entity by slug
    #[instrument(skip(self))]
    pub async fn get_by_slug(&self, slug: &str) -> ServiceResult<Chapter> {
        self.ctx
            .chapter_repo()
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::ChapterNotFound(slug.to_string()).into())
    }

    /// Create a chapter (national officers)
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create(
        &self,
        actor_id: Snowflake,
        request: CreateChapterRequest,
    ) -> ServiceResult<ChapterResponse> {
        request.validate()?;
        PermissionService::new(self.ctx)
            .require_global(actor_id, Permissions::MANAGE_CHAPTERS)
            .await?;

        let slug = match request.slug {
            Some(slug) => Chapter::slugify(&slug),
            None => Chapter::slugify(&request.name),
        };
        if slug.is_empty() {
            return Err(ServiceError::validation("Chapter slug must contain a letter or digit"));
        }
        if self.ctx.chapter_repo().find_by_slug(&slug).await?.is_some() {
            return Err(DomainError::ChapterSlugExists(slug).into());
        }

        let mut chapter = Chapter::new(self.ctx.generate_id(), request.name, slug);
        chapter.school = request.school;
        chapter.region = request.region;
        self.ctx.chapter_repo().create(&chapter).await?;

        self.ctx
            .audit_repo()
            .append(&DomainEvent::ChapterCreated(ChapterEvent::new(
                chapter.id,
                Some(actor_id),
            )))
            .await?;

        info!(chapter_id = %chapter.id, slug = %chapter.slug, "Chapter created");
        Ok(ChapterResponse::from(&chapter))
    }

    /// Update chapter settings (national officers)
    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        actor_id: Snowflake,
        chapter_id: Snowflake,
        request: UpdateChapterRequest,
    ) -> ServiceResult<ChapterResponse> {
        request.validate()?;
        PermissionService::new(self.ctx)
            .require_global(actor_id, Permissions::MANAGE_CHAPTERS)
            .await?;

        let mut chapter = self.get_entity(chapter_id).await?;
        if let Some(name) = request.name {
            chapter.name = name;
        }
        if let Some(school) = request.school {
            chapter.school = Some(school);
        }
        if let Some(region) = request.region {
            chapter.region = Some(region);
        }
        if let Some(active) = request.active {
            chapter.active = active;
        }
        chapter.touch();
        self.ctx.chapter_repo().update(&chapter).await?;

        self.ctx
            .audit_repo()
            .append(&DomainEvent::ChapterUpdated(ChapterEvent::new(
                chapter.id,
                Some(actor_id),
            )))
            .await?;

        info!(chapter_id = %chapter.id, "Chapter updated");
        Ok(ChapterResponse::from(&chapter))
    }

    /// Roster page read from the cached current status
    #[instrument(skip(self))]
    pub async fn roster(
        &self,
        actor_id: Snowflake,
        chapter_id: Snowflake,
        status: Option<MemberStatus>,
        limit: i64,
        after: Option<Snowflake>,
    ) -> ServiceResult<Vec<MemberResponse>> {
        self.get_entity(chapter_id).await?;
        PermissionService::new(self.ctx)
            .require(actor_id, chapter_id, Permissions::VIEW_ROSTER)
            .await?;

        let members = self
            .ctx
            .member_repo()
            .list_by_chapter(chapter_id, status, limit.clamp(1, MAX_ROSTER_PAGE), after)
            .await?;
        Ok(members.iter().map(MemberResponse::from).collect())
    }

    /// Role holders as of today
    #[instrument(skip(self))]
    pub async fn officers(
        &self,
        actor_id: Snowflake,
        chapter_id: Snowflake,
    ) -> ServiceResult<Vec<OfficerResponse>> {
        self.get_entity(chapter_id).await?;
        PermissionService::new(self.ctx)
            .require(actor_id, chapter_id, Permissions::VIEW_ROSTER)
            .await?;

        let mut holders = self
            .ctx
            .timeline_repo()
            .roles_on(chapter_id, self.ctx.today())
            .await?;
        holders.sort_by(|a, b| a.interval.role.cmp(&b.interval.role));
        Ok(holders.iter().map(OfficerResponse::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{day, MemoryStore};
    use cmt_core::DateSpan;

    fn natoff(store: &MemoryStore, hq: &Chapter) -> Snowflake {
        let member = store.add_member(50, hq, &[(MemberStatus::Alumni, day(2010, 5, 1), None)]);
        store.add_role(950, &member, "national director", DateSpan::open(day(2020, 1, 1)));
        member.id
    }

    #[tokio::test]
    async fn test_create_chapter_derives_slug() {
        let store = MemoryStore::default();
        let hq = store.add_chapter(1, "hq");
        let actor = natoff(&store, &hq);
        let ctx = store.context();

        let created = ChapterService::new(&ctx)
            .create(
                actor,
                CreateChapterRequest {
                    name: "Beta Gamma".to_string(),
                    slug: None,
                    school: Some("State University".to_string()),
                    region: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(created.slug, Chapter::slugify("Beta Gamma"));
        assert!(matches!(
            store.events().last(),
            Some(DomainEvent::ChapterCreated(_))
        ));

        let duplicate = ChapterService::new(&ctx)
            .create(
                actor,
                CreateChapterRequest {
                    name: "Beta Gamma".to_string(),
                    slug: None,
                    school: None,
                    region: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(duplicate.status_code(), 409);
    }

    #[tokio::test]
    async fn test_chapter_officer_cannot_create_chapter() {
        let store = MemoryStore::default();
        let alpha = store.add_chapter(1, "alpha");
        let president = store.add_member(10, &alpha, &[(MemberStatus::Active, day(2022, 9, 1), None)]);
        store.add_role(900, &president, "president", DateSpan::open(day(2023, 1, 1)));
        let ctx = store.context();

        let err = ChapterService::new(&ctx)
            .create(
                president.id,
                CreateChapterRequest {
                    name: "Rogue".to_string(),
                    slug: None,
                    school: None,
                    region: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[tokio::test]
    async fn test_roster_filters_on_cached_status() {
        let store = MemoryStore::default();
        let alpha = store.add_chapter(1, "alpha");
        let active = store.add_member(10, &alpha, &[(MemberStatus::Active, day(2022, 9, 1), None)]);
        store.add_member(11, &alpha, &[(MemberStatus::Pnm, day(2024, 9, 1), None)]);
        let ctx = store.context();

        let service = ChapterService::new(&ctx);
        let everyone = service.roster(active.id, alpha.id, None, 50, None).await.unwrap();
        assert_eq!(everyone.len(), 2);

        let pledges = service
            .roster(active.id, alpha.id, Some(MemberStatus::Pnm), 50, None)
            .await
            .unwrap();
        assert_eq!(pledges.len(), 1);
        assert_eq!(pledges[0].status, "pnm");
    }

    #[tokio::test]
    async fn test_officers_lists_current_holders() {
        let store = MemoryStore::default();
        let alpha = store.add_chapter(1, "alpha");
        let member = store.add_member(10, &alpha, &[(MemberStatus::Active, day(2022, 9, 1), None)]);
        store.add_role(900, &member, "treasurer", DateSpan::open(day(2023, 1, 1)));
        store.add_role(
            901,
            &member,
            "scribe",
            DateSpan::new(day(2021, 1, 1), day(2021, 12, 31)).unwrap(),
        );
        let ctx = store.context();

        let officers = ChapterService::new(&ctx).officers(member.id, alpha.id).await.unwrap();
        assert_eq!(officers.len(), 1);
        assert_eq!(officers[0].role, "treasurer");
        assert!(officers[0].end.is_none());
    }

    #[tokio::test]
    async fn test_unknown_chapter_is_not_found() {
        let store = MemoryStore::default();
        let ctx = store.context();
        let err = ChapterService::new(&ctx).get(Snowflake::new(404)).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }
}
