//! Service context - dependency container for services
//!
//! Holds the repositories, auth helpers, the ID generator, and the
//! deployment's membership rules.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use cmt_common::auth::{JwtService, PasswordService};
use cmt_common::DomainConfig;
use cmt_core::traits::{
    AuditRepository, ChapterRepository, MemberRepository, ScoreRepository, TimelineRepository,
};
use cmt_core::{Biennium, Snowflake, SnowflakeGenerator, TimelinePolicy};
use cmt_db::{
    PgAuditRepository, PgChapterRepository, PgMemberRepository, PgPool, PgScoreRepository,
    PgTimelineRepository,
};

use super::error::{ServiceError, ServiceResult};

/// Service context containing all dependencies.
///
/// Cheap to clone; every service borrows one.
#[derive(Clone)]
pub struct ServiceContext {
    chapter_repo: Arc<dyn ChapterRepository>,
    member_repo: Arc<dyn MemberRepository>,
    timeline_repo: Arc<dyn TimelineRepository>,
    score_repo: Arc<dyn ScoreRepository>,
    audit_repo: Arc<dyn AuditRepository>,

    // Absent for the admin CLI, which never issues tokens
    jwt_service: Option<Arc<JwtService>>,
    password_service: PasswordService,
    snowflake_generator: Arc<SnowflakeGenerator>,
    domain: DomainConfig,
}

impl ServiceContext {
    // === Repositories ===

    pub fn chapter_repo(&self) -> &dyn ChapterRepository {
        self.chapter_repo.as_ref()
    }

    pub fn member_repo(&self) -> &dyn MemberRepository {
        self.member_repo.as_ref()
    }

    pub fn timeline_repo(&self) -> &dyn TimelineRepository {
        self.timeline_repo.as_ref()
    }

    pub fn score_repo(&self) -> &dyn ScoreRepository {
        self.score_repo.as_ref()
    }

    pub fn audit_repo(&self) -> &dyn AuditRepository {
        self.audit_repo.as_ref()
    }

    // === Services ===

    /// # Errors
    /// Returns `ServiceError::Internal` when the context was built without
    /// token signing
    pub fn jwt_service(&self) -> ServiceResult<&JwtService> {
        self.jwt_service
            .as_deref()
            .ok_or_else(|| ServiceError::internal("token signing is not configured"))
    }

    pub fn password_service(&self) -> &PasswordService {
        &self.password_service
    }

    /// Generate a new Snowflake ID
    pub fn generate_id(&self) -> Snowflake {
        self.snowflake_generator.generate()
    }

    // === Rules ===

    pub fn domain(&self) -> &DomainConfig {
        &self.domain
    }

    pub fn policy(&self) -> TimelinePolicy {
        self.domain.timeline_policy()
    }

    pub fn biennium(&self) -> Biennium {
        self.domain.biennium()
    }

    /// Current calendar day in UTC
    pub fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }

    /// Whether a failed timeline write may be tried again after `attempt`
    /// retries. Sleeps before answering yes.
    pub(crate) async fn retry_after(&self, err: &ServiceError, attempt: u32) -> bool {
        if !err.is_retryable() || attempt >= self.domain.transition_max_retries {
            return false;
        }
        let delay = Duration::from_millis(20 * u64::from(attempt + 1));
        tokio::time::sleep(delay).await;
        true
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("repositories", &"...")
            .field("jwt", &self.jwt_service.is_some())
            .field("domain", &self.domain)
            .finish()
    }
}

/// Builder for creating a ServiceContext
#[derive(Default)]
pub struct ServiceContextBuilder {
    chapter_repo: Option<Arc<dyn ChapterRepository>>,
    member_repo: Option<Arc<dyn MemberRepository>>,
    timeline_repo: Option<Arc<dyn TimelineRepository>>,
    score_repo: Option<Arc<dyn ScoreRepository>>,
    audit_repo: Option<Arc<dyn AuditRepository>>,
    jwt_service: Option<Arc<JwtService>>,
    snowflake_generator: Option<Arc<SnowflakeGenerator>>,
    domain: Option<DomainConfig>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wire every repository to the PostgreSQL implementation
    pub fn postgres(pool: PgPool) -> Self {
        Self::new()
            .chapter_repo(Arc::new(PgChapterRepository::new(pool.clone())))
            .member_repo(Arc::new(PgMemberRepository::new(pool.clone())))
            .timeline_repo(Arc::new(PgTimelineRepository::new(pool.clone())))
            .score_repo(Arc::new(PgScoreRepository::new(pool.clone())))
            .audit_repo(Arc::new(PgAuditRepository::new(pool)))
    }

    pub fn chapter_repo(mut self, repo: Arc<dyn ChapterRepository>) -> Self {
        self.chapter_repo = Some(repo);
        self
    }

    pub fn member_repo(mut self, repo: Arc<dyn MemberRepository>) -> Self {
        self.member_repo = Some(repo);
        self
    }

    pub fn timeline_repo(mut self, repo: Arc<dyn TimelineRepository>) -> Self {
        self.timeline_repo = Some(repo);
        self
    }

    pub fn score_repo(mut self, repo: Arc<dyn ScoreRepository>) -> Self {
        self.score_repo = Some(repo);
        self
    }

    pub fn audit_repo(mut self, repo: Arc<dyn AuditRepository>) -> Self {
        self.audit_repo = Some(repo);
        self
    }

    pub fn jwt_service(mut self, service: Arc<JwtService>) -> Self {
        self.jwt_service = Some(service);
        self
    }

    pub fn snowflake_generator(mut self, generator: Arc<SnowflakeGenerator>) -> Self {
        self.snowflake_generator = Some(generator);
        self
    }

    pub fn domain(mut self, domain: DomainConfig) -> Self {
        self.domain = Some(domain);
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if a repository is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        fn required<T>(value: Option<T>, name: &str) -> ServiceResult<T> {
            value.ok_or_else(|| ServiceError::validation(format!("{name} is required")))
        }

        Ok(ServiceContext {
            chapter_repo: required(self.chapter_repo, "chapter_repo")?,
            member_repo: required(self.member_repo, "member_repo")?,
            timeline_repo: required(self.timeline_repo, "timeline_repo")?,
            score_repo: required(self.score_repo, "score_repo")?,
            audit_repo: required(self.audit_repo, "audit_repo")?,
            jwt_service: self.jwt_service,
            password_service: PasswordService::new(),
            snowflake_generator: self
                .snowflake_generator
                .unwrap_or_else(|| Arc::new(SnowflakeGenerator::default())),
            domain: self.domain.unwrap_or_default(),
        })
    }
}
