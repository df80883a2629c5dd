//! PostgreSQL implementation of ChapterRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use cmt_core::entities::Chapter;
use cmt_core::error::DomainError;
use cmt_core::traits::{ChapterRepository, RepoResult};
use cmt_core::value_objects::Snowflake;

use crate::models::ChapterModel;

use super::error::{map_db_error, map_unique_violation};

const CHAPTER_COLUMNS: &str = "id, name, slug, school, region, active, created_at, updated_at";

#[derive(Clone)]
pub struct PgChapterRepository {
    pool: PgPool,
}

impl PgChapterRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChapterRepository for PgChapterRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Chapter>> {
        let result = sqlx::query_as::<_, ChapterModel>(&format!(
            "SELECT {CHAPTER_COLUMNS} FROM chapters WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Chapter::from))
    }

    #[instrument(skip(self))]
    async fn find_by_slug(&self, slug: &str) -> RepoResult<Option<Chapter>> {
        let result = sqlx::query_as::<_, ChapterModel>(&format!(
            "SELECT {CHAPTER_COLUMNS} FROM chapters WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Chapter::from))
    }

    #[instrument(skip(self))]
    async fn list(&self, include_inactive: bool) -> RepoResult<Vec<Chapter>> {
        let results = sqlx::query_as::<_, ChapterModel>(&format!(
            r#"
            SELECT {CHAPTER_COLUMNS}
            FROM chapters
            WHERE active OR $1
            ORDER BY name
            "#
        ))
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Chapter::from).collect())
    }

    #[instrument(skip(self, chapter), fields(chapter_id = %chapter.id))]
    async fn create(&self, chapter: &Chapter) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO chapters (id, name, slug, school, region, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(chapter.id.into_inner())
        .bind(&chapter.name)
        .bind(&chapter.slug)
        .bind(&chapter.school)
        .bind(&chapter.region)
        .bind(chapter.active)
        .bind(chapter.created_at)
        .bind(chapter.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, || DomainError::ChapterSlugExists(chapter.slug.clone())))?;

        Ok(())
    }

    #[instrument(skip(self, chapter), fields(chapter_id = %chapter.id))]
    async fn update(&self, chapter: &Chapter) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE chapters
            SET name = $2, slug = $3, school = $4, region = $5, active = $6, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(chapter.id.into_inner())
        .bind(&chapter.name)
        .bind(&chapter.slug)
        .bind(&chapter.school)
        .bind(&chapter.region)
        .bind(chapter.active)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, || DomainError::ChapterSlugExists(chapter.slug.clone())))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::ChapterNotFound(chapter.id.to_string()));
        }

        Ok(())
    }
}
