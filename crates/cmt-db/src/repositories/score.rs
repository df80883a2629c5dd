//! PostgreSQL implementation of ScoreRepository

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::instrument;

use cmt_core::entities::{Activity, ChapterScore, ScoreKind, ScoreType};
use cmt_core::error::DomainError;
use cmt_core::traits::{RepoResult, ScoreRepository};
use cmt_core::value_objects::{DateSpan, Snowflake, YearTerm};

use crate::mappers::{chapter_score, ScoreTypeInsert};
use crate::models::{ActivityModel, ChapterScoreModel, ScoreTypeModel};

use super::error::{map_db_error, map_fk_violation, map_unique_violation, try_map_all};

const SCORE_TYPE_COLUMNS: &str = "id, slug, name, description, section, kind, points, term_points, \
     formula, base_points, attendance_multiplier, member_add, stem_add, alumni_add, guest_add, \
     special, created_at";

const ACTIVITY_COLUMNS: &str = "id, chapter_id, score_type_id, kind, name, activity_date, members, \
     alumni, guests, stem, hours, miles, score, created_by, created_at";

#[derive(Clone)]
pub struct PgScoreRepository {
    pool: PgPool,
}

impl PgScoreRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScoreRepository for PgScoreRepository {
    #[instrument(skip(self))]
    async fn list_types(&self) -> RepoResult<Vec<ScoreType>> {
        let rows = sqlx::query_as::<_, ScoreTypeModel>(&format!(
            "SELECT {SCORE_TYPE_COLUMNS} FROM score_types ORDER BY section, name"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        try_map_all(rows)
    }

    #[instrument(skip(self))]
    async fn find_type_by_id(&self, id: Snowflake) -> RepoResult<Option<ScoreType>> {
        let row = sqlx::query_as::<_, ScoreTypeModel>(&format!(
            "SELECT {SCORE_TYPE_COLUMNS} FROM score_types WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        row.map(ScoreType::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_type_by_slug(&self, slug: &str) -> RepoResult<Option<ScoreType>> {
        let row = sqlx::query_as::<_, ScoreTypeModel>(&format!(
            "SELECT {SCORE_TYPE_COLUMNS} FROM score_types WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        row.map(ScoreType::try_from).transpose()
    }

    #[instrument(skip(self, score_type), fields(slug = %score_type.slug))]
    async fn create_type(&self, score_type: &ScoreType) -> RepoResult<()> {
        let insert = ScoreTypeInsert::new(score_type);

        sqlx::query(
            r#"
            INSERT INTO score_types (
                id, slug, name, description, section, kind, points, term_points, formula,
                base_points, attendance_multiplier, member_add, stem_add, alumni_add, guest_add,
                special, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(score_type.id.into_inner())
        .bind(&score_type.slug)
        .bind(&score_type.name)
        .bind(&score_type.description)
        .bind(insert.section)
        .bind(insert.kind)
        .bind(score_type.points)
        .bind(score_type.term_points)
        .bind(&score_type.formula)
        .bind(score_type.base_points)
        .bind(score_type.attendance_multiplier)
        .bind(score_type.member_add)
        .bind(score_type.stem_add)
        .bind(score_type.alumni_add)
        .bind(score_type.guest_add)
        .bind(insert.special)
        .bind(score_type.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, || DomainError::ScoreTypeSlugExists(score_type.slug.clone())))?;

        Ok(())
    }

    #[instrument(skip(self, activity), fields(activity_id = %activity.id))]
    async fn create_activity(&self, activity: &Activity) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO activities (
                id, chapter_id, score_type_id, kind, name, activity_date, members, alumni,
                guests, stem, hours, miles, score, created_by, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(activity.id.into_inner())
        .bind(activity.chapter_id.into_inner())
        .bind(activity.score_type_id.into_inner())
        .bind(activity.kind.as_str())
        .bind(&activity.name)
        .bind(activity.date)
        .bind(activity.counts.members)
        .bind(activity.counts.alumni)
        .bind(activity.counts.guests)
        .bind(activity.counts.stem)
        .bind(activity.counts.hours)
        .bind(activity.counts.miles)
        .bind(activity.score)
        .bind(activity.created_by.map(Snowflake::into_inner))
        .bind(activity.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_fk_violation(e, || DomainError::ChapterNotFound(activity.chapter_id.to_string()))
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_activities(
        &self,
        chapter_id: Snowflake,
        score_type_id: Option<Snowflake>,
        span: DateSpan,
    ) -> RepoResult<Vec<Activity>> {
        let rows = sqlx::query_as::<_, ActivityModel>(&format!(
            r#"
            SELECT {ACTIVITY_COLUMNS}
            FROM activities
            WHERE chapter_id = $1
              AND ($2::BIGINT IS NULL OR score_type_id = $2)
              AND activity_date BETWEEN $3 AND $4
            ORDER BY activity_date, id
            "#
        ))
        .bind(chapter_id.into_inner())
        .bind(score_type_id.map(Snowflake::into_inner))
        .bind(span.start)
        .bind(span.end)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        try_map_all(rows)
    }

    #[instrument(skip(self))]
    async fn chapters_with_activities(
        &self,
        score_type_id: Snowflake,
        since: NaiveDate,
    ) -> RepoResult<Vec<Snowflake>> {
        let ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT DISTINCT chapter_id
            FROM activities
            WHERE score_type_id = $1 AND activity_date >= $2
            ORDER BY chapter_id
            "#,
        )
        .bind(score_type_id.into_inner())
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(ids.into_iter().map(Snowflake::new).collect())
    }

    #[instrument(skip(self, scores), fields(count = scores.len()))]
    async fn update_activity_scores(&self, scores: &[(Snowflake, f64)]) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        for (id, score) in scores {
            sqlx::query("UPDATE activities SET score = $2 WHERE id = $1")
                .bind(id.into_inner())
                .bind(score)
                .execute(&mut *tx)
                .await
                .map_err(map_db_error)?;
        }

        tx.commit().await.map_err(map_db_error)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn count_activities(
        &self,
        chapter_id: Snowflake,
        kind: ScoreKind,
        span: DateSpan,
    ) -> RepoResult<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM activities
            WHERE chapter_id = $1 AND kind = $2 AND activity_date BETWEEN $3 AND $4
            "#,
        )
        .bind(chapter_id.into_inner())
        .bind(kind.as_str())
        .bind(span.start)
        .bind(span.end)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn find_score(
        &self,
        chapter_id: Snowflake,
        score_type_id: Snowflake,
        term: YearTerm,
    ) -> RepoResult<Option<ChapterScore>> {
        let row = sqlx::query_as::<_, ChapterScoreModel>(
            r#"
            SELECT chapter_id, score_type_id, year, term, score, updated_at
            FROM chapter_scores
            WHERE chapter_id = $1 AND score_type_id = $2 AND year = $3 AND term = $4
            "#,
        )
        .bind(chapter_id.into_inner())
        .bind(score_type_id.into_inner())
        .bind(term.year)
        .bind(term.term.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        row.map(chapter_score).transpose()
    }

    #[instrument(skip(self, scores), fields(count = scores.len()))]
    async fn upsert_scores(&self, scores: &[ChapterScore]) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        for score in scores {
            sqlx::query(
                r#"
                INSERT INTO chapter_scores (chapter_id, score_type_id, year, term, score, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (chapter_id, score_type_id, year, term)
                DO UPDATE SET score = EXCLUDED.score, updated_at = EXCLUDED.updated_at
                "#,
            )
            .bind(score.chapter_id.into_inner())
            .bind(score.score_type_id.into_inner())
            .bind(score.term.year)
            .bind(score.term.term.as_str())
            .bind(score.score)
            .bind(score.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        tx.commit().await.map_err(map_db_error)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_scores(
        &self,
        chapter_id: Snowflake,
        terms: &[YearTerm],
    ) -> RepoResult<Vec<ChapterScore>> {
        let years: Vec<i32> = terms.iter().map(|t| t.year).collect();
        let names: Vec<String> = terms.iter().map(|t| t.term.as_str().to_string()).collect();

        let rows = sqlx::query_as::<_, ChapterScoreModel>(
            r#"
            SELECT chapter_id, score_type_id, year, term, score, updated_at
            FROM chapter_scores
            WHERE chapter_id = $1
              AND (year, term) IN (SELECT * FROM UNNEST($2::INTEGER[], $3::TEXT[]))
            ORDER BY score_type_id, year, term DESC
            "#,
        )
        .bind(chapter_id.into_inner())
        .bind(years)
        .bind(names)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        rows.into_iter().map(chapter_score).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PgScoreRepository>();
    }
}
