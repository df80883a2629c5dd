//! PostgreSQL implementation of MemberRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use cmt_core::entities::{Member, StatusInterval};
use cmt_core::error::DomainError;
use cmt_core::events::DomainEvent;
use cmt_core::traits::{MemberRepository, RepoResult};
use cmt_core::value_objects::{MemberStatus, Snowflake};

use crate::models::MemberModel;

use super::audit::insert_event;
use super::error::{map_db_error, map_unique_violation, try_map_all};
use super::timeline::insert_status_interval;

const MEMBER_COLUMNS: &str = "id, chapter_id, email, first_name, last_name, badge_number, \
     graduation_year, phone, current_status, current_roles, timeline_version, created_at, updated_at";

fn status_names(statuses: &[MemberStatus]) -> Vec<String> {
    statuses.iter().map(|s| s.as_str().to_string()).collect()
}

#[derive(Clone)]
pub struct PgMemberRepository {
    pool: PgPool,
}

impl PgMemberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemberRepository for PgMemberRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Member>> {
        let result = sqlx::query_as::<_, MemberModel>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(Member::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Member>> {
        let result = sqlx::query_as::<_, MemberModel>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(Member::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn email_exists(&self, email: &str) -> RepoResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM members WHERE LOWER(email) = LOWER($1))",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn list_by_chapter(
        &self,
        chapter_id: Snowflake,
        status: Option<MemberStatus>,
        limit: i64,
        after: Option<Snowflake>,
    ) -> RepoResult<Vec<Member>> {
        let rows = sqlx::query_as::<_, MemberModel>(&format!(
            r#"
            SELECT {MEMBER_COLUMNS}
            FROM members
            WHERE chapter_id = $1
              AND ($2::TEXT IS NULL OR current_status = $2)
              AND ($3::BIGINT IS NULL OR id > $3)
            ORDER BY id
            LIMIT $4
            "#
        ))
        .bind(chapter_id.into_inner())
        .bind(status.map(|s| s.as_str()))
        .bind(after.map(Snowflake::into_inner))
        .bind(limit.clamp(1, 1000))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        try_map_all(rows)
    }

    #[instrument(skip(self))]
    async fn list_page(&self, after: Option<Snowflake>, limit: i64) -> RepoResult<Vec<Member>> {
        let rows = sqlx::query_as::<_, MemberModel>(&format!(
            r#"
            SELECT {MEMBER_COLUMNS}
            FROM members
            WHERE ($1::BIGINT IS NULL OR id > $1)
            ORDER BY id
            LIMIT $2
            "#
        ))
        .bind(after.map(Snowflake::into_inner))
        .bind(limit.clamp(1, 5000))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        try_map_all(rows)
    }

    #[instrument(skip(self))]
    async fn count_by_status(
        &self,
        chapter_id: Snowflake,
        statuses: &[MemberStatus],
    ) -> RepoResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM members WHERE chapter_id = $1 AND current_status = ANY($2)",
        )
        .bind(chapter_id.into_inner())
        .bind(status_names(statuses))
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self, member, password_hash, initial, event), fields(member_id = %member.id))]
    async fn create(
        &self,
        member: &Member,
        password_hash: Option<&str>,
        initial: &[StatusInterval],
        event: &DomainEvent,
    ) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        sqlx::query(
            r#"
            INSERT INTO members (
                id, chapter_id, email, password_hash, first_name, last_name, badge_number,
                graduation_year, phone, current_status, current_roles, timeline_version,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(member.id.into_inner())
        .bind(member.chapter_id.into_inner())
        .bind(&member.email)
        .bind(password_hash)
        .bind(&member.first_name)
        .bind(&member.last_name)
        .bind(member.badge_number)
        .bind(member.graduation_year)
        .bind(&member.phone)
        .bind(member.current_status.as_str())
        .bind(&member.current_roles)
        .bind(member.timeline_version)
        .bind(member.created_at)
        .bind(member.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            let unknown_chapter = e
                .as_database_error()
                .is_some_and(|d| d.is_foreign_key_violation());
            if unknown_chapter {
                DomainError::ChapterNotFound(member.chapter_id.to_string())
            } else {
                map_unique_violation(e, || DomainError::EmailAlreadyExists)
            }
        })?;

        for interval in initial {
            insert_status_interval(&mut tx, interval).await?;
        }
        insert_event(&mut *tx, event).await?;

        tx.commit().await.map_err(map_db_error)?;
        Ok(())
    }

    #[instrument(skip(self, member), fields(member_id = %member.id))]
    async fn update_profile(&self, member: &Member) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE members
            SET email = $2, first_name = $3, last_name = $4, badge_number = $5,
                graduation_year = $6, phone = $7, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(member.id.into_inner())
        .bind(&member.email)
        .bind(&member.first_name)
        .bind(&member.last_name)
        .bind(member.badge_number)
        .bind(member.graduation_year)
        .bind(&member.phone)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, || DomainError::EmailAlreadyExists))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::MemberNotFound(member.id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_password_hash(&self, id: Snowflake) -> RepoResult<Option<String>> {
        let hash = sqlx::query_scalar::<_, Option<String>>(
            "SELECT password_hash FROM members WHERE id = $1",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(hash.flatten())
    }

    #[instrument(skip(self, password_hash))]
    async fn update_password(&self, id: Snowflake, password_hash: &str) -> RepoResult<()> {
        let result = sqlx::query(
            "UPDATE members SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id.into_inner())
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::MemberNotFound(id));
        }

        Ok(())
    }

    #[instrument(skip(self, roles))]
    async fn update_current(
        &self,
        id: Snowflake,
        expected_version: i64,
        status: MemberStatus,
        roles: &[String],
    ) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE members
            SET current_status = $3, current_roles = $4, updated_at = NOW()
            WHERE id = $1 AND timeline_version = $2
            "#,
        )
        .bind(id.into_inner())
        .bind(expected_version)
        .bind(status.as_str())
        .bind(roles)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() == 1)
    }
}
