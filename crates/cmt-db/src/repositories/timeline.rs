//! PostgreSQL implementation of TimelineRepository
//!
//! Status and role history lives in `status_intervals` and `role_intervals`.
//! Every write locks the member row, checks `timeline_version`, applies the
//! interval plans, refreshes the cached current status and roles, and bumps
//! the version, all in one transaction.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, instrument};

use cmt_core::entities::{Chapter, RoleInterval, StatusInterval, TransitionRecord};
use cmt_core::error::DomainError;
use cmt_core::timeline::{MemberTimeline, TimelinePlan};
use cmt_core::traits::{RepoResult, RoleHolder, StalePledge, TimelineRepository, TimelineWrite};
use cmt_core::value_objects::{DateSpan, MemberStatus, Snowflake};

use crate::mappers::{role_holder, stale_pledge};
use crate::models::{
    ChapterModel, RoleHolderModel, RoleIntervalModel, StalePledgeModel, StatusIntervalModel,
    TransitionModel,
};

use super::audit::insert_event;
use super::error::{map_db_error, try_map_all};

// ============================================================================
// Row writers shared with the member repository
// ============================================================================

pub(crate) async fn insert_status_interval(
    conn: &mut PgConnection,
    interval: &StatusInterval,
) -> RepoResult<()> {
    sqlx::query(
        r#"
        INSERT INTO status_intervals (id, member_id, status, start_date, end_date, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(interval.id.into_inner())
    .bind(interval.member_id.into_inner())
    .bind(interval.status.as_str())
    .bind(interval.span.start)
    .bind(interval.span.end)
    .bind(interval.created_at)
    .execute(conn)
    .await
    .map_err(map_db_error)?;
    Ok(())
}

async fn apply_status_plan(
    conn: &mut PgConnection,
    member_id: Snowflake,
    plan: &TimelinePlan<StatusInterval>,
) -> RepoResult<()> {
    if !plan.deletes.is_empty() {
        let ids: Vec<i64> = plan.deletes.iter().map(|id| id.into_inner()).collect();
        sqlx::query("DELETE FROM status_intervals WHERE member_id = $1 AND id = ANY($2)")
            .bind(member_id.into_inner())
            .bind(ids)
            .execute(&mut *conn)
            .await
            .map_err(map_db_error)?;
    }

    for interval in &plan.updates {
        let result = sqlx::query(
            r#"
            UPDATE status_intervals
            SET status = $3, start_date = $4, end_date = $5
            WHERE id = $1 AND member_id = $2
            "#,
        )
        .bind(interval.id.into_inner())
        .bind(member_id.into_inner())
        .bind(interval.status.as_str())
        .bind(interval.span.start)
        .bind(interval.span.end)
        .execute(&mut *conn)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::IntervalNotFound(interval.id));
        }
    }

    for interval in &plan.inserts {
        insert_status_interval(&mut *conn, interval).await?;
    }
    Ok(())
}

async fn apply_role_plan(
    conn: &mut PgConnection,
    member_id: Snowflake,
    plan: &TimelinePlan<RoleInterval>,
) -> RepoResult<()> {
    if !plan.deletes.is_empty() {
        let ids: Vec<i64> = plan.deletes.iter().map(|id| id.into_inner()).collect();
        sqlx::query("DELETE FROM role_intervals WHERE member_id = $1 AND id = ANY($2)")
            .bind(member_id.into_inner())
            .bind(ids)
            .execute(&mut *conn)
            .await
            .map_err(map_db_error)?;
    }

    for interval in &plan.updates {
        let result = sqlx::query(
            r#"
            UPDATE role_intervals
            SET role = $3, start_date = $4, end_date = $5
            WHERE id = $1 AND member_id = $2
            "#,
        )
        .bind(interval.id.into_inner())
        .bind(member_id.into_inner())
        .bind(&interval.role)
        .bind(interval.span.start)
        .bind(interval.span.end)
        .execute(&mut *conn)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::IntervalNotFound(interval.id));
        }
    }

    for interval in &plan.inserts {
        sqlx::query(
            r#"
            INSERT INTO role_intervals (id, member_id, role, start_date, end_date, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(interval.id.into_inner())
        .bind(interval.member_id.into_inner())
        .bind(&interval.role)
        .bind(interval.span.start)
        .bind(interval.span.end)
        .bind(interval.created_at)
        .execute(&mut *conn)
        .await
        .map_err(map_db_error)?;
    }
    Ok(())
}

async fn insert_transition(conn: &mut PgConnection, record: &TransitionRecord) -> RepoResult<()> {
    let payload = serde_json::to_value(&record.transition)
        .map_err(|e| DomainError::InternalError(format!("transition serialization failed: {e}")))?;

    sqlx::query(
        r#"
        INSERT INTO transitions (id, member_id, kind, payload, effective_date, submitted_by, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(record.id.into_inner())
    .bind(record.member_id.into_inner())
    .bind(record.kind())
    .bind(payload)
    .bind(record.effective_date)
    .bind(record.submitted_by.map(Snowflake::into_inner))
    .bind(record.created_at)
    .execute(conn)
    .await
    .map_err(map_db_error)?;
    Ok(())
}

/// Lock the member row and verify nobody wrote since the timeline was read
async fn lock_version(conn: &mut PgConnection, write: &TimelineWrite) -> RepoResult<()> {
    let version = sqlx::query_scalar::<_, i64>(
        "SELECT timeline_version FROM members WHERE id = $1 FOR UPDATE",
    )
    .bind(write.member_id.into_inner())
    .fetch_optional(conn)
    .await
    .map_err(map_db_error)?
    .ok_or(DomainError::MemberNotFound(write.member_id))?;

    if version != write.expected_version {
        debug!(
            member_id = %write.member_id,
            expected = write.expected_version,
            found = version,
            "Stale timeline write"
        );
        return Err(DomainError::TimelineConflict(write.member_id));
    }
    Ok(())
}

async fn apply_one(conn: &mut PgConnection, write: &TimelineWrite) -> RepoResult<()> {
    lock_version(&mut *conn, write).await?;
    apply_status_plan(&mut *conn, write.member_id, &write.statuses).await?;
    apply_role_plan(&mut *conn, write.member_id, &write.roles).await?;

    sqlx::query(
        r#"
        UPDATE members
        SET current_status = $2,
            current_roles = $3,
            chapter_id = COALESCE($4, chapter_id),
            timeline_version = timeline_version + 1,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(write.member_id.into_inner())
    .bind(write.current_status.as_str())
    .bind(&write.current_roles)
    .bind(write.chapter_id.map(Snowflake::into_inner))
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        let unknown_chapter = e
            .as_database_error()
            .is_some_and(|d| d.is_foreign_key_violation());
        match write.chapter_id {
            Some(chapter_id) if unknown_chapter => DomainError::ChapterNotFound(chapter_id.to_string()),
            _ => map_db_error(e),
        }
    })?;

    if let Some(record) = &write.transition {
        insert_transition(&mut *conn, record).await?;
    }
    for event in &write.events {
        insert_event(&mut *conn, event).await?;
    }
    Ok(())
}

fn status_names(statuses: &[MemberStatus]) -> Vec<String> {
    statuses.iter().map(|s| s.as_str().to_string()).collect()
}

#[derive(Clone)]
pub struct PgTimelineRepository {
    pool: PgPool,
}

impl PgTimelineRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TimelineRepository for PgTimelineRepository {
    #[instrument(skip(self))]
    async fn load(&self, member_id: Snowflake) -> RepoResult<Option<MemberTimeline>> {
        let Some(version) =
            sqlx::query_scalar::<_, i64>("SELECT timeline_version FROM members WHERE id = $1")
                .bind(member_id.into_inner())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_db_error)?
        else {
            return Ok(None);
        };

        let statuses = sqlx::query_as::<_, StatusIntervalModel>(
            r#"
            SELECT id, member_id, status, start_date, end_date, created_at
            FROM status_intervals
            WHERE member_id = $1
            ORDER BY start_date, id
            "#,
        )
        .bind(member_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        let roles = sqlx::query_as::<_, RoleIntervalModel>(
            r#"
            SELECT id, member_id, role, start_date, end_date, created_at
            FROM role_intervals
            WHERE member_id = $1
            ORDER BY start_date, id
            "#,
        )
        .bind(member_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(Some(MemberTimeline::new(
            member_id,
            version,
            try_map_all(statuses)?,
            try_map_all(roles)?,
        )))
    }

    #[instrument(skip(self, writes), fields(count = writes.len()))]
    async fn apply(&self, writes: &[TimelineWrite]) -> RepoResult<()> {
        if writes.is_empty() {
            return Ok(());
        }

        // Lock members in id order so concurrent multi-member writes
        // (elections) cannot deadlock.
        let mut ordered: Vec<&TimelineWrite> = writes.iter().collect();
        ordered.sort_by_key(|w| w.member_id);

        let mut tx = self.pool.begin().await.map_err(map_db_error)?;
        for write in ordered {
            apply_one(&mut tx, write).await?;
        }
        tx.commit().await.map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_transitions(&self, member_id: Snowflake) -> RepoResult<Vec<TransitionRecord>> {
        let rows = sqlx::query_as::<_, TransitionModel>(
            r#"
            SELECT id, member_id, kind, payload, effective_date, submitted_by, created_at
            FROM transitions
            WHERE member_id = $1
            ORDER BY effective_date, created_at
            "#,
        )
        .bind(member_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        try_map_all(rows)
    }

    #[instrument(skip(self))]
    async fn members_with_overlaps(&self) -> RepoResult<Vec<Snowflake>> {
        let ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT DISTINCT a.member_id
            FROM status_intervals a
            JOIN status_intervals b
              ON a.member_id = b.member_id
             AND a.id < b.id
             AND a.start_date <= b.end_date
             AND b.start_date <= a.end_date
            ORDER BY a.member_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(ids.into_iter().map(Snowflake::new).collect())
    }

    #[instrument(skip(self))]
    async fn count_status_starts(
        &self,
        chapter_id: Snowflake,
        status: MemberStatus,
        span: DateSpan,
    ) -> RepoResult<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(DISTINCT s.member_id)
            FROM status_intervals s
            JOIN members m ON m.id = s.member_id
            WHERE m.chapter_id = $1
              AND s.status = $2
              AND s.start_date BETWEEN $3 AND $4
            "#,
        )
        .bind(chapter_id.into_inner())
        .bind(status.as_str())
        .bind(span.start)
        .bind(span.end)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn count_initiated_pledges(&self, chapter_id: Snowflake, span: DateSpan) -> RepoResult<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(DISTINCT p.member_id)
            FROM status_intervals p
            JOIN members m ON m.id = p.member_id
            WHERE m.chapter_id = $1
              AND p.status = 'pnm'
              AND p.start_date BETWEEN $2 AND $3
              AND EXISTS (
                  SELECT 1 FROM status_intervals a
                  WHERE a.member_id = p.member_id
                    AND a.status = 'active'
                    AND a.start_date > p.start_date
              )
            "#,
        )
        .bind(chapter_id.into_inner())
        .bind(span.start)
        .bind(span.end)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn count_status_on(
        &self,
        chapter_id: Snowflake,
        statuses: &[MemberStatus],
        day: NaiveDate,
    ) -> RepoResult<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(DISTINCT s.member_id)
            FROM status_intervals s
            JOIN members m ON m.id = s.member_id
            WHERE m.chapter_id = $1
              AND s.status = ANY($2)
              AND s.start_date <= $3
              AND s.end_date >= $3
            "#,
        )
        .bind(chapter_id.into_inner())
        .bind(status_names(statuses))
        .bind(day)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn stale_pledges(
        &self,
        chapter_id: Option<Snowflake>,
        cutoff: NaiveDate,
        today: NaiveDate,
    ) -> RepoResult<Vec<StalePledge>> {
        let rows = sqlx::query_as::<_, StalePledgeModel>(
            r#"
            SELECT m.id AS member_id, m.chapter_id, m.first_name, m.last_name, m.email,
                   s.start_date AS pledged_on
            FROM status_intervals s
            JOIN members m ON m.id = s.member_id
            WHERE s.status = 'pnm'
              AND s.start_date < $1
              AND s.start_date <= $2
              AND s.end_date >= $2
              AND ($3::BIGINT IS NULL OR m.chapter_id = $3)
            ORDER BY m.chapter_id, s.start_date, m.id
            "#,
        )
        .bind(cutoff)
        .bind(today)
        .bind(chapter_id.map(Snowflake::into_inner))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().map(stale_pledge).collect())
    }

    #[instrument(skip(self))]
    async fn chapters_without_pledges_since(&self, since: NaiveDate) -> RepoResult<Vec<Chapter>> {
        let rows = sqlx::query_as::<_, ChapterModel>(
            r#"
            SELECT c.id, c.name, c.slug, c.school, c.region, c.active, c.created_at, c.updated_at
            FROM chapters c
            WHERE c.active
              AND NOT EXISTS (
                  SELECT 1
                  FROM status_intervals s
                  JOIN members m ON m.id = s.member_id
                  WHERE m.chapter_id = c.id
                    AND s.status = 'pnm'
                    AND s.start_date >= $1
              )
            ORDER BY c.name
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().map(Chapter::from).collect())
    }

    #[instrument(skip(self))]
    async fn roles_on(&self, chapter_id: Snowflake, day: NaiveDate) -> RepoResult<Vec<RoleHolder>> {
        let rows = sqlx::query_as::<_, RoleHolderModel>(
            r#"
            SELECT r.id, r.member_id, r.role, r.start_date, r.end_date, r.created_at,
                   m.chapter_id, m.first_name, m.last_name
            FROM role_intervals r
            JOIN members m ON m.id = r.member_id
            WHERE m.chapter_id = $1
              AND r.start_date <= $2
              AND r.end_date >= $2
            ORDER BY r.role, r.start_date, r.id
            "#,
        )
        .bind(chapter_id.into_inner())
        .bind(day)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        rows.into_iter().map(role_holder).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PgTimelineRepository>();
    }
}
