//! PostgreSQL implementation of AuditRepository
//!
//! Events are stored as tagged JSON next to the columns used to look them up.

use async_trait::async_trait;
use sqlx::{PgExecutor, PgPool};
use tracing::{instrument, warn};

use cmt_core::error::DomainError;
use cmt_core::events::DomainEvent;
use cmt_core::traits::{AuditRepository, RepoResult};
use cmt_core::value_objects::Snowflake;

use crate::models::AuditLogModel;

use super::error::map_db_error;

/// Append one event through any executor, so mutations can log inside
/// their own transaction.
pub(crate) async fn insert_event<'e, E>(executor: E, event: &DomainEvent) -> RepoResult<()>
where
    E: PgExecutor<'e>,
{
    let payload = serde_json::to_value(event)
        .map_err(|e| DomainError::InternalError(format!("event serialization failed: {e}")))?;

    sqlx::query(
        r#"
        INSERT INTO audit_log (event_type, member_id, chapter_id, actor_id, payload, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(event.event_type())
    .bind(event.member_id().map(Snowflake::into_inner))
    .bind(event.chapter_id().map(Snowflake::into_inner))
    .bind(event.actor_id().map(Snowflake::into_inner))
    .bind(payload)
    .bind(event.timestamp())
    .execute(executor)
    .await
    .map_err(map_db_error)?;

    Ok(())
}

#[derive(Clone)]
pub struct PgAuditRepository {
    pool: PgPool,
}

impl PgAuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for PgAuditRepository {
    #[instrument(skip(self, event), fields(event_type = event.event_type()))]
    async fn append(&self, event: &DomainEvent) -> RepoResult<()> {
        insert_event(&self.pool, event).await
    }

    #[instrument(skip(self))]
    async fn list_for_member(&self, member_id: Snowflake, limit: i64) -> RepoResult<Vec<DomainEvent>> {
        let rows = sqlx::query_as::<_, AuditLogModel>(
            r#"
            SELECT id, event_type, member_id, chapter_id, actor_id, payload, created_at
            FROM audit_log
            WHERE member_id = $1
            ORDER BY id DESC
            LIMIT $2
            "#,
        )
        .bind(member_id.into_inner())
        .bind(limit.clamp(1, 500))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        // Rows written by an older event schema are skipped rather than
        // failing the whole history.
        let events = rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value(row.payload) {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!(audit_id = row.id, event_type = %row.event_type, error = %e, "Undecodable audit row");
                    None
                }
            })
            .collect();

        Ok(events)
    }
}
