//! Audit log database model

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::FromRow;

/// Database model for the audit_log table
#[derive(Debug, Clone, FromRow)]
pub struct AuditLogModel {
    pub id: i64,
    pub event_type: String,
    pub member_id: Option<i64>,
    pub chapter_id: Option<i64>,
    pub actor_id: Option<i64>,
    /// The serialized `DomainEvent`
    pub payload: JsonValue,
    pub created_at: DateTime<Utc>,
}
