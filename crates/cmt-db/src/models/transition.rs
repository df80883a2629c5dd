//! Transition database model

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value as JsonValue;
use sqlx::FromRow;

/// Database model for the transitions table
#[derive(Debug, Clone, FromRow)]
pub struct TransitionModel {
    pub id: i64,
    pub member_id: i64,
    pub kind: String,
    /// The serialized `Transition`, tagged by `kind`
    pub payload: JsonValue,
    pub effective_date: NaiveDate,
    pub submitted_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}
