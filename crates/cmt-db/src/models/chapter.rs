//! Chapter database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for the chapters table
#[derive(Debug, Clone, FromRow)]
pub struct ChapterModel {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub school: Option<String>,
    pub region: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
