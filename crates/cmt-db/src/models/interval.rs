//! Status and role interval database models

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

/// Database model for the status_intervals table
#[derive(Debug, Clone, FromRow)]
pub struct StatusIntervalModel {
    pub id: i64,
    pub member_id: i64,
    pub status: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Database model for the role_intervals table
#[derive(Debug, Clone, FromRow)]
pub struct RoleIntervalModel {
    pub id: i64,
    pub member_id: i64,
    pub role: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Role interval joined with its holder
#[derive(Debug, Clone, FromRow)]
pub struct RoleHolderModel {
    pub id: i64,
    pub member_id: i64,
    pub role: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub chapter_id: i64,
    pub first_name: String,
    pub last_name: String,
}
