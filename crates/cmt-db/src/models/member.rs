//! Member database model

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

/// Database model for the members table (without the password hash)
#[derive(Debug, Clone, FromRow)]
pub struct MemberModel {
    pub id: i64,
    pub chapter_id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub badge_number: Option<i32>,
    pub graduation_year: Option<i32>,
    pub phone: Option<String>,
    /// Stored lowercase, parsed into `MemberStatus`
    pub current_status: String,
    #[sqlx(default)]
    pub current_roles: Vec<String>,
    pub timeline_version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row of the stale pledge report
#[derive(Debug, Clone, FromRow)]
pub struct StalePledgeModel {
    pub member_id: i64,
    pub chapter_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub pledged_on: NaiveDate,
}
