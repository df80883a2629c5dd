//! Scoring database models

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

/// Database model for the score_types table
#[derive(Debug, Clone, FromRow)]
pub struct ScoreTypeModel {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub section: String,
    pub kind: String,
    pub points: f64,
    pub term_points: f64,
    pub formula: String,
    pub base_points: f64,
    pub attendance_multiplier: f64,
    pub member_add: f64,
    pub stem_add: f64,
    pub alumni_add: f64,
    pub guest_add: f64,
    pub special: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Database model for the activities table
#[derive(Debug, Clone, FromRow)]
pub struct ActivityModel {
    pub id: i64,
    pub chapter_id: i64,
    pub score_type_id: i64,
    pub kind: String,
    pub name: String,
    pub activity_date: NaiveDate,
    pub members: i32,
    pub alumni: i32,
    pub guests: i32,
    pub stem: i32,
    pub hours: f64,
    pub miles: f64,
    pub score: f64,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Database model for the chapter_scores table
#[derive(Debug, Clone, FromRow)]
pub struct ChapterScoreModel {
    pub chapter_id: i64,
    pub score_type_id: i64,
    pub year: i32,
    pub term: String,
    pub score: f64,
    pub updated_at: DateTime<Utc>,
}
