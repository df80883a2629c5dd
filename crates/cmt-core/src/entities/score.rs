//! Scoring entities - score types, reported activities, and term totals

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;
use crate::value_objects::{Snowflake, YearTerm};

macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $(t if t.eq_ignore_ascii_case($text) => Ok(Self::$variant),)+
                    other => Err(DomainError::ValidationError(format!(
                        concat!("unknown ", stringify!($name), ": {}"),
                        other
                    ))),
                }
            }
        }
    };
}

/// Scoring section a score type counts toward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Section {
    #[serde(rename = "Bro")]
    Brotherhood,
    #[serde(rename = "Ops")]
    Operations,
    #[serde(rename = "Pro")]
    Professional,
    #[serde(rename = "Ser")]
    Service,
}

string_enum!(Section {
    Brotherhood => "Bro",
    Operations => "Ops",
    Professional => "Pro",
    Service => "Ser",
});

/// How a score type is earned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoreKind {
    /// Reported events with attendance counts
    #[serde(rename = "Evt")]
    Event,
    /// Document submissions worth a flat score
    #[serde(rename = "Sub")]
    Submission,
    /// Computed by the special-score batch job
    #[serde(rename = "Spe")]
    Special,
}

string_enum!(ScoreKind {
    Event => "Evt",
    Submission => "Sub",
    Special => "Spe",
});

/// Batch-computed score families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialScore {
    PledgeRatio,
    Membership,
    ReportReview,
    /// Adopted the national new member education program
    PledgeProgram,
}

string_enum!(SpecialScore {
    PledgeRatio => "pledge_ratio",
    Membership => "membership",
    ReportReview => "report_review",
    PledgeProgram => "pledge_program",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreType {
    pub id: Snowflake,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub section: Section,
    pub kind: ScoreKind,
    /// Cap on the sum of both terms of a school year
    pub points: f64,
    /// Cap on a single term
    pub term_points: f64,
    /// Empty means the default linear formula
    pub formula: String,
    pub base_points: f64,
    pub attendance_multiplier: f64,
    pub member_add: f64,
    pub stem_add: f64,
    pub alumni_add: f64,
    pub guest_add: f64,
    pub special: Option<SpecialScore>,
    pub created_at: DateTime<Utc>,
}

impl ScoreType {
    pub fn new(
        id: Snowflake,
        slug: String,
        name: String,
        section: Section,
        kind: ScoreKind,
        points: f64,
        term_points: f64,
    ) -> Self {
        Self {
            id,
            slug,
            name,
            description: String::new(),
            section,
            kind,
            points,
            term_points,
            formula: String::new(),
            base_points: 0.0,
            attendance_multiplier: 0.0,
            member_add: 0.0,
            stem_add: 0.0,
            alumni_add: 0.0,
            guest_add: 0.0,
            special: None,
            created_at: Utc::now(),
        }
    }
}

/// Attendance figures reported with an event
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityCounts {
    pub members: i32,
    pub alumni: i32,
    pub guests: i32,
    pub stem: i32,
    pub hours: f64,
    pub miles: f64,
}

/// A reported event or submission that earns points for its chapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: Snowflake,
    pub chapter_id: Snowflake,
    pub score_type_id: Snowflake,
    pub kind: ScoreKind,
    pub name: String,
    pub date: NaiveDate,
    pub counts: ActivityCounts,
    pub score: f64,
    pub created_by: Option<Snowflake>,
    pub created_at: DateTime<Utc>,
}

impl Activity {
    pub fn term(&self) -> YearTerm {
        YearTerm::containing(self.date)
    }
}

/// Recorded total for one chapter, score type, and term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterScore {
    pub chapter_id: Snowflake,
    pub score_type_id: Snowflake,
    pub term: YearTerm,
    pub score: f64,
    pub updated_at: DateTime<Utc>,
}

impl ChapterScore {
    pub fn new(chapter_id: Snowflake, score_type_id: Snowflake, term: YearTerm, score: f64) -> Self {
        Self {
            chapter_id,
            score_type_id,
            term,
            score,
            updated_at: Utc::now(),
        }
    }
}
