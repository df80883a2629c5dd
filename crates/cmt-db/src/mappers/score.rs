//! Score type, activity, and chapter score mappers

use cmt_core::entities::{Activity, ActivityCounts, ChapterScore, ScoreType, SpecialScore};
use cmt_core::error::DomainError;
use cmt_core::value_objects::{Snowflake, YearTerm};

use crate::models::{ActivityModel, ChapterScoreModel, ScoreTypeModel};

use super::corrupt;

impl TryFrom<ScoreTypeModel> for ScoreType {
    type Error = DomainError;

    fn try_from(model: ScoreTypeModel) -> Result<Self, Self::Error> {
        let special = model
            .special
            .as_deref()
            .map(str::parse::<SpecialScore>)
            .transpose()
            .map_err(|e| corrupt("score_types.special", e))?;

        Ok(ScoreType {
            id: Snowflake::new(model.id),
            slug: model.slug,
            name: model.name,
            description: model.description,
            section: model
                .section
                .parse()
                .map_err(|e| corrupt("score_types.section", e))?,
            kind: model.kind.parse().map_err(|e| corrupt("score_types.kind", e))?,
            points: model.points,
            term_points: model.term_points,
            formula: model.formula,
            base_points: model.base_points,
            attendance_multiplier: model.attendance_multiplier,
            member_add: model.member_add,
            stem_add: model.stem_add,
            alumni_add: model.alumni_add,
            guest_add: model.guest_add,
            special,
            created_at: model.created_at,
        })
    }
}

/// Column values for inserting a score type
pub struct ScoreTypeInsert<'a> {
    pub section: &'static str,
    pub kind: &'static str,
    pub special: Option<&'static str>,
    pub score_type: &'a ScoreType,
}

impl<'a> ScoreTypeInsert<'a> {
    pub fn new(score_type: &'a ScoreType) -> Self {
        Self {
            section: score_type.section.as_str(),
            kind: score_type.kind.as_str(),
            special: score_type.special.map(|s| s.as_str()),
            score_type,
        }
    }
}

impl TryFrom<ActivityModel> for Activity {
    type Error = DomainError;

    fn try_from(model: ActivityModel) -> Result<Self, Self::Error> {
        Ok(Activity {
            id: Snowflake::new(model.id),
            chapter_id: Snowflake::new(model.chapter_id),
            score_type_id: Snowflake::new(model.score_type_id),
            kind: model.kind.parse().map_err(|e| corrupt("activities.kind", e))?,
            name: model.name,
            date: model.activity_date,
            counts: ActivityCounts {
                members: model.members,
                alumni: model.alumni,
                guests: model.guests,
                stem: model.stem,
                hours: model.hours,
                miles: model.miles,
            },
            score: model.score,
            created_by: model.created_by.map(Snowflake::new),
            created_at: model.created_at,
        })
    }
}

pub fn chapter_score(model: ChapterScoreModel) -> Result<ChapterScore, DomainError> {
    let term = model
        .term
        .parse()
        .map_err(|e| corrupt("chapter_scores.term", e))?;

    Ok(ChapterScore {
        chapter_id: Snowflake::new(model.chapter_id),
        score_type_id: Snowflake::new(model.score_type_id),
        term: YearTerm::new(model.year, term),
        score: model.score,
        updated_at: model.updated_at,
    })
}
