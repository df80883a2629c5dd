//! Chapter entity <-> model mapper

use cmt_core::entities::Chapter;
use cmt_core::value_objects::Snowflake;

use crate::models::ChapterModel;

impl From<ChapterModel> for Chapter {
    fn from(model: ChapterModel) -> Self {
        Chapter {
            id: Snowflake::new(model.id),
            name: model.name,
            slug: model.slug,
            school: model.school,
            region: model.region,
            active: model.active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
