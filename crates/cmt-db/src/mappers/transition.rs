//! Transition record entity <-> model mapper

use cmt_core::entities::TransitionRecord;
use cmt_core::error::DomainError;
use cmt_core::value_objects::Snowflake;

use crate::models::TransitionModel;

use super::corrupt;

impl TryFrom<TransitionModel> for TransitionRecord {
    type Error = DomainError;

    fn try_from(model: TransitionModel) -> Result<Self, Self::Error> {
        let transition =
            serde_json::from_value(model.payload).map_err(|e| corrupt("transitions.payload", e))?;

        Ok(TransitionRecord {
            id: Snowflake::new(model.id),
            member_id: Snowflake::new(model.member_id),
            transition,
            effective_date: model.effective_date,
            submitted_by: model.submitted_by.map(Snowflake::new),
            created_at: model.created_at,
        })
    }
}
