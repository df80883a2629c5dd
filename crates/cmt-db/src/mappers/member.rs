//! Member entity <-> model mapper

use cmt_core::entities::Member;
use cmt_core::error::DomainError;
use cmt_core::traits::StalePledge;
use cmt_core::value_objects::Snowflake;

use crate::models::{MemberModel, StalePledgeModel};

use super::corrupt;

impl TryFrom<MemberModel> for Member {
    type Error = DomainError;

    fn try_from(model: MemberModel) -> Result<Self, Self::Error> {
        let current_status = model
            .current_status
            .parse()
            .map_err(|e| corrupt("members.current_status", e))?;

        Ok(Member {
            id: Snowflake::new(model.id),
            chapter_id: Snowflake::new(model.chapter_id),
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            badge_number: model.badge_number,
            graduation_year: model.graduation_year,
            phone: model.phone,
            current_status,
            current_roles: model.current_roles,
            timeline_version: model.timeline_version,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

pub fn stale_pledge(model: StalePledgeModel) -> StalePledge {
    StalePledge {
        member_id: Snowflake::new(model.member_id),
        chapter_id: Snowflake::new(model.chapter_id),
        name: format!("{} {}", model.first_name, model.last_name),
        email: model.email,
        pledged_on: model.pledged_on,
    }
}
