//! Status/role interval entity <-> model mapper

use cmt_core::entities::{RoleInterval, StatusInterval};
use cmt_core::error::DomainError;
use cmt_core::traits::RoleHolder;
use cmt_core::value_objects::{DateSpan, Snowflake};

use crate::models::{RoleHolderModel, RoleIntervalModel, StatusIntervalModel};

use super::corrupt;

fn span(table: &str, start: chrono::NaiveDate, end: chrono::NaiveDate) -> Result<DateSpan, DomainError> {
    DateSpan::new(start, end).map_err(|e| corrupt(table, e))
}

impl TryFrom<StatusIntervalModel> for StatusInterval {
    type Error = DomainError;

    fn try_from(model: StatusIntervalModel) -> Result<Self, Self::Error> {
        Ok(StatusInterval {
            id: Snowflake::new(model.id),
            member_id: Snowflake::new(model.member_id),
            status: model
                .status
                .parse()
                .map_err(|e| corrupt("status_intervals.status", e))?,
            span: span("status_intervals", model.start_date, model.end_date)?,
            created_at: model.created_at,
        })
    }
}

impl TryFrom<RoleIntervalModel> for RoleInterval {
    type Error = DomainError;

    fn try_from(model: RoleIntervalModel) -> Result<Self, Self::Error> {
        Ok(RoleInterval {
            id: Snowflake::new(model.id),
            member_id: Snowflake::new(model.member_id),
            role: model.role,
            span: span("role_intervals", model.start_date, model.end_date)?,
            created_at: model.created_at,
        })
    }
}

pub fn role_holder(model: RoleHolderModel) -> Result<RoleHolder, DomainError> {
    Ok(RoleHolder {
        interval: RoleInterval {
            id: Snowflake::new(model.id),
            member_id: Snowflake::new(model.member_id),
            role: model.role,
            span: span("role_intervals", model.start_date, model.end_date)?,
            created_at: model.created_at,
        },
        chapter_id: Snowflake::new(model.chapter_id),
        name: format!("{} {}", model.first_name, model.last_name),
    })
}
