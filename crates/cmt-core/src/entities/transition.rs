//! Transition record - one submitted form that changed a member's timeline

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::timeline::Transition;
use crate::value_objects::Snowflake;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub id: Snowflake,
    pub member_id: Snowflake,
    pub transition: Transition,
    pub effective_date: NaiveDate,
    /// `None` for batch jobs and CLI runs
    pub submitted_by: Option<Snowflake>,
    pub created_at: DateTime<Utc>,
}

impl TransitionRecord {
    pub fn new(
        id: Snowflake,
        member_id: Snowflake,
        transition: Transition,
        effective_date: NaiveDate,
        submitted_by: Option<Snowflake>,
    ) -> Self {
        Self {
            id,
            member_id,
            transition,
            effective_date,
            submitted_by,
            created_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.transition.kind()
    }
}
