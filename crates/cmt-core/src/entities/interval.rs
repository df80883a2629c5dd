//! Status and role intervals - one date-ranged period of a member's history

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::timeline::Interval;
use crate::value_objects::{DateSpan, MemberStatus, Snowflake};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusInterval {
    pub id: Snowflake,
    pub member_id: Snowflake,
    pub status: MemberStatus,
    pub span: DateSpan,
    pub created_at: DateTime<Utc>,
}

impl StatusInterval {
    pub fn new(id: Snowflake, member_id: Snowflake, status: MemberStatus, span: DateSpan) -> Self {
        Self {
            id,
            member_id,
            status,
            span,
            created_at: Utc::now(),
        }
    }

    #[inline]
    pub fn start(&self) -> NaiveDate {
        self.span.start
    }

    #[inline]
    pub fn end(&self) -> NaiveDate {
        self.span.end
    }
}

impl Interval for StatusInterval {
    fn id(&self) -> Snowflake {
        self.id
    }

    fn span(&self) -> DateSpan {
        self.span
    }

    fn respan(&self, id: Snowflake, span: DateSpan) -> Self {
        Self {
            id,
            span,
            ..self.clone()
        }
    }

    fn same_value(&self, other: &Self) -> bool {
        self.status == other.status
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleInterval {
    pub id: Snowflake,
    pub member_id: Snowflake,
    /// Normalized role name, see [`crate::value_objects::normalize_role`]
    pub role: String,
    pub span: DateSpan,
    pub created_at: DateTime<Utc>,
}

impl RoleInterval {
    pub fn new(id: Snowflake, member_id: Snowflake, role: String, span: DateSpan) -> Self {
        Self {
            id,
            member_id,
            role,
            span,
            created_at: Utc::now(),
        }
    }
}

impl Interval for RoleInterval {
    fn id(&self) -> Snowflake {
        self.id
    }

    fn span(&self) -> DateSpan {
        self.span
    }

    fn respan(&self, id: Snowflake, span: DateSpan) -> Self {
        Self {
            id,
            span,
            ..self.clone()
        }
    }

    fn same_value(&self, other: &Self) -> bool {
        self.role == other.role
    }
}
