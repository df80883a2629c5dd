//! Member entity - a person on exactly one chapter's roster

use chrono::{DateTime, Utc};

use crate::value_objects::{MemberStatus, Permissions, Snowflake};

/// A member record.
///
/// `current_status` and `current_roles` are a cache of the status and role
/// timelines as of the last write or nightly sync. The interval tables are
/// the source of truth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: Snowflake,
    pub chapter_id: Snowflake,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub badge_number: Option<i32>,
    pub graduation_year: Option<i32>,
    pub phone: Option<String>,
    pub current_status: MemberStatus,
    pub current_roles: Vec<String>,
    /// Bumped on every timeline write, used as an optimistic lock
    pub timeline_version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    pub fn new(
        id: Snowflake,
        chapter_id: Snowflake,
        email: String,
        first_name: String,
        last_name: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            chapter_id,
            email,
            first_name,
            last_name,
            badge_number: None,
            graduation_year: None,
            phone: None,
            current_status: MemberStatus::Pnm,
            current_roles: Vec::new(),
            timeline_version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    #[inline]
    pub fn has_role(&self, role: &str) -> bool {
        self.current_roles.iter().any(|r| r == role)
    }

    /// Permissions this member holds on `chapter_id`
    pub fn permissions_in(&self, chapter_id: Snowflake) -> Permissions {
        let own = Permissions::from_roles(self.current_roles.iter().map(String::as_str));
        if own.is_national() || chapter_id == self.chapter_id {
            own
        } else {
            Permissions::empty()
        }
    }
}
