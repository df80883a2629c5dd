//! Officer and committee role names
//!
//! Roles are free-form lowercase strings. Known names fall into categories
//! that drive authorization.

use serde::{Deserialize, Serialize};

pub const CHAPTER_OFFICER_ROLES: &[&str] = &[
    "corresponding secretary",
    "president",
    "regent",
    "scribe",
    "secretary",
    "treasurer",
    "vice president",
    "vice regent",
];

pub const NATIONAL_OFFICER_ROLES: &[&str] = &[
    "regional director",
    "national director",
    "national officer",
];

pub const COMMITTEE_CHAIR_ROLES: &[&str] = &[
    "alumni adviser",
    "board member",
    "committee chair",
    "employer/ee",
    "fundraising chair",
    "house corporation president",
    "other appointee",
    "pd chair",
    "pledge/new member educator",
    "project chair",
    "recruitment chair",
    "risk management chair",
    "rube goldberg chair",
    "rush chair",
    "scholarship chair",
    "service chair",
    "social/brotherhood chair",
    "website/social media chair",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleCategory {
    ChapterOfficer,
    NationalOfficer,
    CommitteeChair,
    Other,
}

impl RoleCategory {
    pub fn of(role: &str) -> Self {
        let role = normalize_role(role);
        if NATIONAL_OFFICER_ROLES.contains(&role.as_str()) {
            Self::NationalOfficer
        } else if CHAPTER_OFFICER_ROLES.contains(&role.as_str()) {
            Self::ChapterOfficer
        } else if COMMITTEE_CHAIR_ROLES.contains(&role.as_str()) {
            Self::CommitteeChair
        } else {
            Self::Other
        }
    }
}

/// Canonical form used for storage and comparison
pub fn normalize_role(role: &str) -> String {
    role.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
