//! Membership status values

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// Status a member holds on a given day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Active,
    /// Initiation submitted, awaiting national approval
    Activepend,
    /// Graduation submitted, awaiting confirmation
    Alumnipend,
    /// Prospective new member (pledge)
    Pnm,
    Away,
    Alumni,
    Depledge,
    Resigned,
    Expelled,
    Advisor,
    Nonmember,
    Friend,
    Deceased,
    Suspended,
    Probation,
}

impl MemberStatus {
    pub const ALL: [MemberStatus; 15] = [
        Self::Active,
        Self::Activepend,
        Self::Alumnipend,
        Self::Pnm,
        Self::Away,
        Self::Alumni,
        Self::Depledge,
        Self::Resigned,
        Self::Expelled,
        Self::Advisor,
        Self::Nonmember,
        Self::Friend,
        Self::Deceased,
        Self::Suspended,
        Self::Probation,
    ];

    /// Statuses counted toward a chapter's active size
    pub const COUNTS_AS_ACTIVE: [MemberStatus; 3] =
        [Self::Active, Self::Activepend, Self::Alumnipend];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Activepend => "activepend",
            Self::Alumnipend => "alumnipend",
            Self::Pnm => "pnm",
            Self::Away => "away",
            Self::Alumni => "alumni",
            Self::Depledge => "depledge",
            Self::Resigned => "resigned",
            Self::Expelled => "expelled",
            Self::Advisor => "advisor",
            Self::Nonmember => "nonmember",
            Self::Friend => "friend",
            Self::Deceased => "deceased",
            Self::Suspended => "suspended",
            Self::Probation => "probation",
        }
    }

    /// No transition leaves a terminal status except an admin override.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Expelled | Self::Deceased)
    }

    #[inline]
    pub fn counts_as_active(&self) -> bool {
        Self::COUNTS_AS_ACTIVE.contains(self)
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == needle)
            .ok_or_else(|| DomainError::UnknownStatus(s.to_string()))
    }
}
