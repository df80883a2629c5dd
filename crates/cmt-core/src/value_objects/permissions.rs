//! Permission flags derived from a member's current roles
//!
//! Nothing is stored. Each request recomputes the set from the roles that
//! cover today, scoped to the member's own chapter. National officers hold
//! every permission on every chapter.

use bitflags::bitflags;

use crate::value_objects::RoleCategory;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Permissions: u32 {
        /// Read own record and history
        const VIEW_SELF        = 1 << 0;
        /// Read the chapter roster and officer list
        const VIEW_ROSTER      = 1 << 1;
        /// Edit own profile fields
        const EDIT_SELF        = 1 << 2;
        /// Add members and submit status transitions
        const MANAGE_MEMBERS   = 1 << 3;
        /// Assign and end roles, run elections
        const MANAGE_ROLES     = 1 << 4;
        /// Report events and submissions for scoring
        const RECORD_ACTIVITY  = 1 << 5;
        /// Create and edit chapters
        const MANAGE_CHAPTERS  = 1 << 6;
        /// Edit score types and trigger recalculation
        const MANAGE_SCORING   = 1 << 7;
        /// Bypass every check
        const NATIONAL         = 1 << 8;

        const MEMBER = Self::VIEW_SELF.bits()
            | Self::VIEW_ROSTER.bits()
            | Self::EDIT_SELF.bits();

        const COMMITTEE_CHAIR = Self::MEMBER.bits()
            | Self::RECORD_ACTIVITY.bits();

        const CHAPTER_OFFICER = Self::COMMITTEE_CHAIR.bits()
            | Self::MANAGE_MEMBERS.bits()
            | Self::MANAGE_ROLES.bits();
    }
}

impl Permissions {
    /// National officers pass every check.
    #[inline]
    pub fn has(&self, permission: Permissions) -> bool {
        self.contains(Permissions::NATIONAL) || self.contains(permission)
    }

    pub fn for_category(category: RoleCategory) -> Self {
        match category {
            RoleCategory::NationalOfficer => Self::all(),
            RoleCategory::ChapterOfficer => Self::CHAPTER_OFFICER,
            RoleCategory::CommitteeChair => Self::COMMITTEE_CHAIR,
            RoleCategory::Other => Self::MEMBER,
        }
    }

    /// Union over every role the member currently holds, on top of the
    /// baseline every member gets.
    pub fn from_roles<'a, I>(roles: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        roles
            .into_iter()
            .map(|role| Self::for_category(RoleCategory::of(role)))
            .fold(Self::MEMBER, |acc, p| acc | p)
    }

    pub fn is_national(&self) -> bool {
        self.contains(Self::NATIONAL)
    }

    /// Names of the individual flags that are set
    pub fn list(&self) -> Vec<&'static str> {
        self.iter_names()
            .filter(|(_, flag)| flag.bits().is_power_of_two())
            .map(|(name, _)| name)
            .collect()
    }
}
