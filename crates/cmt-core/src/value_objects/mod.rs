//! Value objects - immutable types that represent domain concepts

mod date_span;
mod member_status;
mod permissions;
mod role;
mod snowflake;
mod term;

pub use date_span::{day_after, day_before, forever, DateSpan};
pub use member_status::MemberStatus;
pub use permissions::Permissions;
pub use role::{
    normalize_role, RoleCategory, CHAPTER_OFFICER_ROLES, COMMITTEE_CHAIR_ROLES,
    NATIONAL_OFFICER_ROLES,
};
pub use snowflake::{Snowflake, SnowflakeGenerator, SnowflakeParseError};
pub use term::{Biennium, Term, YearTerm};
