//! Member status and role timelines
//!
//! Statuses and roles are date-ranged intervals. For one member, no two
//! status intervals share a day. Role intervals only exclude other terms
//! of the same role. Every mutation goes through [`paint`] and comes out
//! as a [`TimelinePlan`] that storage applies atomically.

mod member_timeline;
mod paint;
mod transition;

pub use member_timeline::{MemberTimeline, StatusChange, TimelinePolicy, FALLBACK_STATUS};
pub use paint::{paint, Interval, TimelinePlan};
pub use transition::{AwayReason, Transition};
