//! Domain entities - core business objects

mod chapter;
mod interval;
mod member;
mod score;
mod transition;

pub use chapter::Chapter;
pub use interval::{RoleInterval, StatusInterval};
pub use member::Member;
pub use score::{
    Activity, ActivityCounts, ChapterScore, ScoreKind, ScoreType, Section, SpecialScore,
};
pub use transition::TransitionRecord;
