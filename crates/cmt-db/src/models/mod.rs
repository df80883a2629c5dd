//! Database models - SQLx-compatible structs for PostgreSQL tables

mod audit_log;
mod chapter;
mod interval;
mod member;
mod score;
mod transition;

pub use audit_log::AuditLogModel;
pub use chapter::ChapterModel;
pub use interval::{RoleHolderModel, RoleIntervalModel, StatusIntervalModel};
pub use member::{MemberModel, StalePledgeModel};
pub use score::{ActivityModel, ChapterScoreModel, ScoreTypeModel};
pub use transition::TransitionModel;
