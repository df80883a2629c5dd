//! Repository implementations
//!
//! PostgreSQL implementations of the repository traits defined in cmt-core.

mod audit;
mod chapter;
mod error;
mod member;
mod score;
mod timeline;

pub use audit::PgAuditRepository;
pub use chapter::PgChapterRepository;
pub use member::PgMemberRepository;
pub use score::PgScoreRepository;
pub use timeline::PgTimelineRepository;
