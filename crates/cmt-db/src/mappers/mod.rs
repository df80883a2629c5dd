//! Entity to model mappers
//!
//! Conversions between domain entities (cmt-core) and database models.
//! Enum columns are stored as text, so rows holding a value the domain does
//! not know are rejected with `DomainError::DatabaseError` instead of being
//! coerced to a default.

mod chapter;
mod interval;
mod member;
mod score;
mod transition;

pub use member::stale_pledge;
pub use interval::role_holder;
pub use score::{chapter_score, ScoreTypeInsert};

use cmt_core::DomainError;

/// Error for a stored value that does not decode into the domain type
pub(crate) fn corrupt(column: &str, detail: impl std::fmt::Display) -> DomainError {
    DomainError::DatabaseError(format!("corrupt {column}: {detail}"))
}
