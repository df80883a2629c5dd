//! Axum extractors for request handling
//!
//! Custom extractors for authentication, validation, ids, and pagination.

mod auth;
mod pagination;
mod path;
mod validated;

pub use auth::AuthMember;
pub use pagination::{Pagination, PaginationParams};
pub use path::{ChapterIdPath, MemberIdPath, MemberIntervalPath};
pub use validated::ValidatedJson;
