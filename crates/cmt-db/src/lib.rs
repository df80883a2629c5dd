//! # cmt-db
//!
//! Database layer implementing the cmt-core repository traits with
//! PostgreSQL via SQLx.
//!
//! - Connection pool management and runtime SQL migrations
//! - Database models with SQLx `FromRow` derives
//! - Entity ↔ Model mappers
//! - Repository implementations
//!
//! ```rust,ignore
//! use cmt_db::{create_pool, PoolConfig, PgMemberRepository};
//!
//! let pool = create_pool(&PoolConfig::from(&config.database)).await?;
//! let members = PgMemberRepository::new(pool);
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, default_migrations_dir, run_migrations, PgPool, PoolConfig};
pub use repositories::{
    PgAuditRepository, PgChapterRepository, PgMemberRepository, PgScoreRepository,
    PgTimelineRepository,
};
