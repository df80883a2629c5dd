//! Database connection pool management and schema migrations

mod migrate;
mod postgres;

pub use migrate::{default_migrations_dir, run_migrations};
pub use postgres::{create_pool, PoolConfig};

pub use sqlx::postgres::PgPool;
