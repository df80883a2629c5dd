//! Database and service wiring shared by the commands

use std::sync::Arc;

use anyhow::Context;
use cmt_common::{DatabaseConfig, DomainConfig, SnowflakeConfig};
use cmt_core::SnowflakeGenerator;
use cmt_db::{create_pool, PgPool, PoolConfig};
use cmt_service::{ServiceContext, ServiceContextBuilder};
use tracing::debug;

/// Connect with the small batch pool
pub async fn connect() -> anyhow::Result<PgPool> {
    let database = DatabaseConfig::from_env().context("database configuration")?;
    let pool = create_pool(&PoolConfig::for_batch(&database))
        .await
        .context("connecting to PostgreSQL")?;
    debug!("Connected to PostgreSQL");
    Ok(pool)
}

/// Service context without a token signer; commands never issue tokens
pub async fn service_context() -> anyhow::Result<ServiceContext> {
    let pool = connect().await?;
    let domain = DomainConfig::from_env().context("domain configuration")?;
    let snowflake = SnowflakeConfig::from_env().context("snowflake configuration")?;

    let ctx = ServiceContextBuilder::postgres(pool)
        .snowflake_generator(Arc::new(SnowflakeGenerator::new(snowflake.worker_id)))
        .domain(domain)
        .build()?;
    Ok(ctx)
}
