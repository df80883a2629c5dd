//! PostgreSQL connection pool management

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use cmt_common::DatabaseConfig;

/// Connection pool settings
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Maximum time to wait for a connection
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl From<&DatabaseConfig> for PoolConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections.min(config.max_connections),
            acquire_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(300),
            max_lifetime: Duration::from_secs(1800),
        }
    }
}

impl PoolConfig {
    /// Small pool for one-shot batch commands
    pub fn for_batch(config: &DatabaseConfig) -> Self {
        Self {
            max_connections: 2,
            min_connections: 0,
            ..Self::from(config)
        }
    }
}

/// Create a new PostgreSQL connection pool
pub async fn create_pool(config: &PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .max_lifetime(config.max_lifetime)
        .connect(&config.url)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn database() -> DatabaseConfig {
        DatabaseConfig {
            url: "postgres://localhost/cmt".to_string(),
            max_connections: 20,
            min_connections: 5,
        }
    }

    #[test]
    fn test_pool_config_from_database_config() {
        let config = PoolConfig::from(&database());
        assert_eq!(config.max_connections, 20);
        assert_eq!(config.min_connections, 5);
        assert_eq!(config.acquire_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_batch_pool_is_small() {
        let config = PoolConfig::for_batch(&database());
        assert_eq!(config.max_connections, 2);
        assert_eq!(config.min_connections, 0);
        assert_eq!(config.url, "postgres://localhost/cmt");
    }
}
