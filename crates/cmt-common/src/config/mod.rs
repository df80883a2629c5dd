//! Configuration structs

mod app_config;

pub use app_config::{
    AppConfig, AppSettings, ConfigError, CorsConfig, DatabaseConfig, DomainConfig, Environment,
    JwtConfig, RateLimitConfig, ServerConfig, SnowflakeConfig,
};
