//! Application configuration structs
//!
//! Every section loads from environment variables. A `.env` file is read
//! first when present. The batch CLI loads only the sections it needs, so
//! it runs without `API_PORT` or `JWT_SECRET`.

use std::env;
use std::str::FromStr;

use cmt_core::{Biennium, Snowflake, TimelinePolicy};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub api: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub rate_limit: RateLimitConfig,
    pub cors: CorsConfig,
    pub snowflake: SnowflakeConfig,
    pub domain: DomainConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default)]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry: i64,
    #[serde(default = "default_refresh_token_expiry")]
    pub refresh_token_expiry: i64,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
    #[serde(default = "default_burst")]
    pub burst: u32,
}

/// CORS configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// Snowflake ID generator configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SnowflakeConfig {
    #[serde(default)]
    pub worker_id: u16,
}

/// Membership and scoring rules that vary per deployment
#[derive(Debug, Clone, Deserialize)]
pub struct DomainConfig {
    #[serde(default = "default_biennium_start")]
    pub biennium_start: i32,
    #[serde(default = "default_synthetic_pledge_days")]
    pub synthetic_pledge_days: u64,
    /// Fixed role term in days; unset means one calendar year
    #[serde(default)]
    pub role_term_days: Option<u64>,
    #[serde(default = "default_pledge_stale_days")]
    pub pledge_stale_days: i64,
    #[serde(default = "default_transition_max_retries")]
    pub transition_max_retries: u32,
}

impl DomainConfig {
    #[must_use]
    pub fn timeline_policy(&self) -> TimelinePolicy {
        TimelinePolicy {
            synthetic_pledge_days: self.synthetic_pledge_days,
            role_term_days: self.role_term_days,
        }
    }

    #[must_use]
    pub fn biennium(&self) -> Biennium {
        Biennium::new(self.biennium_start)
    }
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            biennium_start: default_biennium_start(),
            synthetic_pledge_days: default_synthetic_pledge_days(),
            role_term_days: None,
            pledge_stale_days: default_pledge_stale_days(),
            transition_max_retries: default_transition_max_retries(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "cmt".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_access_token_expiry() -> i64 {
    900 // 15 minutes
}

fn default_refresh_token_expiry() -> i64 {
    604_800 // 7 days
}

fn default_requests_per_second() -> u32 {
    10
}

fn default_burst() -> u32 {
    50
}

fn default_biennium_start() -> i32 {
    2024
}

fn default_synthetic_pledge_days() -> u64 {
    120
}

fn default_pledge_stale_days() -> i64 {
    180
}

fn default_transition_max_retries() -> u32 {
    3
}

/// Read an optional variable, falling back to `default` when unset.
/// A set but unparsable value is an error rather than a silent default.
fn var_or<T: FromStr>(key: &'static str, default: impl FnOnce() -> T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        Err(_) => Ok(default()),
    }
}

fn optional_var<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        Err(_) => Ok(None),
    }
}

fn required_var(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVar(key))
}

impl AppConfig {
    /// Load the full server configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let port = required_var("API_PORT")?;
        Ok(Self {
            app: AppSettings::from_env()?,
            api: ServerConfig {
                host: env::var("API_HOST").unwrap_or_else(|_| default_host()),
                port: port
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("API_PORT", port.clone()))?,
            },
            database: DatabaseConfig::from_env()?,
            jwt: JwtConfig {
                secret: required_var("JWT_SECRET")?,
                access_token_expiry: var_or("JWT_ACCESS_TOKEN_EXPIRY", default_access_token_expiry)?,
                refresh_token_expiry: var_or("JWT_REFRESH_TOKEN_EXPIRY", default_refresh_token_expiry)?,
            },
            rate_limit: RateLimitConfig {
                requests_per_second: var_or("RATE_LIMIT_REQUESTS_PER_SECOND", default_requests_per_second)?,
                burst: var_or("RATE_LIMIT_BURST", default_burst)?,
            },
            cors: CorsConfig {
                allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                    .ok()
                    .map(|s| {
                        s.split(',')
                            .map(str::trim)
                            .filter(|o| !o.is_empty())
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            snowflake: SnowflakeConfig::from_env()?,
            domain: DomainConfig::from_env()?,
        })
    }
}

impl AppSettings {
    /// # Errors
    /// Returns an error if `APP_ENV` names an unknown environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV") {
            Ok(raw) => Environment::parse(&raw).ok_or(ConfigError::InvalidValue("APP_ENV", raw))?,
            Err(_) => Environment::default(),
        };
        Ok(Self {
            name: env::var("APP_NAME").unwrap_or_else(|_| default_app_name()),
            env,
        })
    }
}

impl DatabaseConfig {
    /// # Errors
    /// Returns an error if `DATABASE_URL` is missing
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Ok(Self {
            url: required_var("DATABASE_URL")?,
            max_connections: var_or("DATABASE_MAX_CONNECTIONS", default_max_connections)?,
            min_connections: var_or("DATABASE_MIN_CONNECTIONS", default_min_connections)?,
        })
    }
}

impl SnowflakeConfig {
    /// # Errors
    /// Returns an error if `WORKER_ID` is not a valid worker id
    pub fn from_env() -> Result<Self, ConfigError> {
        let worker_id: u16 = var_or("WORKER_ID", || 0)?;
        if worker_id > Snowflake::MAX_WORKER {
            return Err(ConfigError::InvalidValue("WORKER_ID", worker_id.to_string()));
        }
        Ok(Self { worker_id })
    }
}

impl DomainConfig {
    /// # Errors
    /// Returns an error if any rule variable is malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let config = Self {
            biennium_start: var_or("BIENNIUM_START", default_biennium_start)?,
            synthetic_pledge_days: var_or("SYNTHETIC_PLEDGE_DAYS", default_synthetic_pledge_days)?,
            role_term_days: optional_var("ROLE_TERM_DAYS")?,
            pledge_stale_days: var_or("PLEDGE_STALE_DAYS", default_pledge_stale_days)?,
            transition_max_retries: var_or("TRANSITION_MAX_RETRIES", default_transition_max_retries)?,
        };
        if config.role_term_days == Some(0) {
            return Err(ConfigError::InvalidValue("ROLE_TERM_DAYS", "0".to_string()));
        }
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
