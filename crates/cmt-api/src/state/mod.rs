//! Application state
//!
//! Shared by every handler: the service context, the configuration, the
//! token signer, and the pool for readiness probes.

use std::sync::Arc;

use cmt_common::{AppConfig, JwtService};
use cmt_db::PgPool;
use cmt_service::ServiceContext;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    service_context: Arc<ServiceContext>,
    config: Arc<AppConfig>,
    jwt_service: Arc<JwtService>,
    pool: PgPool,
}

impl AppState {
    pub fn new(
        service_context: ServiceContext,
        config: AppConfig,
        jwt_service: Arc<JwtService>,
        pool: PgPool,
    ) -> Self {
        Self {
            service_context: Arc::new(service_context),
            config: Arc::new(config),
            jwt_service,
            pool,
        }
    }

    pub fn service_context(&self) -> &ServiceContext {
        &self.service_context
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Verifies bearer tokens on incoming requests
    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("service_context", &"ServiceContext")
            .field("config", &"AppConfig")
            .finish()
    }
}
