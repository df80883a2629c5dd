//! Server setup and initialization
//!
//! Provides the application builder and server runner.

use std::sync::Arc;

use axum::Router;
use cmt_common::{AppConfig, AppError, JwtService};
use cmt_core::SnowflakeGenerator;
use cmt_db::{create_pool, PoolConfig};
use cmt_service::ServiceContextBuilder;
use tokio::net::TcpListener;
use tracing::info;

use crate::middleware::apply_middleware;
use crate::openapi::swagger_routes;
use crate::routes::{create_router, health_routes};
use crate::state::AppState;

/// Build the application. Health probes and the API docs skip the
/// middleware stack so the rate limiter never starves them.
pub fn create_app(state: AppState) -> Router {
    let config = state.config();
    let api = apply_middleware(
        create_router(),
        &config.rate_limit,
        &config.cors,
        config.app.env.is_production(),
    );

    api.merge(health_routes())
        .merge(swagger_routes())
        .with_state(state)
}

/// Connect to PostgreSQL and wire the service context
pub async fn create_app_state(config: AppConfig) -> Result<AppState, AppError> {
    info!("Connecting to PostgreSQL...");
    let pool = create_pool(&PoolConfig::from(&config.database))
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    info!("PostgreSQL connection established");

    let jwt_service = Arc::new(JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expiry,
        config.jwt.refresh_token_expiry,
    ));
    let snowflake_generator = Arc::new(SnowflakeGenerator::new(config.snowflake.worker_id));

    let service_context = ServiceContextBuilder::postgres(pool.clone())
        .jwt_service(Arc::clone(&jwt_service))
        .snowflake_generator(snowflake_generator)
        .domain(config.domain.clone())
        .build()
        .map_err(|e| AppError::Config(e.to_string()))?;

    Ok(AppState::new(service_context, config, jwt_service, pool))
}

/// Serve until ctrl-c
pub async fn run_server(app: Router, addr: &str) -> Result<(), AppError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {}: {}", addr, e)))?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Config(format!("Server error: {}", e)))?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Run the complete server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr = config.api.address();
    let state = create_app_state(config).await?;
    let app = create_app(state);
    run_server(app, &addr).await
}
