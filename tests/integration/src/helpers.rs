//! Test helpers for integration tests
//!
//! Spawns the API on an ephemeral port and wraps the HTTP calls.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use cmt_api::{create_app, create_app_state};
use cmt_common::AppConfig;
use cmt_db::{default_migrations_dir, run_migrations, PgPool};
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    /// Same pool the server uses, for seeding
    pub pool: PgPool,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Migrate the database and start a server
    pub async fn start() -> Result<Self> {
        let config = test_config()?;
        let state = create_app_state(config).await?;
        let pool = state.pool().clone();
        run_migrations(&pool, &default_migrations_dir()).await?;

        let app = create_app(state);
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            client,
            pool,
            _handle: handle,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> Result<Response> {
        Ok(self.client.get(self.url(path)).send().await?)
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> Result<Response> {
        Ok(self.client.get(self.url(path)).bearer_auth(token).send().await?)
    }

    pub async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<Response> {
        Ok(self.client.post(self.url(path)).json(body).send().await?)
    }

    pub async fn post_auth<T: Serialize>(&self, path: &str, token: &str, body: &T) -> Result<Response> {
        Ok(self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?)
    }

    pub async fn patch_auth<T: Serialize>(&self, path: &str, token: &str, body: &T) -> Result<Response> {
        Ok(self
            .client
            .patch(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?)
    }

    pub async fn delete_auth(&self, path: &str, token: &str) -> Result<Response> {
        Ok(self.client.delete(self.url(path)).bearer_auth(token).send().await?)
    }

    /// Log in and return the access token
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let response = self
            .post(
                "/api/v1/auth/login",
                &serde_json::json!({ "email": email, "password": password }),
            )
            .await?;
        let body: serde_json::Value = assert_json(response, StatusCode::OK).await?;
        body["access_token"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| anyhow::anyhow!("login response without access_token: {body}"))
    }
}

/// Configuration from the environment (and `.env`)
pub fn test_config() -> Result<AppConfig> {
    dotenvy::dotenv().ok();
    AppConfig::from_env().map_err(|e| anyhow::anyhow!("Config error: {}", e))
}

/// Whether a database is configured for these tests
pub fn check_test_env() -> bool {
    dotenvy::dotenv().ok();
    for var in ["DATABASE_URL", "JWT_SECRET", "API_PORT"] {
        if std::env::var(var).is_err() {
            eprintln!("Skipping test: {var} not set");
            return false;
        }
    }
    true
}

/// Assert response status and parse JSON body
pub async fn assert_json<T: DeserializeOwned>(response: Response, expected_status: StatusCode) -> Result<T> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!("Expected status {}, got {}. Body: {}", expected_status, status, body);
    }
    Ok(response.json().await?)
}

/// Assert response status without parsing body
pub async fn assert_status(response: Response, expected_status: StatusCode) -> Result<()> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!("Expected status {}, got {}. Body: {}", expected_status, status, body);
    }
    Ok(())
}

/// Assert an error response and return its `error.code`
pub async fn assert_error(response: Response, expected_status: StatusCode) -> Result<String> {
    let body: serde_json::Value = assert_json(response, expected_status).await?;
    body["error"]["code"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| anyhow::anyhow!("error body without code: {body}"))
}
