//! Authentication service
//!
//! Handles login and token refresh. Member accounts are created by chapter
//! officers, so there is no self-registration.

use cmt_common::AppError;
use cmt_core::entities::Member;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::dto::{AuthResponse, LoginRequest, MemberResponse, RefreshTokenRequest};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Authentication service
pub struct AuthService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AuthService<'a> {
    /// Create a new AuthService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Login with email and password
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> ServiceResult<AuthResponse> {
        request.validate()?;

        let member = self
            .ctx
            .member_repo()
            .find_by_email(&request.email)
            .await?
            .ok_or_else(|| {
                warn!(email = %request.email, "Login failed: member not found");
                ServiceError::App(AppError::InvalidCredentials)
            })?;

        let password_hash = self
            .ctx
            .member_repo()
            .get_password_hash(member.id)
            .await?
            .ok_or_else(|| {
                warn!(member_id = %member.id, "Login failed: no password set");
                ServiceError::App(AppError::InvalidCredentials)
            })?;

        self.ctx
            .password_service()
            .verify_or_error(&request.password, &password_hash)
            .inspect_err(|_| warn!(member_id = %member.id, "Login failed: invalid password"))?;

        info!(member_id = %member.id, "Member logged in");
        self.issue(member)
    }

    /// Exchange a refresh token for a new token pair.
    ///
    /// The member is reloaded so that a transfer since the last login is
    /// reflected in the new chapter claim.
    #[instrument(skip(self, request))]
    pub async fn refresh(&self, request: RefreshTokenRequest) -> ServiceResult<AuthResponse> {
        let claims = self
            .ctx
            .jwt_service()?
            .validate_refresh_token(&request.refresh_token)?;
        let member_id = claims.member_id()?;

        let member = self
            .ctx
            .member_repo()
            .find_by_id(member_id)
            .await?
            .ok_or_else(|| {
                warn!(member_id = %member_id, "Refresh failed: member no longer exists");
                ServiceError::App(AppError::InvalidToken)
            })?;

        info!(member_id = %member.id, "Token refreshed");
        self.issue(member)
    }

    fn issue(&self, member: Member) -> ServiceResult<AuthResponse> {
        let tokens = self
            .ctx
            .jwt_service()?
            .generate_token_pair(member.id, member.chapter_id)?;

        Ok(AuthResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: tokens.token_type,
            expires_in: tokens.expires_in,
            member: MemberResponse::from(member),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::{day, MemoryStore};
    use crate::ServiceContextBuilder;
    use cmt_common::auth::{hash_password, JwtService};
    use cmt_core::MemberStatus;

    fn context_with_jwt(store: &MemoryStore) -> ServiceContext {
        ServiceContextBuilder::new()
            .chapter_repo(Arc::new(store.clone()))
            .member_repo(Arc::new(store.clone()))
            .timeline_repo(Arc::new(store.clone()))
            .score_repo(Arc::new(store.clone()))
            .audit_repo(Arc::new(store.clone()))
            .jwt_service(Arc::new(JwtService::new("test-secret-key-for-tokens", 900, 3600)))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_login_and_refresh() {
        let store = MemoryStore::default();
        let alpha = store.add_chapter(1, "alpha");
        let member = store.add_member(10, &alpha, &[(MemberStatus::Active, day(2022, 9, 1), None)]);
        store.set_password_hash(&member, &hash_password("Secret123").unwrap());

        let ctx = context_with_jwt(&store);
        let auth = AuthService::new(&ctx);
        let response = auth
            .login(LoginRequest {
                email: member.email.clone(),
                password: "Secret123".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(response.member.id, member.id.to_string());
        assert_eq!(response.token_type, "Bearer");

        let refreshed = auth
            .refresh(RefreshTokenRequest {
                refresh_token: response.refresh_token,
            })
            .await
            .unwrap();
        assert_eq!(refreshed.member.chapter_id, alpha.id.to_string());
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let store = MemoryStore::default();
        let alpha = store.add_chapter(1, "alpha");
        let member = store.add_member(10, &alpha, &[(MemberStatus::Active, day(2022, 9, 1), None)]);
        store.set_password_hash(&member, &hash_password("Secret123").unwrap());

        let ctx = context_with_jwt(&store);
        let err = AuthService::new(&ctx)
            .login(LoginRequest {
                email: member.email,
                password: "Wrong1234".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 401);
    }

    #[tokio::test]
    async fn test_access_token_cannot_refresh() {
        let store = MemoryStore::default();
        let alpha = store.add_chapter(1, "alpha");
        let member = store.add_member(10, &alpha, &[]);
        let ctx = context_with_jwt(&store);

        let pair = ctx
            .jwt_service()
            .unwrap()
            .generate_token_pair(member.id, alpha.id)
            .unwrap();
        let err = AuthService::new(&ctx)
            .refresh(RefreshTokenRequest {
                refresh_token: pair.access_token,
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 401);
    }
}
