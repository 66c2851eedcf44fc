use std::sync::Arc;

use chrono::Utc;

use crate::{
    dtos::auth::{LoginRequest, RegisterRequest},
    models::{Role, User, UserResponse},
    services::{
        CsrfService, IssuedSession, PolicyService, ServiceError, SessionRevocation,
        SessionService, UserStore,
    },
    utils::{hash_password, verify_password, Password, PasswordHashString},
};

/// Credential exchange and session validation, behind the storage seams.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    sessions: SessionService,
    csrf: CsrfService,
    revocation: Arc<dyn SessionRevocation>,
}

/// What a successful login hands back to the HTTP layer.
#[derive(Debug)]
pub struct LoginOutcome {
    pub user: UserResponse,
    pub session: IssuedSession,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: SessionService,
        csrf: CsrfService,
        revocation: Arc<dyn SessionRevocation>,
    ) -> Self {
        Self {
            users,
            sessions,
            csrf,
            revocation,
        }
    }

    /// Exchange credentials for a session.
    ///
    /// The CSRF pair is checked before credentials are touched. Unknown
    /// username and wrong password produce the same error.
    pub async fn login(
        &self,
        req: LoginRequest,
        csrf_header: Option<&str>,
        csrf_cookie: Option<&str>,
    ) -> Result<LoginOutcome, ServiceError> {
        match (csrf_header, csrf_cookie) {
            (Some(header), Some(cookie)) if self.csrf.verify(header, cookie) => {}
            _ => return Err(ServiceError::CsrfMismatch),
        }

        let user = self
            .users
            .find_by_username(&req.username)
            .await
            .ok_or(ServiceError::InvalidCredentials)?;

        verify_password(
            &Password::new(req.password),
            &PasswordHashString::new(user.password_hash.clone()),
        )
        .map_err(|_| ServiceError::InvalidCredentials)?;

        let now = Utc::now();
        self.users.record_login(user.id, now).await;

        let session = self.sessions.issue(&user).map_err(ServiceError::Internal)?;

        tracing::info!(
            user_id = %user.id,
            session_id = %session.session_id,
            "User logged in"
        );

        let mut sanitized = user.sanitized();
        sanitized.last_login = Some(now);

        Ok(LoginOutcome {
            user: sanitized,
            session,
        })
    }

    /// Create an account. Never authenticates the caller; a separate login
    /// is required afterwards.
    pub async fn register(&self, req: RegisterRequest) -> Result<UserResponse, ServiceError> {
        PolicyService::validate_registration(&req)?;

        if self.users.find_by_username(&req.username).await.is_some() {
            return Err(ServiceError::UsernameTaken);
        }
        if self.users.find_by_email(&req.email).await.is_some() {
            return Err(ServiceError::EmailRegistered);
        }

        let password_hash = hash_password(&Password::new(req.password))
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Password hashing error: {}", e)))?;

        let user = User::new(
            req.username,
            req.email,
            password_hash.into_string(),
            Role::User,
        );
        self.users.insert(user.clone()).await?;

        tracing::info!(user_id = %user.id, "User registered");

        Ok(user.sanitized())
    }

    /// Confirm a session artifact and resolve the canonical user.
    ///
    /// Pure check: signature, expiry, revocation tombstone, user lookup.
    pub async fn validate(&self, token: &str) -> Result<UserResponse, ServiceError> {
        let claims = self
            .sessions
            .validate(token)
            .map_err(|_| ServiceError::SessionInvalid)?;

        if self.revocation.is_revoked(claims.sid).await {
            return Err(ServiceError::SessionInvalid);
        }

        let user = self
            .users
            .find_by_id(claims.sub)
            .await
            .ok_or(ServiceError::SessionInvalid)?;

        Ok(user.sanitized())
    }

    /// Best-effort server-side revocation. Cookie clearing is the caller's
    /// job and must happen regardless of what this returns.
    pub async fn logout(&self, token: Option<&str>) {
        let Some(token) = token else {
            return;
        };

        match self.sessions.validate(token) {
            Ok(claims) => {
                self.revocation.revoke(claims.sid, claims.exp).await;
                tracing::info!(
                    user_id = %claims.sub,
                    session_id = %claims.sid,
                    "Session revoked"
                );
            }
            Err(err) => {
                tracing::debug!(error = %err, "Logout carried an unusable session artifact");
            }
        }
    }
}
