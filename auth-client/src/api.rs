use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

use crate::{error::AuthFlowError, state::User};

pub(crate) const CSRF_HEADER: &str = "X-CSRF-Token";

/// Typed HTTP layer over the auth endpoints.
///
/// Owns a browser-like cookie jar, so the HTTP-only session cookies and the
/// readable CSRF cookie ride along without the caller touching them.
#[derive(Clone)]
pub struct AuthApi {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CsrfPayload {
    csrf_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginPayload {
    user: User,
    csrf_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ValidatePayload {
    user: User,
}

#[derive(Debug, Deserialize)]
struct RegisterPayload {
    user: User,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorPayload {
    error: Option<String>,
    field: Option<String>,
}

impl AuthApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self, AuthFlowError> {
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .map_err(AuthFlowError::Network)?;

        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn csrf(&self) -> Result<String, AuthFlowError> {
        let res = self
            .client
            .get(self.url("/api/auth/csrf"))
            .send()
            .await
            .map_err(AuthFlowError::Network)?;
        let res = Self::success(res, AuthFlowError::Server).await?;
        let payload: CsrfPayload = res.json().await.map_err(AuthFlowError::Network)?;
        Ok(payload.csrf_token)
    }

    /// Rotated CSRF token comes back alongside the user when the server
    /// issues one.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        csrf_token: &str,
    ) -> Result<(User, Option<String>), AuthFlowError> {
        let res = self
            .client
            .post(self.url("/api/auth/login"))
            .header(CSRF_HEADER, csrf_token)
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await
            .map_err(AuthFlowError::Network)?;
        let res = Self::success(res, AuthFlowError::InvalidCredentials).await?;
        let payload: LoginPayload = res.json().await.map_err(AuthFlowError::Network)?;
        Ok((payload.user, payload.csrf_token))
    }

    pub async fn validate(&self) -> Result<User, AuthFlowError> {
        let res = self
            .client
            .get(self.url("/api/auth/validate"))
            .send()
            .await
            .map_err(AuthFlowError::Network)?;
        let res = Self::success(res, AuthFlowError::SessionInvalid).await?;
        let payload: ValidatePayload = res.json().await.map_err(AuthFlowError::Network)?;
        Ok(payload.user)
    }

    pub async fn logout(&self) -> Result<(), AuthFlowError> {
        let res = self
            .client
            .post(self.url("/api/auth/logout"))
            .send()
            .await
            .map_err(AuthFlowError::Network)?;
        Self::success(res, AuthFlowError::SessionInvalid).await?;
        Ok(())
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<User, AuthFlowError> {
        let res = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&serde_json::json!({
                "username": username,
                "email": email,
                "password": password,
                "confirmPassword": confirm_password,
            }))
            .send()
            .await
            .map_err(AuthFlowError::Network)?;
        let res = Self::success(res, AuthFlowError::Server).await?;
        let payload: RegisterPayload = res.json().await.map_err(AuthFlowError::Network)?;
        Ok(payload.user)
    }

    /// Map a non-success response into the flow taxonomy. `on_unauthorized`
    /// names what a 401 means for the calling operation.
    async fn success(
        res: Response,
        on_unauthorized: AuthFlowError,
    ) -> Result<Response, AuthFlowError> {
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        let payload: ErrorPayload = res.json().await.unwrap_or_default();

        Err(match status {
            StatusCode::BAD_REQUEST | StatusCode::CONFLICT => AuthFlowError::Validation {
                field: payload.field.unwrap_or_default(),
                message: payload.error.unwrap_or_else(|| "Invalid input".to_string()),
            },
            StatusCode::UNAUTHORIZED => on_unauthorized,
            StatusCode::FORBIDDEN => AuthFlowError::CsrfInvalid,
            // 5xx and anything unexpected surface generically; backend detail
            // stays on the backend.
            _ => AuthFlowError::Server,
        })
    }
}
