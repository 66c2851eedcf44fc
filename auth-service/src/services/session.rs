use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::models::{Role, User};

/// Payload of the signed session artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID)
    pub sub: Uuid,
    pub username: String,
    pub role: Role,
    /// Session correlation id, the revocation key
    pub sid: Uuid,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Token id
    pub jti: String,
}

/// Artifacts produced for a freshly established session.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub session_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Signs and checks session artifacts. Validation is a pure check: it never
/// issues tokens or touches any state.
#[derive(Clone)]
pub struct SessionService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_hours: i64,
}

impl SessionService {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            ttl_hours: config.ttl_hours,
        }
    }

    /// Issue a session artifact for a user.
    pub fn issue(&self, user: &User) -> Result<IssuedSession, anyhow::Error> {
        let now = Utc::now();
        let expires_at = now + Duration::hours(self.ttl_hours);
        let session_id = Uuid::new_v4();

        let claims = SessionClaims {
            sub: user.id,
            username: user.username.clone(),
            role: user.role,
            sid: session_id,
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode session token: {}", e))?;

        Ok(IssuedSession {
            token,
            session_id,
            expires_at,
        })
    }

    /// Validate signature and expiry, returning the decoded claims.
    pub fn validate(&self, token: &str) -> Result<SessionClaims, anyhow::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| anyhow::anyhow!("Invalid session token: {}", e))?;

        Ok(token_data.claims)
    }

    /// Session lifetime in seconds (cookie max-age).
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_hours * 3600
    }
}
