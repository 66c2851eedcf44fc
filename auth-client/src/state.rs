use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

/// Role as the API reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

/// User as the API reports it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub last_login: Option<DateTime<Utc>>,
}

/// Lifecycle phase of the session state machine.
///
/// `Error` is only reached from a session that was already authenticated;
/// first-time visitors whose validation fails land in `Unauthenticated`
/// without any error surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Loading,
    Authenticated,
    Unauthenticated,
    Error,
}

/// Snapshot visible to subscribers.
///
/// Every mutation of the store lands as exactly one new snapshot: there is no
/// observable half-cleared or half-populated state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AuthState {
    pub phase: SessionPhase,
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub error: Option<String>,
    pub csrf_token: Option<String>,
}
