//! Page stubs and fixture API routes that sit behind the gate. Real page
//! rendering lives outside this subsystem; these give the gate something to
//! protect and give tests concrete targets.

use axum::{extract::State, response::Html, Json};

use crate::{middleware::AuthUser, models::UserResponse, services::UserStore, AppState};

/// Login page target for gate redirects. The `redirect` query parameter
/// carries the originally requested path.
pub async fn login_page() -> Html<&'static str> {
    Html("<!doctype html><title>Sign in</title><h1>Sign in</h1>")
}

pub async fn dashboard(AuthUser(user): AuthUser) -> Html<String> {
    Html(format!(
        "<!doctype html><title>Dashboard</title><h1>Dashboard</h1><p>Signed in as {}</p>",
        user.username
    ))
}

pub async fn admin_panel(AuthUser(user): AuthUser) -> Html<String> {
    Html(format!(
        "<!doctype html><title>Admin</title><h1>Admin</h1><p>Signed in as {}</p>",
        user.username
    ))
}

pub async fn protected_ping(AuthUser(user): AuthUser) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true, "username": user.username }))
}

/// Mutating fixture route: exercises the CSRF double-submit requirement.
pub async fn protected_echo(
    AuthUser(user): AuthUser,
    Json(body): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "username": user.username, "echo": body }))
}

/// Admin-scoped listing; the gate has already enforced the role.
pub async fn admin_users(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> Json<Vec<UserResponse>> {
    let users = state
        .users
        .list()
        .await
        .iter()
        .map(|u| u.sanitized())
        .collect();
    Json(users)
}
