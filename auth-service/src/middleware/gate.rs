use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    dtos::ErrorResponse,
    middleware::routes::{RouteClass, RoutePolicy},
    models::{Role, UserResponse},
    utils::cookies::{clear_session_cookies, CSRF_COOKIE, CSRF_HEADER, SESSION_COOKIE},
    AppState,
};

/// Edge access gate: runs ahead of every handler.
///
/// Public paths pass through untouched. Everything else requires a valid
/// session artifact, a CSRF pair on mutating methods, and the pinned role on
/// role-scoped paths. The gate holds no cross-request state; the artifact's
/// signature and expiry carry all the authority.
pub async fn edge_gate_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();

    let required_role = match state.routes.classify(&path) {
        RouteClass::Public => return next.run(req).await,
        RouteClass::Protected { required_role } => required_role,
    };

    let jar = CookieJar::from_headers(req.headers());

    let Some(token) = session_artifact(req.headers(), &jar) else {
        return deny(&state, &path, false);
    };

    let user = match state.auth.validate(&token).await {
        Ok(user) => user,
        Err(err) => {
            tracing::debug!(path = %path, error = %err, "Rejected session artifact");
            return deny(&state, &path, true);
        }
    };

    // CSRF double-submit on mutating methods, independent of (and on top of)
    // session validity.
    if is_mutating(req.method()) && !csrf_pair_matches(&state, req.headers(), &jar) {
        tracing::warn!(path = %path, user_id = %user.id, "CSRF pair mismatch");
        return (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                error: "CSRF token validation failed".to_string(),
            }),
        )
            .into_response();
    }

    if let Some(required) = required_role {
        if user.role != required {
            return role_denied(&path, required);
        }
    }

    req.extensions_mut().insert(user);
    next.run(req).await
}

fn is_mutating(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::DELETE | Method::PATCH
    )
}

/// Session artifact from a bearer header or the HTTP-only cookie,
/// transparently. Both representations carry the same signed token.
pub(crate) fn session_artifact(
    headers: &header::HeaderMap,
    jar: &CookieJar,
) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.to_string())
        .or_else(|| jar.get(SESSION_COOKIE).map(|c| c.value().to_string()))
}

fn csrf_pair_matches(state: &AppState, headers: &header::HeaderMap, jar: &CookieJar) -> bool {
    let header_value = headers.get(CSRF_HEADER).and_then(|v| v.to_str().ok());
    let cookie_value = jar.get(CSRF_COOKIE).map(|c| c.value());

    matches!(
        (header_value, cookie_value),
        (Some(header), Some(cookie)) if state.csrf.verify(header, cookie)
    )
}

/// Missing or invalid session artifact: API callers get 401, page requests
/// get sent to the login page with the original destination attached.
/// Cookies are cleared whenever an artifact was presented and failed.
fn deny(state: &AppState, path: &str, clear_cookies: bool) -> Response {
    let jar = if clear_cookies {
        clear_session_cookies(CookieJar::new(), state.config.cookies_secure())
    } else {
        CookieJar::new()
    };

    if RoutePolicy::is_api(path) {
        (
            StatusCode::UNAUTHORIZED,
            jar,
            Json(ErrorResponse {
                error: "Authentication required".to_string(),
            }),
        )
            .into_response()
    } else {
        let target = format!("/login?redirect={}", urlencoding::encode(path));
        (jar, Redirect::to(&target)).into_response()
    }
}

fn role_denied(path: &str, required: Role) -> Response {
    tracing::warn!(path = %path, required_role = required.as_str(), "Role check failed");
    (
        StatusCode::FORBIDDEN,
        Json(ErrorResponse {
            error: "Insufficient permissions".to_string(),
        }),
    )
        .into_response()
}

/// Extractor handing handlers the user the gate already validated.
pub struct AuthUser(pub UserResponse);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts.extensions.get::<UserResponse>().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Authenticated user missing from request extensions".to_string(),
            }),
        ))?;

        Ok(AuthUser(user.clone()))
    }
}
