use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use service_core::error::AppError;
use time::Duration;

use crate::{
    dtos::{
        auth::{
            CsrfResponse, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
            ValidateResponse,
        },
        ErrorResponse,
    },
    middleware::session_artifact,
    utils::{
        cookies::{
            clear_session_cookies, readable_cookie, session_cookie, CSRF_COOKIE, CSRF_HEADER,
            SESSION_COOKIE, SESSION_ID_COOKIE,
        },
        ValidatedJson,
    },
    AppState,
};

/// Issue a CSRF token
#[utoipa::path(
    get,
    path = "/api/auth/csrf",
    responses(
        (status = 200, description = "Token issued and bound to the cookie context", body = CsrfResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn csrf(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let token = state.csrf.issue();
    let jar = jar.add(readable_cookie(
        CSRF_COOKIE,
        token.clone(),
        state.config.cookies_secure(),
        Duration::hours(state.config.csrf_ttl_hours),
    ));

    (jar, Json(CsrfResponse { csrf_token: token }))
}

/// Exchange credentials for a session
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session established", body = LoginResponse),
        (status = 400, description = "Missing fields", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 403, description = "CSRF mismatch", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Response, AppError> {
    let csrf_header = headers
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let csrf_cookie = jar.get(CSRF_COOKIE).map(|c| c.value().to_string());

    let outcome = state
        .auth
        .login(req, csrf_header.as_deref(), csrf_cookie.as_deref())
        .await?;

    let secure = state.config.cookies_secure();
    let session_ttl = Duration::hours(state.config.session.ttl_hours);

    // The artifact pair is HTTP-only; the CSRF value is rotated alongside it
    // and stays readable for header injection.
    let fresh_csrf = state.csrf.issue();
    let jar = jar
        .add(session_cookie(
            SESSION_COOKIE,
            outcome.session.token.clone(),
            secure,
            session_ttl,
        ))
        .add(session_cookie(
            SESSION_ID_COOKIE,
            outcome.session.session_id.to_string(),
            secure,
            session_ttl,
        ))
        .add(readable_cookie(
            CSRF_COOKIE,
            fresh_csrf.clone(),
            secure,
            Duration::hours(state.config.csrf_ttl_hours),
        ));

    Ok((
        jar,
        Json(LoginResponse {
            user: outcome.user,
            csrf_token: fresh_csrf,
        }),
    )
        .into_response())
}

/// Confirm the current session
#[utoipa::path(
    get,
    path = "/api/auth/validate",
    responses(
        (status = 200, description = "Session is valid", body = ValidateResponse),
        (status = 401, description = "Missing, invalid, or expired session", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn validate(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Response {
    let secure = state.config.cookies_secure();

    let Some(token) = session_artifact(&headers, &jar) else {
        return session_rejected(secure);
    };

    match state.auth.validate(&token).await {
        Ok(user) => Json(ValidateResponse { user }).into_response(),
        Err(err) => {
            tracing::debug!(error = %err, "Session validation failed");
            session_rejected(secure)
        }
    }
}

// 401 plus cleared cookies, so the browser drops the dead artifacts.
fn session_rejected(secure: bool) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        clear_session_cookies(CookieJar::new(), secure),
        Json(ErrorResponse {
            error: "Invalid or expired session".to_string(),
        }),
    )
        .into_response()
}

/// End the current session
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Session ended; cookies cleared even if revocation failed")
    ),
    tag = "Authentication"
)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> impl IntoResponse {
    let token = session_artifact(&headers, &jar);
    state.auth.logout(token.as_deref()).await;

    // Local cleanup is unconditional.
    let jar = clear_session_cookies(jar, state.config.cookies_secure());
    (jar, Json(serde_json::json!({})))
}

/// Create an account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created; a separate login is required", body = RegisterResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 409, description = "Username or email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.auth.register(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user,
            message: "Registration successful. Please log in.".to_string(),
        }),
    ))
}
