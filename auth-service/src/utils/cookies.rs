//! Cookie construction for the session artifact pair and the CSRF value.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

pub const SESSION_COOKIE: &str = "auth-token";
pub const SESSION_ID_COOKIE: &str = "session-id";
pub const CSRF_COOKIE: &str = "csrf-token";
pub const CSRF_HEADER: &str = "x-csrf-token";

/// HTTP-only cookie carrying a session artifact.
pub fn session_cookie(
    name: &'static str,
    value: String,
    secure: bool,
    ttl: Duration,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .max_age(ttl)
        .build()
}

/// Client-readable cookie. Only the CSRF double-submit value lives here.
pub fn readable_cookie(
    name: &'static str,
    value: String,
    secure: bool,
    ttl: Duration,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(false)
        .same_site(SameSite::Strict)
        .secure(secure)
        .max_age(ttl)
        .build()
}

fn expired(name: &'static str, secure: bool) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .max_age(Duration::ZERO)
        .build()
}

/// Clear all session cookies in one jar update (logout or failed validation).
pub fn clear_session_cookies(jar: CookieJar, secure: bool) -> CookieJar {
    jar.add(expired(SESSION_COOKIE, secure))
        .add(expired(SESSION_ID_COOKIE, secure))
        .add(expired(CSRF_COOKIE, secure))
}
