//! Test helper module for auth-service integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use auth_service::{
    build_router,
    config::{
        AuthConfig, BootstrapConfig, Environment, RateLimitConfig, SecurityConfig, SessionConfig,
    },
    middleware::RoutePolicy,
    models::Role,
    services::{
        AuthService, CsrfService, MemoryRevocationList, MemoryUserStore, SessionRevocation,
        SessionService, UserStore,
    },
    AppState,
};
use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    Router,
};
use service_core::middleware::rate_limit::create_ip_rate_limiter;
use tower::util::ServiceExt;

pub const TEST_SESSION_SECRET: &str = "integration-test-secret-0123456789abcdef";

/// In-process application with the fixture accounts seeded.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let config = test_config();

        let users = MemoryUserStore::new();
        users.seed_user("admin", "admin@example.com", "admin123", Role::Admin);
        users.seed_user("bob", "bob@example.com", "password123", Role::User);
        let users: Arc<dyn UserStore> = Arc::new(users);

        let sessions = SessionService::new(&config.session);
        let csrf = CsrfService;
        let revocation: Arc<dyn SessionRevocation> = Arc::new(MemoryRevocationList::new());
        let auth = AuthService::new(users.clone(), sessions.clone(), csrf, revocation);

        let state = AppState {
            config,
            users,
            sessions,
            csrf,
            auth,
            routes: RoutePolicy::default(),
            login_rate_limiter: create_ip_rate_limiter(1000, 60),
            register_rate_limiter: create_ip_rate_limiter(1000, 60),
        };

        let router = build_router(state.clone())
            .await
            .expect("Failed to build router");

        Self { router, state }
    }

    pub async fn request(&self, req: Request<Body>) -> Response<axum::body::Body> {
        self.router
            .clone()
            .oneshot(req)
            .await
            .expect("Request failed")
    }
}

pub fn test_config() -> AuthConfig {
    AuthConfig {
        common: service_core::config::Config { port: 8080 },
        environment: Environment::Dev,
        service_name: "auth-service-test".to_string(),
        service_version: "0.0.0-test".to_string(),
        log_level: "error".to_string(),
        session: SessionConfig {
            secret: TEST_SESSION_SECRET.to_string(),
            ttl_hours: 24,
        },
        csrf_ttl_hours: 24,
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        rate_limit: RateLimitConfig {
            login_attempts: 1000,
            login_window_seconds: 60,
            register_attempts: 1000,
            register_window_seconds: 60,
        },
        bootstrap: BootstrapConfig {
            admin_username: "admin".to_string(),
            admin_email: "admin@example.com".to_string(),
            admin_password: "admin123".to_string(),
        },
    }
}

/// All Set-Cookie values on a response.
pub fn set_cookies(res: &Response<axum::body::Body>) -> Vec<String> {
    res.headers()
        .get_all(axum::http::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_string))
        .collect()
}

/// Value of a named cookie from the Set-Cookie headers, if present.
pub fn cookie_value(res: &Response<axum::body::Body>, name: &str) -> Option<String> {
    set_cookies(res).iter().find_map(|raw| {
        let pair = raw.split(';').next().unwrap_or(raw);
        let (n, v) = pair.split_once('=')?;
        (n == name).then(|| v.to_string())
    })
}

/// True when the response clears the named cookie (empty value, zero max-age).
pub fn clears_cookie(res: &Response<axum::body::Body>, name: &str) -> bool {
    set_cookies(res).iter().any(|raw| {
        raw.starts_with(&format!("{}=;", name))
            && raw.to_ascii_lowercase().contains("max-age=0")
    })
}

pub async fn body_json(res: Response<axum::body::Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
}

/// Cookies a browser would hold after a successful login.
pub struct SessionCookies {
    pub auth_token: String,
    pub session_id: String,
    pub csrf_token: String,
}

impl SessionCookies {
    pub fn cookie_header(&self) -> String {
        format!(
            "auth-token={}; session-id={}; csrf-token={}",
            self.auth_token, self.session_id, self.csrf_token
        )
    }
}

/// Full csrf + login exchange against the fixture accounts.
pub async fn login_as(app: &TestApp, username: &str, password: &str) -> SessionCookies {
    let res = app
        .request(
            Request::builder()
                .uri("/api/auth/csrf")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let csrf = cookie_value(&res, "csrf-token").expect("csrf cookie missing");

    let res = app
        .request(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("content-type", "application/json")
                .header("cookie", format!("csrf-token={}", csrf))
                .header("x-csrf-token", csrf.clone())
                .body(Body::from(
                    serde_json::json!({ "username": username, "password": password }).to_string(),
                ))
                .unwrap(),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK, "login failed for {}", username);

    let auth_token = cookie_value(&res, "auth-token").expect("auth-token cookie missing");
    let session_id = cookie_value(&res, "session-id").expect("session-id cookie missing");
    let csrf_token = cookie_value(&res, "csrf-token").expect("rotated csrf cookie missing");

    SessionCookies {
        auth_token,
        session_id,
        csrf_token,
    }
}
