//! Test backends for auth-client integration tests: the real auth-service on
//! an ephemeral port, plus a hand-controlled fixture backend for timing and
//! failure-injection scenarios.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

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
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use service_core::middleware::rate_limit::create_ip_rate_limiter;

/// Bind a router on an ephemeral port and serve it in the background.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind ephemeral port");
    let addr = listener.local_addr().expect("No local addr");

    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Server failed");
    });

    format!("http://{}", addr)
}

/// The real auth-service with fixture accounts seeded.
pub async fn spawn_auth_service() -> String {
    let config = AuthConfig {
        common: service_core::config::Config { port: 0 },
        environment: Environment::Dev,
        service_name: "auth-service-test".to_string(),
        service_version: "0.0.0-test".to_string(),
        log_level: "error".to_string(),
        session: SessionConfig {
            secret: "client-test-session-secret-0123456789ab".to_string(),
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
    };

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

    let router = build_router(state).await.expect("Failed to build router");
    serve(router).await
}

/// Knobs for the fixture backend.
#[derive(Default)]
pub struct FixtureFlags {
    /// Whether /api/auth/validate answers 200 or 401.
    pub validate_ok: AtomicBool,
    /// Artificial delay before validate answers, for in-flight races.
    pub validate_delay_ms: AtomicU64,
    /// How many validate calls have arrived.
    pub validate_hits: AtomicUsize,
}

pub fn fixture_user_json() -> serde_json::Value {
    serde_json::json!({
        "id": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
        "username": "admin",
        "email": "admin@example.com",
        "role": "admin",
        "lastLogin": null,
    })
}

/// Minimal auth backend whose validate behavior the test script controls.
pub async fn spawn_fixture_backend(flags: Arc<FixtureFlags>) -> String {
    let validate_flags = flags.clone();

    let router = Router::new()
        .route(
            "/api/auth/csrf",
            get(|| async { Json(serde_json::json!({ "csrfToken": "fixture-csrf" })) }),
        )
        .route(
            "/api/auth/login",
            post(|| async {
                Json(serde_json::json!({
                    "user": fixture_user_json(),
                    "csrfToken": "fixture-csrf",
                }))
            }),
        )
        .route(
            "/api/auth/validate",
            get(move || {
                let flags = validate_flags.clone();
                async move {
                    flags.validate_hits.fetch_add(1, Ordering::SeqCst);

                    let delay = flags.validate_delay_ms.load(Ordering::SeqCst);
                    if delay > 0 {
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                    }

                    if flags.validate_ok.load(Ordering::SeqCst) {
                        Json(serde_json::json!({ "user": fixture_user_json() })).into_response()
                    } else {
                        (
                            axum::http::StatusCode::UNAUTHORIZED,
                            Json(serde_json::json!({ "error": "Invalid or expired session" })),
                        )
                            .into_response()
                    }
                }
            }),
        )
        .route(
            "/api/auth/logout",
            post(|| async { Json(serde_json::json!({})) }),
        );

    serve(router).await
}
