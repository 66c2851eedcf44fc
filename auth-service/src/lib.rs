pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Json, Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    rate_limit::{ip_rate_limit_middleware, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;

use crate::config::AuthConfig;
use crate::middleware::RoutePolicy;
use crate::services::{AuthService, CsrfService, SessionService, UserStore};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::auth::csrf,
        handlers::auth::login,
        handlers::auth::validate,
        handlers::auth::logout,
        handlers::auth::register,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::auth::LoginRequest,
            dtos::auth::LoginResponse,
            dtos::auth::RegisterRequest,
            dtos::auth::RegisterResponse,
            dtos::auth::CsrfResponse,
            dtos::auth::ValidateResponse,
            models::Role,
            models::UserResponse,
        )
    ),
    tags(
        (name = "Authentication", description = "Session lifecycle and access control"),
        (name = "Observability", description = "Service health and metadata"),
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: AuthConfig,
    pub users: Arc<dyn UserStore>,
    pub sessions: SessionService,
    pub csrf: CsrfService,
    pub auth: AuthService,
    pub routes: RoutePolicy,
    pub login_rate_limiter: IpRateLimiter,
    pub register_rate_limiter: IpRateLimiter,
}

pub async fn build_router(state: AppState) -> Result<Router, AppError> {
    // Credential endpoints carry their own tighter limits.
    let login_limiter = state.login_rate_limiter.clone();
    let login_route = Router::new()
        .route("/api/auth/login", post(handlers::auth::login))
        .layer(from_fn_with_state(login_limiter, ip_rate_limit_middleware));

    let register_limiter = state.register_rate_limiter.clone();
    let register_route = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .layer(from_fn_with_state(
            register_limiter,
            ip_rate_limit_middleware,
        ));

    let cors = CorsLayer::new()
        .allow_origin(
            state
                .config
                .security
                .allowed_origins
                .iter()
                .map(|o| {
                    o.parse::<axum::http::HeaderValue>().unwrap_or_else(|e| {
                        tracing::error!("Invalid CORS origin '{}': {}. Using fallback.", o, e);
                        axum::http::HeaderValue::from_static("http://localhost:3000")
                    })
                })
                .collect::<Vec<axum::http::HeaderValue>>(),
        )
        .allow_credentials(true)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::HeaderName::from_static("x-csrf-token"),
            axum::http::header::HeaderName::from_static("x-request-id"),
        ]);

    let app = Router::new()
        .route("/health", get(health_check))
        .route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        // Authentication routes
        .route("/api/auth/csrf", get(handlers::auth::csrf))
        .route("/api/auth/validate", get(handlers::auth::validate))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .merge(login_route)
        .merge(register_route)
        // Routes the gate protects
        .route("/login", get(handlers::pages::login_page))
        .route("/dashboard", get(handlers::pages::dashboard))
        .route("/admin", get(handlers::pages::admin_panel))
        .route("/api/protected/ping", get(handlers::pages::protected_ping))
        .route("/api/protected/echo", post(handlers::pages::protected_echo))
        .route("/api/admin/users", get(handlers::pages::admin_users))
        // Edge access gate: classification, session, CSRF, role
        .layer(from_fn_with_state(
            state.clone(),
            middleware::edge_gate_middleware,
        ))
        .with_state(state)
        // Tracing layer with request ids in the span
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        // Security headers wrap every branch, gate short-circuits included
        .layer(from_fn(security_headers_middleware))
        .layer(cors);

    Ok(app)
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy")
    ),
    tag = "Observability"
)]
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
    }))
}
