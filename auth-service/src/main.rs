use std::net::SocketAddr;
use std::sync::Arc;

use auth_service::{
    build_router,
    config::AuthConfig,
    middleware::RoutePolicy,
    services::{
        AuthService, CsrfService, MemoryRevocationList, MemoryUserStore, SessionRevocation,
        SessionService, UserStore,
    },
    AppState,
};
use service_core::error::AppError;
use service_core::middleware::rate_limit::create_ip_rate_limiter;
use service_core::observability::logging::init_tracing;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = AuthConfig::from_env()?;

    init_tracing(&config.service_name, &config.log_level);

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting authentication service"
    );

    // Identity storage with the bootstrap admin account
    let users: Arc<dyn UserStore> = Arc::new(
        MemoryUserStore::with_admin(
            &config.bootstrap.admin_username,
            &config.bootstrap.admin_email,
            &config.bootstrap.admin_password,
        )
        .map_err(AppError::InternalError)?,
    );
    tracing::info!(
        username = %config.bootstrap.admin_username,
        "Bootstrap admin account ready"
    );

    let sessions = SessionService::new(&config.session);
    let csrf = CsrfService;
    let revocation: Arc<dyn SessionRevocation> = Arc::new(MemoryRevocationList::new());

    let auth = AuthService::new(users.clone(), sessions.clone(), csrf, revocation);

    let login_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.login_attempts,
        config.rate_limit.login_window_seconds,
    );
    let register_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.register_attempts,
        config.rate_limit.register_window_seconds,
    );

    let state = AppState {
        config: config.clone(),
        users,
        sessions,
        csrf,
        auth,
        routes: RoutePolicy::default(),
        login_rate_limiter,
        register_rate_limiter,
    };

    let app = build_router(state).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
