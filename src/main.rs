//! Campus access service entry point

use campus_access::{
    auth::JwtService,
    config::AppConfig,
    db,
    middleware::{AppState, IpRateLimiter, RateLimitConfig},
    repository::{RoleRepository, UserRepository},
    routes,
    services::{AuthService, GrantService, ValidationService},
    telemetry,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env files are a development convenience; production sets real
    // environment variables
    if let Ok(profile) = std::env::var("CAMPUS_ENV") {
        dotenv::from_filename(format!(".env.{}", profile)).ok();
    } else {
        dotenv::from_filename(".env.local").ok();
        dotenv::dotenv().ok();
    }

    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    telemetry::init_telemetry(&config);
    telemetry::init_metrics();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Campus access service starting");

    let db_pool = db::create_pool(&config.database).await?;
    db::run_migrations(&db_pool).await?;
    db::check_schema(&db_pool).await;

    tracing::info!("Database initialized");

    let config = Arc::new(config);
    let jwt_service = Arc::new(JwtService::from_config(&config)?);

    let user_repo = UserRepository::new(db_pool.clone());
    let role_repo = RoleRepository::new(db_pool.clone());
    let grant_service = Arc::new(GrantService::new(db_pool.clone(), config.clone()));
    let validation_service = Arc::new(ValidationService::new(db_pool.clone()));
    let auth_service = Arc::new(AuthService::new(
        db_pool.clone(),
        config.clone(),
        jwt_service.clone(),
        user_repo.clone(),
        role_repo.clone(),
        GrantService::new(db_pool.clone(), config.clone()),
    ));

    let app_state = Arc::new(AppState {
        config: config.clone(),
        db: db_pool.clone(),
        jwt_service,
        auth_service,
        grant_service,
        validation_service,
        user_repo,
        role_repo,
        rate_limiter: Arc::new(IpRateLimiter::new(RateLimitConfig::default())),
    });

    // Drop stale per-IP limiter windows so the map cannot grow unbounded
    let limiter = app_state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            limiter.cleanup();
        }
    });

    let app = routes::create_router(app_state);

    let addr = &config.server.addr;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(config.server.graceful_shutdown_timeout_secs))
    .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown on Ctrl+C or SIGTERM
async fn shutdown_signal(timeout_secs: u64) {
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
            tracing::info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Terminate signal received, starting graceful shutdown");
        },
    }

    tokio::time::sleep(tokio::time::Duration::from_secs(timeout_secs)).await;
    tracing::warn!("Graceful shutdown timeout reached, forcing exit");
}
