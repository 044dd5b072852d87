//! UserHub API server entry point.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use userhub_api::auth::TokenService;
use userhub_api::config::ApiConfig;
use userhub_api::error::AppError;
use userhub_api::state::AppState;
use userhub_core::clock::SystemClock;
use userhub_relay::dispatcher::{GrpcCommandDispatcher, RelayClientConfig};
use userhub_store::pg_user_repository::PgUserRepository;
use userhub_users::domain::password::Argon2PasswordHasher;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting UserHub API server");

    let config = ApiConfig::from_env()?;
    let addr = config.listen_addr()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;

    let clock = Arc::new(SystemClock);
    let dispatcher = GrpcCommandDispatcher::connect_lazy(
        &RelayClientConfig {
            endpoint: config.worker_url.clone(),
            connect_timeout: config.worker_connect_timeout,
        },
        clock.clone(),
    )?;

    let app_state = AppState::new(
        Arc::new(PgUserRepository::new(pool)),
        Arc::new(dispatcher),
        Arc::new(Argon2PasswordHasher::new()),
        Arc::new(TokenService::new(config.jwt_secret.as_bytes(), config.token_ttl)),
        clock,
    );

    // TODO: Replace CorsLayer::permissive() with the allowed front-end origins.
    let app = userhub_api::app(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!(%addr, worker = %config.worker_url, "Listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_err() {
                tracing::warn!("failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutdown signal received");
        })
        .await?;

    tracing::info!("UserHub API server stopped");
    Ok(())
}
