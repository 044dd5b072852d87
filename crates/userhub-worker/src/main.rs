//! UserHub worker entry point.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;
use userhub_core::clock::SystemClock;
use userhub_store::pg_user_repository::PgUserRepository;
use userhub_store::schema;
use userhub_users::domain::password::Argon2PasswordHasher;
use userhub_worker::config::WorkerConfig;
use userhub_worker::error::WorkerError;
use userhub_worker::handler::UserEventHandler;
use userhub_worker::server;

#[tokio::main]
async fn main() -> Result<(), WorkerError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting UserHub worker");

    let config = WorkerConfig::from_env()?;
    let addr = config.listen_addr()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;
    schema::run_migrations(&pool).await?;

    let handler = UserEventHandler::new(
        Arc::new(PgUserRepository::new(pool)),
        Arc::new(Argon2PasswordHasher::new()),
        Arc::new(SystemClock),
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    server::serve(listener, handler, async {
        if tokio::signal::ctrl_c().await.is_err() {
            tracing::warn!("failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutdown signal received");
    })
    .await?;

    tracing::info!("UserHub worker stopped");
    Ok(())
}
