//! Worker configuration, read once from the environment.

use std::net::SocketAddr;

use crate::error::WorkerError;

/// Settings the worker needs before it can accept streams.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// `DATABASE_URL`.
    pub database_url: String,
    /// `WORKER_HOST`, default `0.0.0.0`.
    pub host: String,
    /// `WORKER_PORT`, default `50051`.
    pub port: u16,
    /// `DATABASE_MAX_CONNECTIONS`, default `10`.
    pub max_connections: u32,
}

impl WorkerConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `WorkerError::Config` if a variable is missing or malformed.
    pub fn from_env() -> Result<Self, WorkerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `WorkerError::Config` if a variable is missing or malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, WorkerError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| WorkerError::Config("DATABASE_URL environment variable must be set".into()))?;
        let host = lookup("WORKER_HOST").unwrap_or_else(|| "0.0.0.0".to_owned());
        let port = lookup("WORKER_PORT")
            .map_or(Ok(50051), |v| v.parse())
            .map_err(|e| WorkerError::Config(format!("WORKER_PORT must be a valid u16: {e}")))?;
        let max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .map_or(Ok(10), |v| v.parse())
            .map_err(|e| {
                WorkerError::Config(format!("DATABASE_MAX_CONNECTIONS must be a valid u32: {e}"))
            })?;

        Ok(Self {
            database_url,
            host,
            port,
            max_connections,
        })
    }

    /// The address to listen on.
    ///
    /// # Errors
    ///
    /// Returns `WorkerError::Config` if host and port do not form an address.
    pub fn listen_addr(&self) -> Result<SocketAddr, WorkerError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| WorkerError::Config(format!("invalid WORKER_HOST:WORKER_PORT combination: {e}")))
    }
}
