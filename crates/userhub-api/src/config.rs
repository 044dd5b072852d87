//! Gateway configuration, read once from the environment.

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::AppError;

/// Settings the gateway needs before it can serve requests.
#[derive(Clone)]
pub struct ApiConfig {
    /// `DATABASE_URL`.
    pub database_url: String,
    /// `HOST`, default `0.0.0.0`.
    pub host: String,
    /// `PORT`, default `8092`.
    pub port: u16,
    /// `WORKER_URL`, default `http://127.0.0.1:50051`.
    pub worker_url: String,
    /// `JWT_SECRET`, required.
    pub jwt_secret: String,
    /// `TOKEN_TTL_MINUTES`, default 30.
    pub token_ttl: Duration,
    /// `WORKER_CONNECT_TIMEOUT_SECS`, default 5.
    pub worker_connect_timeout: Duration,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("worker_url", &self.worker_url)
            .field("token_ttl", &self.token_ttl)
            .field("worker_connect_timeout", &self.worker_connect_timeout)
            .finish_non_exhaustive()
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String, AppError> {
    lookup(key)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Config(format!("{key} environment variable must be set")))
}

fn number<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError>
where
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|e| AppError::Config(format!("{key} must be a valid number: {e}"))),
    }
}

impl ApiConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is missing or malformed.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is missing or malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        Ok(Self {
            database_url: required(&lookup, "DATABASE_URL")?,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_owned()),
            port: number(&lookup, "PORT", 8092)?,
            worker_url: lookup("WORKER_URL").unwrap_or_else(|| "http://127.0.0.1:50051".to_owned()),
            jwt_secret: required(&lookup, "JWT_SECRET")?,
            token_ttl: Duration::from_secs(number(&lookup, "TOKEN_TTL_MINUTES", 30_u64)? * 60),
            worker_connect_timeout: Duration::from_secs(number(
                &lookup,
                "WORKER_CONNECT_TIMEOUT_SECS",
                5_u64,
            )?),
        })
    }

    /// The address to listen on.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if host and port do not form an address.
    pub fn listen_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}
