//! Server configuration loaded from environment variables (and `.env` via dotenvy).

use crate::error::ConfigError;
use std::str::FromStr;
use std::time::Duration;

/// Sentinel `DATABASE_URL` selecting the in-process store.
pub const MEMORY_DATABASE_URL: &str = "memory";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    /// Prefix every viewset is nested under (e.g. `/api`).
    pub api_prefix: String,
    pub seed_sample_data: bool,
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".into(),
            port: 8080,
            database_url: "postgres://localhost/viewset".into(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            api_prefix: "/api".into(),
            seed_sample_data: true,
            body_limit_bytes: 1024 * 1024,
        }
    }
}

fn parsed<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Env {
            var,
            reason: format!("'{}': {}", raw, e),
        }),
        Err(_) => Ok(default),
    }
}

/// `/api`, `api/` and `/api/` all become `/api`; an empty prefix becomes `/`.
pub fn normalize_prefix(raw: &str) -> String {
    format!("/{}", raw.trim().trim_matches('/'))
}

impl ServerConfig {
    /// Load configuration from environment variables; unset variables keep `Default` values.
    ///
    /// | Env Var                          | Default                         |
    /// |----------------------------------|---------------------------------|
    /// | `HOST`                           | `0.0.0.0`                       |
    /// | `PORT`                           | `8080`                          |
    /// | `DATABASE_URL`                   | `postgres://localhost/viewset`  |
    /// | `DATABASE_MAX_CONNECTIONS`       | `10`                            |
    /// | `DATABASE_MIN_CONNECTIONS`       | `1`                             |
    /// | `DATABASE_ACQUIRE_TIMEOUT_SECS`  | `30`                            |
    /// | `API_PREFIX`                     | `/api`                          |
    /// | `SEED_SAMPLE_DATA`               | `true`                          |
    /// | `BODY_LIMIT_BYTES`               | `1048576`                       |
    pub fn from_env() -> Result<Self, ConfigError> {
        let d = ServerConfig::default();
        Ok(ServerConfig {
            host: std::env::var("HOST").unwrap_or(d.host),
            port: parsed("PORT", d.port)?,
            database_url: std::env::var("DATABASE_URL").unwrap_or(d.database_url),
            max_connections: parsed("DATABASE_MAX_CONNECTIONS", d.max_connections)?,
            min_connections: parsed("DATABASE_MIN_CONNECTIONS", d.min_connections)?,
            acquire_timeout: Duration::from_secs(parsed(
                "DATABASE_ACQUIRE_TIMEOUT_SECS",
                d.acquire_timeout.as_secs(),
            )?),
            api_prefix: normalize_prefix(&std::env::var("API_PREFIX").unwrap_or(d.api_prefix)),
            seed_sample_data: parsed("SEED_SAMPLE_DATA", d.seed_sample_data)?,
            body_limit_bytes: parsed("BODY_LIMIT_BYTES", d.body_limit_bytes)?,
        })
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url == MEMORY_DATABASE_URL
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_is_normalized() {
        assert_eq!(normalize_prefix("api"), "/api");
        assert_eq!(normalize_prefix("/api/v1/"), "/api/v1");
        assert_eq!(normalize_prefix(""), "/");
    }

    #[test]
    fn memory_sentinel() {
        let mut cfg = ServerConfig::default();
        assert!(!cfg.uses_memory_store());
        cfg.database_url = MEMORY_DATABASE_URL.into();
        assert!(cfg.uses_memory_store());
        assert_eq!(cfg.bind_addr(), "0.0.0.0:8080");
    }
}
