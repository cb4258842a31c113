//! Pool configuration and the process-wide pool handle.
//!
//! The handle is constructed explicitly at application startup and passed to
//! adapters by dependency injection; there is no lazily-initialized global.
//! Its lifetime is the process's lifetime: per-request adapters never tear it
//! down, and the one teardown entry point is [`PoolHandle::shutdown`], invoked
//! only at process termination.

use std::env;
use std::str::FromStr;

use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use tokio_postgres::NoTls;

use crate::error::DbError;
use crate::results::PoolStats;

const DEFAULT_MAX_SIZE: usize = 16;

/// Connection-pool configuration for the Postgres backend.
#[derive(Debug, Clone)]
pub struct PgPoolConfig {
    /// `DATABASE_URL`-style connection string.
    pub url: String,
    /// Maximum pooled connections.
    pub max_size: usize,
    /// Require TLS on every connection (production). This build ships no TLS
    /// connector, so [`PoolHandle::connect`] rejects the flag at startup.
    pub require_tls: bool,
    /// Optional `application_name` reported to the server.
    pub application_name: Option<String>,
}

impl PgPoolConfig {
    /// Configuration for `url` with defaults (16 connections, no TLS).
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_size: DEFAULT_MAX_SIZE,
            require_tls: false,
            application_name: None,
        }
    }

    /// Read configuration from the environment: `DATABASE_URL` (required) and
    /// `APP_ENV` (`production` requires TLS).
    ///
    /// # Errors
    /// `DbError::ConfigError` if `DATABASE_URL` is unset.
    pub fn from_env() -> Result<Self, DbError> {
        let url = env::var("DATABASE_URL")
            .map_err(|_| DbError::ConfigError("DATABASE_URL is not set".to_string()))?;
        let require_tls = env::var("APP_ENV").is_ok_and(|v| v.eq_ignore_ascii_case("production"));
        Ok(Self {
            require_tls,
            ..Self::new(url)
        })
    }

    #[must_use]
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    #[must_use]
    pub fn with_application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = Some(name.into());
        self
    }
}

/// Cheaply cloneable handle over the shared deadpool connection pool.
///
/// All adapter instances in a process share one handle. Connections are
/// created lazily by the pool on first checkout; `connect` itself performs no
/// network I/O.
#[derive(Debug, Clone)]
pub struct PoolHandle {
    pool: Pool,
}

impl PoolHandle {
    /// Build the pool from `config`.
    ///
    /// # Errors
    /// `DbError::ConfigError` if the connection string does not parse or if
    /// `require_tls` is set (this build ships no TLS connector, so refusing at
    /// startup beats failing on first checkout), or `DbError::ConnectionError`
    /// if the pool cannot be constructed.
    pub fn connect(config: &PgPoolConfig) -> Result<Self, DbError> {
        if config.require_tls {
            return Err(DbError::ConfigError(
                "require_tls is set but no TLS connector is compiled in; \
                 connect over a trusted channel or build with a TLS connector"
                    .to_string(),
            ));
        }
        let mut pg_config = tokio_postgres::Config::from_str(&config.url)
            .map_err(|e| DbError::ConfigError(format!("invalid connection string: {e}")))?;
        if let Some(name) = &config.application_name {
            pg_config.application_name(name);
        }

        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );
        let pool = Pool::builder(manager)
            .max_size(config.max_size)
            .build()
            .map_err(|e| DbError::ConnectionError(format!("failed to build pool: {e}")))?;

        tracing::debug!(
            max_size = config.max_size,
            require_tls = config.require_tls,
            "postgres pool handle created"
        );
        Ok(Self { pool })
    }

    /// Build the pool from the environment (`DATABASE_URL`, `APP_ENV`).
    ///
    /// # Errors
    /// Same as [`PgPoolConfig::from_env`] and [`PoolHandle::connect`].
    pub fn from_env() -> Result<Self, DbError> {
        Self::connect(&PgPoolConfig::from_env()?)
    }

    /// Check out one connection. Suspends until a connection is available.
    ///
    /// # Errors
    /// `DbError::PoolError` if the pool is closed or checkout fails.
    pub async fn checkout(&self) -> Result<Object, DbError> {
        self.pool.get().await.map_err(DbError::PoolError)
    }

    /// Point-in-time snapshot of pool occupancy.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let status = self.pool.status();
        PoolStats {
            idle: status.available,
            waiting: status.waiting,
            total: status.size,
        }
    }

    /// Close the pool. Irrevocable: every subsequent checkout fails. Intended
    /// to be called once at process termination.
    pub fn shutdown(&self) {
        tracing::info!("shutting down postgres pool");
        self.pool.close();
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}
