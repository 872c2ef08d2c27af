use crate::error::DbError;
use configuration::DatabaseSettings;
use serde::Serialize;
use sqlx::mysql::{MySql, MySqlConnection, MySqlPool, MySqlPoolOptions};
use sqlx::pool::PoolConnection;
use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// A snapshot of the pool's accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    /// Open connections, idle or handed out.
    pub size: u32,
    /// Idle connections as sqlx counts them. A connection released moments ago
    /// may not be counted yet.
    pub idle: usize,
    /// Connections currently handed out to a caller.
    pub in_use: u32,
    pub max_connections: u32,
}

/// The process-wide MySQL connection pool.
///
/// Constructed once at startup and shared by cloning; clones refer to the same
/// underlying pool. Every statement goes through the same cycle: `acquire`, run
/// the statement under [`DbPool::bounded`], then `release`.
#[derive(Debug, Clone)]
pub struct DbPool {
    pool: MySqlPool,
    query_timeout: Duration,
    max_connections: u32,
    in_use: Arc<AtomicU32>,
}

/// A connection handed out by [`DbPool::acquire`].
///
/// sqlx returns a dropped connection to its pool on a background task, so the
/// pool's own idle count lags behind. This guard keeps the exact in-use count:
/// it is incremented on acquire and decremented when the guard is dropped,
/// whether through [`DbPool::release`] or not.
#[derive(Debug)]
pub struct PooledConnection {
    conn: PoolConnection<MySql>,
    in_use: Arc<AtomicU32>,
}

impl Deref for PooledConnection {
    type Target = MySqlConnection;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        self.in_use.fetch_sub(1, Ordering::SeqCst);
    }
}

impl DbPool {
    /// Opens the pool and establishes `min_connections` connections up front.
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, DbError> {
        let url = database_url(settings)?;
        let pool = pool_options(settings).connect(url).await?;
        tracing::info!(
            max_connections = settings.max_connections,
            "Database connection pool established."
        );
        Ok(Self::from_pool(pool, settings))
    }

    /// Builds the pool without opening any connection; the first `acquire` connects.
    pub fn connect_lazy(settings: &DatabaseSettings) -> Result<Self, DbError> {
        let url = database_url(settings)?;
        let pool = pool_options(settings).connect_lazy(url)?;
        Ok(Self::from_pool(pool, settings))
    }

    fn from_pool(pool: MySqlPool, settings: &DatabaseSettings) -> Self {
        Self {
            pool,
            query_timeout: settings.query_timeout(),
            max_connections: settings.max_connections,
            in_use: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Hands out a connection, waiting while the pool is exhausted.
    ///
    /// The wait is bounded by the configured acquire timeout; expiry surfaces as
    /// `sqlx::Error::PoolTimedOut`.
    pub async fn acquire(&self) -> Result<PooledConnection, DbError> {
        let conn = self.pool.acquire().await?;
        let in_use = self.in_use.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::trace!(in_use, "Acquired database connection.");
        Ok(PooledConnection {
            conn,
            in_use: Arc::clone(&self.in_use),
        })
    }

    /// Returns a connection to the pool.
    ///
    /// Must be called exactly once per successful `acquire`, whatever the outcome
    /// of the statement. A connection whose statement hit the deadline may still
    /// have a half-read response on the wire, so it is closed instead of reused.
    pub fn release<T>(&self, mut conn: PooledConnection, outcome: &Result<T, DbError>) {
        if let Err(DbError::QueryTimeout(_)) = outcome {
            conn.conn.close_on_drop();
        }
        drop(conn);
        tracing::trace!(
            in_use = self.in_use.load(Ordering::SeqCst),
            "Released database connection."
        );
    }

    /// Runs one statement future under the query deadline.
    pub async fn bounded<T, F>(&self, statement: F) -> Result<T, DbError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.query_timeout, statement).await {
            Ok(result) => result.map_err(DbError::from),
            Err(_) => Err(DbError::QueryTimeout(self.query_timeout)),
        }
    }

    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            size: self.pool.size(),
            idle: self.pool.num_idle(),
            in_use: self.in_use.load(Ordering::SeqCst),
            max_connections: self.max_connections,
        }
    }

    /// Waits for handed-out connections to come back, then closes every connection.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database connection pool closed.");
    }
}

fn database_url(settings: &DatabaseSettings) -> Result<&str, DbError> {
    settings
        .url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| DbError::ConnectionConfigError("DATABASE_URL must be set.".to_string()))
}

fn pool_options(settings: &DatabaseSettings) -> MySqlPoolOptions {
    MySqlPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(settings.acquire_timeout())
        .idle_timeout(Some(settings.idle_timeout()))
}
