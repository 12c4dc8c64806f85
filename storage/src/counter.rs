//! Table-backed downstream counter

use std::time::Duration;

use async_trait::async_trait;
use sqlx::any::{AnyPoolOptions, AnyQueryResult};
use sqlx::AnyPool;

use burst_bench_core::{CounterError, DatabaseConfig, DownstreamCounter};

/// Database flavour behind a connection URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// MySQL or MariaDB
    MySql,
    /// SQLite file or in-memory database
    Sqlite,
}

impl Backend {
    /// Pick the backend from a connection URL
    pub fn from_url(url: &str) -> Option<Self> {
        if url.starts_with("mysql://") || url.starts_with("mariadb://") {
            Some(Self::MySql)
        } else if url.starts_with("sqlite:") {
            Some(Self::Sqlite)
        } else {
            None
        }
    }

    /// Short name for logging
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
        }
    }
}

/// Counts the rows of one table and clears them in the same transaction.
///
/// Only rows up to the largest id seen by the count are deleted, so rows
/// inserted while the transaction is open survive into the next trial
/// instead of vanishing uncounted.
#[derive(Debug, Clone)]
pub struct SqlCounter {
    pool: AnyPool,
    backend: Backend,
    count_sql: String,
    clear_sql: String,
}

impl SqlCounter {
    /// Connect to the configured database.
    ///
    /// # Errors
    ///
    /// Returns [`CounterError::Connect`] if the URL names an unsupported
    /// backend or the first connection cannot be established.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, CounterError> {
        let backend = Backend::from_url(&config.url).ok_or_else(|| {
            CounterError::Connect(format!("unsupported database URL {:?}", config.url))
        })?;

        sqlx::any::install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&config.url)
            .await
            .map_err(|e| CounterError::Connect(e.to_string()))?;

        tracing::info!(
            backend = backend.as_str(),
            table = %config.table,
            max_connections = config.max_connections,
            "Connected to downstream counter"
        );

        Ok(Self::from_pool(pool, backend, &config.table))
    }

    /// Wrap an existing pool.
    ///
    /// `table` is interpolated into SQL and must be a plain identifier;
    /// `HarnessConfig::validate` enforces this for configured tables.
    pub fn from_pool(pool: AnyPool, backend: Backend, table: &str) -> Self {
        Self {
            pool,
            backend,
            count_sql: format!("SELECT COUNT(id), MAX(id) FROM {table}"),
            clear_sql: format!("DELETE FROM {table} WHERE id <= ?"),
        }
    }

    /// Get the underlying pool
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Get the backend in use
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl DownstreamCounter for SqlCounter {
    fn name(&self) -> &str {
        self.backend.as_str()
    }

    async fn read_and_reset(&self) -> Result<u64, CounterError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CounterError::Begin(e.to_string()))?;

        let (count, max_id): (i64, Option<i64>) = sqlx::query_as(&self.count_sql)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| CounterError::Read(e.to_string()))?;

        if let Some(max_id) = max_id {
            let result: AnyQueryResult = sqlx::query(&self.clear_sql)
                .bind(max_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| CounterError::Clear(e.to_string()))?;

            if result.rows_affected() != count as u64 {
                tracing::warn!(
                    counted = count,
                    cleared = result.rows_affected(),
                    "Cleared row count differs from counted rows"
                );
            }
        }

        tx.commit()
            .await
            .map_err(|e| CounterError::Commit(e.to_string()))?;

        Ok(count.max(0) as u64)
    }
}
