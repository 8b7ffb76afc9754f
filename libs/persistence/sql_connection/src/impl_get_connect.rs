use deadpool_postgres::{Object, Pool};

use crate::static_vars::{get_read_sql_pool, get_sql_pool};

#[derive(Debug, Clone)]
pub struct SqlConnect {
    pool: Pool,
    read_pool: Option<Pool>,
}

impl SqlConnect {
    pub fn new(pool: Pool) -> Self {
        Self {
            pool,
            read_pool: None,
        }
    }

    pub fn from_global() -> Self {
        Self {
            pool: get_sql_pool().clone(),
            read_pool: get_read_sql_pool().cloned(),
        }
    }

    /// Get connection for write operations (always uses primary database)
    pub async fn get_client(
        &self,
    ) -> Result<Object, deadpool_postgres::PoolError> {
        self.pool.get().await
    }

    /// Get connection for read operations (uses read replica if available)
    pub async fn get_read_client(
        &self,
    ) -> Result<Object, deadpool_postgres::PoolError> {
        if let Some(read_pool) = &self.read_pool {
            return read_pool.get().await;
        }
        self.pool.get().await
    }

    /// Get connection for heavy aggregate queries; prefers the read
    /// replica so reporting never contends with the write path.
    pub async fn get_analytics_client(
        &self,
    ) -> Result<Object, deadpool_postgres::PoolError> {
        self.get_read_client().await
    }

    /// Get pool statistics for monitoring
    pub fn get_pool_status(&self) -> (usize, usize, Option<(usize, usize)>) {
        let write_status = self.pool.status();
        let read_stats = self
            .read_pool
            .as_ref()
            .map(|pool| (pool.status().available, pool.status().size));

        (write_status.available, write_status.size, read_stats)
    }
}

impl Default for SqlConnect {
    fn default() -> Self { Self::from_global() }
}
