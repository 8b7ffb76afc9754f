use thiserror::Error;

/// Failures surfaced by the Postgres-backed stores. Query handlers wrap
/// these; nothing here carries HTTP semantics.
#[derive(Debug, Error)]
pub enum TagStoreError {
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),
    #[error("Connection error: {0}")]
    Connection(#[from] deadpool_postgres::PoolError),
}
