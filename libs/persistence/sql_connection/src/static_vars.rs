use std::{sync::OnceLock, time::Duration};

use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::NoTls;
use tracing::{debug, info, instrument};

use crate::config::{DbConnectConfig, DbOptionsConfig, ReadReplicaConfig};

static SQL_DATABASE_POOL: OnceLock<Pool> = OnceLock::new();
static READ_DATABASE_POOL: OnceLock<Pool> = OnceLock::new();

fn build_pool(uri: &str, max_conn: Option<u32>) -> Result<Pool, anyhow::Error> {
    let pg_config = uri.parse::<tokio_postgres::Config>()?;

    let mgr_config = ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    };
    let mgr = Manager::from_config(pg_config, NoTls, mgr_config);

    let mut pool_builder = Pool::builder(mgr)
        .runtime(deadpool_postgres::Runtime::Tokio1)
        .wait_timeout(Some(Duration::from_millis(2000)))
        .create_timeout(Some(Duration::from_millis(5000)))
        .recycle_timeout(Some(Duration::from_millis(100)));

    if let Some(max_conn) = max_conn {
        pool_builder = pool_builder.max_size(max_conn as usize);
    }

    Ok(pool_builder.build()?)
}

/// Pre-warms a connection pool by creating connections up front
async fn prewarm_pool(pool: &Pool, count: u32) {
    let mut handles = vec![];

    for i in 0..count {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            if let Err(e) = pool.get().await {
                tracing::warn!(
                    "Failed to pre-warm connection {}: {}",
                    i + 1,
                    e
                );
            }
        }));
    }

    for handle in handles {
        let _ = handle.await;
    }

    let status = pool.status();
    debug!(
        "Pool pre-warming complete: {} connections available",
        status.available
    );
}

#[instrument(skip_all, name = "connect-pgsql")]
pub async fn connect_postgres_db<C>(config: &C) -> Result<(), anyhow::Error>
where
    C: DbConnectConfig + DbOptionsConfig,
{
    info!(
        postgres.url = config.uri(),
        postgres.max_conn = ?config.max_conn(),
        postgres.min_conn = ?config.min_conn(),
        postgres.sql_logger = config.sql_logger()
    );

    let pool = build_pool(config.uri(), config.max_conn())?;

    if SQL_DATABASE_POOL.set(pool.clone()).is_err() {
        panic!("SQL database pool already established")
    }

    if let Some(min_conn) = config.min_conn() {
        prewarm_pool(&pool, min_conn).await;
    }

    Ok(())
}

#[instrument(skip_all, name = "connect-pgsql-read-replica")]
pub async fn connect_postgres_read_replica<C>(
    config: &C,
) -> Result<(), anyhow::Error>
where
    C: DbConnectConfig + DbOptionsConfig + ReadReplicaConfig,
{
    let Some(read_uri) = config.read_replica_uri() else {
        return Ok(());
    };

    info!(
        postgres.read_replica.url = read_uri,
        postgres.read_replica.max_conn = ?config.read_max_conn(),
        "Setting up read replica connection pool"
    );

    let pool = build_pool(read_uri, config.read_max_conn())?;

    if READ_DATABASE_POOL.set(pool.clone()).is_err() {
        panic!("Read replica database pool already established")
    }

    if let Some(min_conn) = config.read_min_conn() {
        prewarm_pool(&pool, min_conn).await;
    }

    Ok(())
}

pub(crate) fn get_sql_pool() -> &'static Pool {
    SQL_DATABASE_POOL
        .get()
        .expect("SQL database pool not initialized")
}

pub(crate) fn get_read_sql_pool() -> Option<&'static Pool> {
    READ_DATABASE_POOL.get()
}
