pub use config::{DbConnectConfig, DbOptionsConfig, PostgresDbConfig, ReadReplicaConfig};
pub use impl_get_connect::SqlConnect;
pub use static_vars::{connect_postgres_db, connect_postgres_read_replica};

pub mod config;
mod impl_get_connect;
mod static_vars;
