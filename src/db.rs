//! Database connection management
//!
//! Handles connection pooling, schema creation and the PostgreSQL
//! implementations of the store traits.

pub mod membership;
pub mod pull_requests;
pub mod queries;
pub mod statistics;

pub use membership::PgMembershipStore;
pub use pull_requests::PgPullRequestStore;
pub use statistics::PgStatisticsStore;

use crate::config::DatabaseConfig;
use crate::error::AppError;
use crate::store::Stores;
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use std::sync::Arc;
use tokio_postgres::error::SqlState;
use tokio_postgres::NoTls;
use tracing::{debug, info};

/// Create a connection pool, over rustls when the configuration asks for TLS
pub fn create_pool(config: &DatabaseConfig) -> Result<Pool, AppError> {
    let mut cfg = Config::new();
    cfg.host = Some(config.host.clone());
    cfg.port = Some(config.port);
    cfg.user = Some(config.user.clone());
    cfg.password = Some(config.password.clone());
    cfg.dbname = Some(config.database.clone());
    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });
    cfg.pool = Some(deadpool_postgres::PoolConfig::new(config.max_pool_size));

    if config.require_tls {
        let certs = rustls_native_certs::load_native_certs();
        let mut root_store = rustls::RootCertStore::empty();
        for cert in certs.certs {
            root_store.add(cert).ok();
        }

        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();
        let tls = tokio_postgres_rustls::MakeRustlsConnect::new(tls_config);

        cfg.create_pool(Some(Runtime::Tokio1), tls)
            .map_err(|e| AppError::Config(format!("Failed to create TLS pool: {}", e)))
    } else {
        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| AppError::Config(format!("Failed to create pool: {}", e)))
    }
}

/// Check out one connection and run a trivial query
pub async fn verify_connection(pool: &Pool) -> Result<(), AppError> {
    let client = pool.get().await?;
    client.query_one("SELECT 1", &[]).await?;
    debug!("Database connection verified");
    Ok(())
}

/// Create the enum type, tables and indexes if they don't exist
pub async fn create_database_tables(pool: &Pool) -> Result<(), AppError> {
    let client = pool.get().await?;
    client.batch_execute(queries::CREATE_SCHEMA).await?;
    info!("✅ Database tables initialized");
    Ok(())
}

/// Store handles backed by one PostgreSQL pool
pub fn postgres_stores(pool: Pool) -> Stores {
    Stores {
        membership: Arc::new(PgMembershipStore::new(pool.clone())),
        pull_requests: Arc::new(PgPullRequestStore::new(pool.clone())),
        statistics: Arc::new(PgStatisticsStore::new(pool)),
    }
}

/// Whether a query failed on the given constraint class
pub(crate) fn violates(error: &tokio_postgres::Error, state: &SqlState) -> bool {
    error.code() == Some(state)
}
