//! Reviewer Service - pull request reviewer assignment
//!
//! Assigns up to two active teammates of the author to every new pull
//! request, lets reviewers be swapped for someone else from their team, and
//! retires whole teams without leaving open reviews stranded.

mod config;
mod db;
mod error;
mod models;
mod review;
mod routes;
mod state;
mod store;

use crate::config::{Settings, StorageBackend};
use crate::review::ReviewerRng;
use crate::routes::create_router;
use crate::state::AppState;
use crate::store::Stores;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("🚀 Starting Reviewer Service...");

    let settings = Settings::load()?;
    info!("📋 Configuration loaded successfully");

    let stores = match settings.storage {
        StorageBackend::Postgres => {
            let pool = db::create_pool(&settings.database)?;
            db::verify_connection(&pool).await?;
            info!(
                "✅ Database pool created (TLS: {})",
                settings.database.require_tls
            );
            db::create_database_tables(&pool).await?;
            db::postgres_stores(pool)
        }
        StorageBackend::Memory => {
            warn!("⚠️  Using in-memory storage, data is lost on shutdown");
            Stores::in_memory()
        }
    };

    if let Some(seed) = settings.selection.seed {
        info!("🎲 Reviewer selection seeded with {}", seed);
    }
    let rng = ReviewerRng::from_seed(settings.selection.seed);

    let state = Arc::new(AppState::new(stores, rng));
    let app = create_router(state, &settings);

    let addr = SocketAddr::from((settings.server.host, settings.server.port));

    info!("🌐 Server listening on http://{}", addr);
    info!("");
    info!("📚 API Endpoints:");
    info!("   POST   /api/v1/users                              - Create user");
    info!("   GET    /api/v1/users/{{id}}/pull-requests           - Reviews assigned to user");
    info!("   POST   /api/v1/teams                              - Create team");
    info!("   POST   /api/v1/teams/{{id}}/deactivate-members      - Deactivate team");
    info!("   POST   /api/v1/pull-requests                      - Open pull request");
    info!("   POST   /api/v1/pull-requests/{{id}}/reassign        - Reassign reviewer");
    info!("   POST   /api/v1/pull-requests/{{id}}/merge           - Merge pull request");
    info!("   GET    /api/v1/statistics                         - Assignment statistics");
    info!("");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,reviewer_service=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("📴 Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("📴 Received terminate signal, initiating graceful shutdown...");
        },
    }
}
