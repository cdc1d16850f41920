use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use agent_sync_api::{
    app,
    config::Config,
    jobs::{JobScheduler, PoolMetricsJob, StoreProbeJob},
    middleware,
};
use domain::services::SyncService;
use domain::SystemClock;
use persistence::PgSyncStore;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load().context("failed to load configuration")?;

    middleware::logging::init_logging(&config.logging)
        .context("failed to initialize logging")?;
    middleware::init_metrics().context("failed to install metrics recorder")?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting agent sync server");

    let pool = persistence::db::create_pool(&config.database.pool_settings()).await?;

    info!("Running database migrations");
    persistence::db::run_migrations(&pool).await?;

    let store = PgSyncStore::new(pool.clone());
    let service = Arc::new(SyncService::new(
        Arc::new(store),
        Arc::new(SystemClock),
        config.sync.limits(),
    ));

    let mut scheduler = JobScheduler::new();
    scheduler.register(PoolMetricsJob::new(pool));
    scheduler.register(StoreProbeJob::new(
        service.clone(),
        Duration::from_secs(config.sync.store_probe_interval_secs),
    ));
    scheduler.start();

    let addr = config.socket_addr().context("invalid server address")?;
    let app = app::create_app(config, service);

    info!(%addr, "Server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(10)).await;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
