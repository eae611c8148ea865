//! # Tour CRM API Main Entry Point

use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tourcrm::{
    config::ConfigLoader,
    db::{init_pool, run_migrations},
    retention::RetentionJob,
    server::{AppState, run_server},
    telemetry::init_tracing,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from layered env files and variables
    let config = ConfigLoader::new()
        .load()
        .context("Failed to load configuration")?;
    init_tracing(&config).context("Failed to initialize tracing")?;

    tracing::info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(config = %redacted_json, "Effective configuration");
    }

    let db = init_pool(&config).await?;
    if config.run_migrations {
        run_migrations(&db).await?;
    }

    let shutdown = CancellationToken::new();
    let retention = RetentionJob::new(config.retention.clone(), Arc::new(db.clone()));
    let retention_handle = tokio::spawn(retention.run(shutdown.child_token()));

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!("Shutdown signal received");
        signal_token.cancel();
    });

    let state = AppState::new(config, db)?;
    let served = run_server(state, shutdown.clone()).await;

    shutdown.cancel();
    if let Err(err) = retention_handle.await {
        tracing::error!(error = %err, "Retention task panicked");
    }
    served
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
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
}
