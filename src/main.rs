//! LearnHub Server: real-time coordination for online learning.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use learnhub_api::{AppState, build_app};
use learnhub_core::config::AppConfig;
use learnhub_database::Stores;
use learnhub_worker::CronScheduler;

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(name = "learnhub-server", version, about = "LearnHub real-time server")]
struct Args {
    /// Directory holding default.toml and the environment overlays
    #[arg(long, env = "LEARNHUB_CONFIG_DIR", default_value = "config")]
    config_dir: String,

    /// Environment overlay to merge on top of default.toml
    #[arg(long, env = "LEARNHUB_ENV", default_value = "development")]
    env: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = AppConfig::load_from(&args.config_dir, &args.env).with_context(|| {
        format!(
            "failed to load configuration from '{}' (env: {})",
            args.config_dir, args.env
        )
    })?;

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        return Err(e);
    }
    Ok(())
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!("Starting LearnHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Stores ───────────────────────────────────────────
    tracing::info!(backend = ?config.database.backend, "Opening stores...");
    let stores = Stores::from_config(&config.database)
        .await
        .context("failed to open stores")?;
    tracing::info!(backend = stores.backend_name(), "Stores ready");

    // ── Step 2: Services, realtime engine, sweeps ────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let state = AppState::new(config, stores);

    // ── Step 3: Cron scheduler ───────────────────────────────────
    let mut scheduler = if state.config.worker.enabled {
        tracing::info!("Starting cron scheduler...");
        let scheduler = CronScheduler::new(Arc::clone(&state.sweeps))
            .await
            .context("failed to create scheduler")?;
        scheduler
            .register_default_tasks(&state.config.presence, &state.config.notifications)
            .await
            .context("failed to register sweeps")?;
        scheduler.start().await.context("failed to start scheduler")?;
        Some(scheduler)
    } else {
        tracing::info!("Cron scheduler disabled; sweeps run only via the admin endpoint");
        None
    };

    // ── Step 4: HTTP server ──────────────────────────────────────
    let app = build_app(state.clone());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("LearnHub server listening on {}", addr);

    let realtime = Arc::clone(&state.realtime);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
            // Sockets hold the server open until they close.
            realtime.shutdown();
        })
        .await
        .context("server error")?;

    // ── Step 5: Drain ────────────────────────────────────────────
    if let Some(scheduler) = scheduler.as_mut() {
        match tokio::time::timeout(grace, scheduler.shutdown()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "Scheduler shutdown failed"),
            Err(_) => tracing::warn!("Scheduler did not stop within the grace period"),
        }
    }
    state.stores.close().await;

    tracing::info!("LearnHub server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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
