//! colorhunt-api - Color Hunt service
//!
//! Verifies that submitted photos match a pack's target color, completes
//! packs once all nine cells verify, and keeps social counters (votes,
//! follows, comments) consistent with their edges.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use colorhunt_api::config::{Args, ServiceConfig};
use colorhunt_api::services::{HttpImageSource, SharedSecretTokens};
use colorhunt_api::AppState;
use colorhunt_common::config::load_bootstrap_config;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config =
        load_bootstrap_config(args.config.as_deref()).context("Failed to load configuration")?;
    let config = ServiceConfig::resolve(&args, &toml_config).context("Invalid configuration")?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=info", config.log_level))),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting colorhunt-api v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Root folder: {}", config.root_folder.display());
    info!("Database: {}", config.database_path.display());

    let db_pool = colorhunt_common::db::init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;
    info!("Database connection established");

    let identity = Arc::new(SharedSecretTokens::new(config.token_secret.clone())?);
    let images = Arc::new(HttpImageSource::new(
        config.image_fetch_timeout,
        config.max_image_bytes,
    )?);

    let state = AppState::new(db_pool, identity, images)
        .with_transaction_max_wait_ms(config.transaction_max_wait_ms);
    let app = colorhunt_api::build_router(state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.listen_addr))?;
    info!("Listening on http://{}", config.listen_addr);
    info!("Health check: http://{}/health", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
