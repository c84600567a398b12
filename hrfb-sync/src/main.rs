//! hrfb-sync - HR feedback spreadsheet sync service
//!
//! Imports new rows from the feedback spreadsheet, classifies their comment
//! sentiment, and appends them to the feedback store. Passes run on
//! `POST /sync`, on an optional in-process schedule, or once via `--once`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use hrfb_common::config::TomlConfig;
use hrfb_sync::api::sync::SyncResponse;
use hrfb_sync::db::SqliteFeedbackStore;
use hrfb_sync::services::spawn_scheduler;
use hrfb_sync::AppState;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for hrfb-sync
#[derive(Parser, Debug)]
#[command(name = "hrfb-sync")]
#[command(about = "HR feedback spreadsheet sync service")]
#[command(version)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on (overrides configuration)
    #[arg(short, long)]
    bind: Option<String>,

    /// Run a single sync pass, print the result and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hrfb_sync=info,hrfb_common=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    config.validate().context("Invalid configuration")?;

    info!("Starting hrfb-sync v{}", env!("CARGO_PKG_VERSION"));

    let db_path = config.database.resolved_path();
    info!("Database: {}", db_path.display());
    let db_pool = hrfb_sync::db::init_database_pool(&db_path)
        .await
        .context("Failed to open feedback database")?;
    let store = Arc::new(SqliteFeedbackStore::new(db_pool));

    let pipeline = Arc::new(hrfb_sync::build_pipeline(&config, store)?);

    if args.once {
        return run_once(&pipeline).await;
    }

    let cancel = CancellationToken::new();
    let scheduler = config
        .sync
        .interval_secs
        .map(|secs| spawn_scheduler(pipeline.clone(), Duration::from_secs(secs), cancel.clone()));

    let app = hrfb_sync::build_router(AppState::new(pipeline));

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server.bind))?;
    info!("Listening on http://{}", config.server.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    cancel.cancel();
    if let Some(handle) = scheduler {
        handle.await.context("Scheduler task panicked")?;
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Single pass for cron-style invocation
async fn run_once(pipeline: &hrfb_sync::SyncPipeline) -> Result<()> {
    match pipeline.run().await {
        Ok(report) => {
            let response = SyncResponse {
                success: true,
                processed: report.processed,
                message: report.message(),
            };
            println!("{}", serde_json::to_string(&response)?);
            Ok(())
        }
        Err(e) => {
            println!(
                "{}",
                serde_json::json!({ "success": false, "error": e.to_string() })
            );
            Err(e.into())
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
