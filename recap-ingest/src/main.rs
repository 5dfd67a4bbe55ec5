//! recap-ingest - export ingest and enrichment service
//!
//! Serves the upload, snapshot, chart and relay endpoints plus an SSE
//! progress stream.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use recap_common::config::ConfigResolver;
use recap_common::events::EventBus;
use recap_ingest::config::IngestConfig;
use recap_ingest::logging::open_log_file;
use recap_ingest::{build_router, AppState};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Capacity of the progress event bus
const EVENT_BUS_CAPACITY: usize = 1000;

/// Command-line arguments for recap-ingest
#[derive(Parser, Debug)]
#[command(name = "recap-ingest")]
#[command(about = "Export ingest and enrichment service")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long, env = "RECAP_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "RECAP_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "RECAP_PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let resolver = ConfigResolver::new("recap");
    let mut toml_config = resolver
        .load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;

    if let Some(host) = args.host {
        toml_config.server.host = host;
    }
    if let Some(port) = args.port {
        toml_config.server.port = port;
    }
    if let Some(level) = args.log_level {
        toml_config.logging.level = level;
    }

    // Dropping the guard flushes the file writer, so it lives until exit
    let (file_writer, _log_guard) = match toml_config.logging.file.as_deref() {
        Some(path) => {
            let (writer, guard) = open_log_file(path)?;
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "recap_ingest={level},recap_common={level},tower_http=info",
                    level = toml_config.logging.level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_writer.map(|writer| {
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
        }))
        .init();

    info!("Starting recap-ingest v{}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &toml_config.logging.file {
        info!("Also logging to {}", path.display());
    }

    let config = IngestConfig::from_toml(&toml_config).context("Invalid configuration")?;
    let addr = config.bind_addr()?;
    info!(
        window_start = %config.window.start,
        window_end = %config.window.end,
        relay = %config.relay.url,
        "Configuration resolved"
    );

    let state = AppState::new(config, EventBus::new(EVENT_BUS_CAPACITY))
        .context("Failed to initialise services")?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("recap-ingest listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

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
            Ok(mut stream) => {
                stream.recv().await;
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
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
