//! Reconstruction API Server
//!
//! Accepts scene photographs or a short video and returns a Gaussian splat
//! reconstruction.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use recon_api::config::ServiceConfig;
use recon_api::state::AppState;

/// Reconstruction API Server
#[derive(Parser, Debug)]
#[command(name = "recon-api")]
#[command(about = "Scene reconstruction server producing Gaussian splat point clouds")]
struct Args {
    /// YAML configuration file (environment variables are used when absent)
    #[arg(short, long, env = "RECON_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overriding the configuration
    #[arg(short, long, env = "RECON_LISTEN_ADDR")]
    listen: Option<String>,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Number of worker threads
    #[arg(long, env = "RECON_WORKER_THREADS")]
    worker_threads: Option<usize>,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Build runtime with configured threads
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(run_server(args))
}

async fn run_server(args: Args) -> Result<()> {
    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    // Initialize Prometheus metrics exporter
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    recon_api::metrics::describe_metrics();

    info!("Starting reconstruction API server");

    let mut config = match &args.config {
        Some(path) => ServiceConfig::from_yaml(path)?,
        None => ServiceConfig::from_env(),
    };
    if let Some(listen) = args.listen {
        config.listen = listen;
    }

    let addr: SocketAddr = config
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address: {}", config.listen))?;

    // Initialize application state
    let state = Arc::new(AppState::new(config, Some(prometheus_handle))?);
    let app = recon_api::build_router(state);

    info!("Reconstruction API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}
