use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

mod config;
mod core;
mod error;
mod server;
mod services;
mod utils;

use config::Config;
use services::Services;

#[derive(Parser)]
#[command(name = "trendlyrics")]
#[command(about = "Trending-chart aggregator with cached lyrics resolution over HTTP")]
#[command(version)]
struct Cli {
    /// Address to bind (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Config file path (optional)
    #[arg(short, long)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    utils::logging::init_logging(cli.verbose)?;

    // Load configuration; CLI flags win over file and environment
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    let services = Services::build(config).await;
    let config = services.config();

    let storage = services.storage().status().await;
    if storage.available {
        info!("Song cache ready: {}", storage.connection);
    } else {
        warn!("Running without song cache: {}", storage.connection);
    }

    let app = server::create_router(services);
    let addr = format!("{}:{}", config.host, config.port);

    info!("Server listening on http://{}", addr);
    info!("API endpoints:");
    info!("  GET  /              - liveness message");
    info!("  GET  /api/trending  - trending chart with lyrics availability");
    info!("  GET  /api/lyrics    - cached lyrics with provider fallback");
    info!("  GET  /test          - storage diagnostics");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
