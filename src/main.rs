use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use wopi_server::{
    config::Config,
    observability::init_logging,
    services::{HttpEditingBridge, HttpStorageGateway, WopiService, storage_token},
    utils::HttpClientFactory,
    web::{AppState, WebServer},
};

#[derive(Parser)]
#[command(name = "wopi-server")]
#[command(version)]
#[command(about = "Opens storage-backed documents in WOPI office editors")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path (default: $WOPISERVER_CONFIG_FILE, then config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Path prefix for all routes
    #[arg(short, long, value_name = "PATH")]
    root: Option<String>,

    /// Log level (overrides config file)
    #[arg(short = 'v', long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::load()?,
    };

    // Override config with CLI arguments
    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }
    if let Some(root) = cli.root {
        config.web.root = root;
    }
    if let Some(level) = cli.log_level {
        config.log.level = level;
    }

    init_logging(&config.log)?;
    info!("Starting WOPI server v{}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &cli.config {
        info!("Configuration loaded from: {}", path);
    }
    info!(
        "Editing bridge at {}, storage gateway at {}, token mode {:?}",
        config.wopi.host, config.gateway.address, config.auth.mode
    );

    let factory = HttpClientFactory::new();
    let gateway = HttpStorageGateway::new(
        factory.create_gateway_client(&config.gateway)?,
        config.gateway.address.clone(),
        config.retry.clone(),
    );
    let bridge = HttpEditingBridge::new(
        factory.create_bridge_client(&config.wopi)?,
        &config.wopi,
        config.retry.clone(),
    );
    let wopi = WopiService::new(
        Arc::new(gateway),
        Arc::new(bridge),
        storage_token::from_config(&config),
        config.token_manager.token_ttl,
    );

    let state = AppState {
        config: Arc::new(config.clone()),
        wopi: Arc::new(wopi),
    };
    let server = WebServer::new(&config, state)?;
    info!("Listening on {}:{}", server.host(), server.port());

    let (ready_tx, ready_rx) = tokio::sync::oneshot::channel();
    let serve = tokio::spawn(server.serve_with_signal(ready_tx));

    match ready_rx.await {
        Ok(Ok(())) => info!("WOPI server ready"),
        Ok(Err(e)) => return Err(e),
        Err(_) => anyhow::bail!("web server exited before reporting readiness"),
    }

    serve.await??;
    info!("WOPI server stopped");
    Ok(())
}
