use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

mod app;
mod config;
mod error;

use config::{DEFAULT_CONFIG_PATH, ServerConfig, init_tracing, resolve_port};

/// HTTP service that sanitizes HTML documents into JSON document records
#[derive(Parser, Debug)]
#[command(name = "docsan-server")]
#[command(version)]
struct Args {
    /// JSON configuration file
    #[arg(value_name = "CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Port to listen on when PORT is not set
    #[arg(value_name = "PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = ServerConfig::load(&args.config)?;
    init_tracing(&config.logging)?;

    let port = resolve_port(std::env::var("PORT").ok().as_deref(), args.port)?;
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = app::router(&config);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, meta_tags = config.meta_tags.len(), "docsan listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("docsan stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
