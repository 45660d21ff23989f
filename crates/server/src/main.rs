//! sheetview server entry point.
//!
//! Loads configuration, wires the Sheets client, cache and freshness policy
//! into the router, and serves HTTP until Ctrl-C.
//! Logging goes to stderr as JSON.

use std::sync::Arc;

use anyhow::Result;
use sheetview_client::{GoogleSheetsClient, SheetsConfig};
use sheetview_core::{AppConfig, SystemClock};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod render;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let sheets = GoogleSheetsClient::new(SheetsConfig::from_app_config(&config)?)?;
    let state = handler::AppState::new(&config, Arc::new(sheets), Arc::new(SystemClock))?;
    let app = handler::router(Arc::new(state), &config.static_dir);

    let listener = TcpListener::bind(config.bind_addr.as_str()).await?;
    tracing::info!(addr = %config.bind_addr, sheet = %config.sheet_name, "Starting sheetview server");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("sheetview server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
