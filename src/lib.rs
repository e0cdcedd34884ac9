pub mod cli;
pub mod core;
pub mod engine;
pub mod http;
pub mod providers;
pub mod store;

use anyhow::{Context, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::core::config::AppConfig;
use crate::engine::Engine;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Serve,
    Show {
        currency: String,
        limit: Option<usize>,
    },
}

pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    match config_path {
        Some(path) => AppConfig::load_from_path(path),
        None => AppConfig::load(),
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Crypto Tracker starting...");

    let config = load_config(config_path)?;
    debug!(
        currencies = ?config.currencies,
        cache = ?config.cache,
        refresh = ?config.refresh,
        "Loaded config"
    );

    match command {
        AppCommand::Serve => serve(config, shutdown_signal()).await,
        AppCommand::Show { currency, limit } => show(&config, &currency, limit).await,
    }
}

/// Binds the configured address and serves until `shutdown` resolves.
pub async fn serve<F>(config: AppConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let engine = Engine::from_config(&config)?;
    let listener = TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    serve_on(listener, engine, shutdown).await
}

/// Starts the background refresher and serves HTTP on `listener`. Both stop once
/// `shutdown` resolves.
pub async fn serve_on<F>(listener: TcpListener, engine: Engine, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let cancel = CancellationToken::new();
    let refresher = Arc::clone(&engine.refresher).spawn(cancel.clone());

    info!("Listening on http://{}", listener.local_addr()?);
    let app = http::router(Arc::clone(&engine.service));

    let server_cancel = cancel.clone();
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = shutdown => {},
                _ = server_cancel.cancelled() => {},
            }
        })
        .await
        .context("HTTP server failed");

    cancel.cancel();
    refresher.await.context("Background refresher failed")?;
    info!("Server stopped");
    result
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, gracefully stopping");
}

/// One-shot read through the currency service, printed as a table.
pub async fn show(config: &AppConfig, currency: &str, limit: Option<usize>) -> Result<()> {
    let engine = Engine::from_config(config)?;
    let code = currency.trim().to_lowercase();

    if engine.service.catalog().kind(&code).is_some() && !engine.service.catalog().is_direct(&code) {
        engine.refresher.refresh_rates().await;
    }

    let snapshot = engine
        .service
        .get_currency_data(&code)
        .await
        .with_context(|| format!("Failed to get market data for {code}"))?;

    println!("{}", cli::show::render_snapshot(&code, &snapshot, limit));
    Ok(())
}
