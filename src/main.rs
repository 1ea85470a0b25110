use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::settings::AppConfig;
use crate::infrastructure::ffmpeg::FfmpegEngine;
use crate::infrastructure::http::client::HttpFetcher;
use crate::state::AppState;

mod app;
mod common;
mod config;
mod docs;
mod infrastructure;
mod media;
mod modules;
mod routes;
mod state;
mod workers;

#[cfg(test)]
mod test_support;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting render server...");

    let config = AppConfig::new();
    config
        .ensure_dirs()
        .await
        .with_context(|| format!("creating output directories under {}", config.output_dir.display()))?;

    let http = HttpFetcher::new(config.fetch_timeout()).context("building HTTP client")?;
    let engine = Arc::new(FfmpegEngine::new(&config.ffmpeg_path, &config.ffprobe_path));
    let state = AppState::new(config, engine, http);

    tokio::spawn(workers::sweeper::start_sweeper(state.clone()));

    let addr = format!("0.0.0.0:{}", state.config.server_port);
    let app = app::create_app(state).await;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Server running on http://{}", addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
