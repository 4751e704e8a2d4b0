//! recruit-reel daemon: REST API for submitting video jobs and polling their status.

use reel_core::{providers, JobStore, ReelConfig};
use reel_daemon::{build_app, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config_path = std::env::var("REEL_CONFIG").ok().map(PathBuf::from);
    let config = ReelConfig::load(config_path.as_deref())?;

    for (provider, variable, set) in config.credential_report() {
        if !set {
            tracing::warn!(provider, variable, "credential not configured; jobs will fail at this stage");
        }
    }

    let clients = providers::stage_clients(&config)?;
    let jobs = Arc::new(JobStore::from_config(&config.store));
    let app = build_app(AppState::new(jobs, clients));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "recruit-reel daemon listening");
    axum::serve(listener, app).await?;
    Ok(())
}
