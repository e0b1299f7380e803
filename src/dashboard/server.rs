use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::api::{self, AppState};
use crate::config::SiteforgeConfig;
use crate::github::GitHubClient;
use crate::netlify::NetlifyClient;
use crate::site::{SiteService, SiteSettings};

/// How long shutdown waits for queued background edits.
const JOB_DRAIN_TIMEOUT: Duration = Duration::from_secs(15);

/// Configuration for the dashboard server.
pub struct ServerConfig {
    pub port: u16,
    pub dev_mode: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3141,
            dev_mode: false,
        }
    }
}

/// Build the full application router with request tracing.
pub fn build_router(state: Arc<AppState>) -> Router {
    api::api_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Wire the provider clients from `config` into a [`SiteService`].
pub fn build_service(config: &SiteforgeConfig) -> Result<SiteService> {
    let problems = config.validate();
    if !problems.is_empty() {
        anyhow::bail!("Invalid configuration:\n  - {}", problems.join("\n  - "));
    }

    let github = GitHubClient::from_config(config).context("Failed to build GitHub client")?;
    let netlify = NetlifyClient::from_config(config).context("Failed to build Netlify client")?;
    let settings = SiteSettings::from_config(config)?;

    Ok(SiteService::new(Arc::new(github), Arc::new(netlify), settings))
}

/// Start the dashboard server and run until Ctrl+C, then give background
/// edits up to [`JOB_DRAIN_TIMEOUT`] to finish.
pub async fn start_server(config: ServerConfig, sites: SiteService) -> Result<()> {
    let state = Arc::new(AppState {
        sites: sites.clone(),
    });
    let mut app = build_router(state);

    if config.dev_mode {
        app = app.layer(CorsLayer::permissive());
    }

    let host = if config.dev_mode { "0.0.0.0" } else { "127.0.0.1" };
    let addr = format!("{}:{}", host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    tracing::info!(addr = %local_addr, dev_mode = config.dev_mode, "Dashboard listening");
    println!("SiteForge dashboard running at http://{}", local_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    let abandoned = sites.shutdown(JOB_DRAIN_TIMEOUT).await;
    if !abandoned.is_empty() {
        println!(
            "Abandoned {} background edit(s): {}",
            abandoned.len(),
            abandoned.join(", ")
        );
    }

    println!("Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    println!("\nShutting down...");
}
