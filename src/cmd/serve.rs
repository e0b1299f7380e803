//! Dashboard server command (`siteforge serve`).

use anyhow::Result;
use std::path::Path;

use siteforge::config::SiteforgeConfig;
use siteforge::dashboard::server::{self, ServerConfig};

pub async fn cmd_serve(config_path: Option<&Path>, port: Option<u16>, dev: bool) -> Result<()> {
    let config = SiteforgeConfig::load(config_path)?;
    if let Some(path) = &config.source {
        tracing::info!(path = %path.display(), "Loaded configuration");
    }
    let sites = server::build_service(&config)?;

    server::start_server(
        ServerConfig {
            port: port.unwrap_or(config.toml.server.port),
            dev_mode: dev,
        },
        sites,
    )
    .await
}
