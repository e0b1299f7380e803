//! Configuration view and validation commands (`siteforge config`).

use anyhow::Result;
use secrecy::SecretString;
use std::path::{Path, PathBuf};

use siteforge::config::{
    CONFIG_FILE_NAME, ENV_ANTHROPIC_API_KEY, ENV_GITHUB_TOKEN, ENV_NETLIFY_TOKEN,
    SiteforgeConfig, SiteforgeToml,
};

use super::super::ConfigCommands;

pub fn cmd_config(config_path: Option<&Path>, command: Option<ConfigCommands>) -> Result<()> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));

    match command {
        None | Some(ConfigCommands::Show) => show(&path),
        Some(ConfigCommands::Validate) => validate(&path),
        Some(ConfigCommands::Init) => init(&path),
    }
}

fn show(path: &Path) -> Result<()> {
    let config = SiteforgeConfig::load(Some(path))?;
    let toml = &config.toml;

    println!();
    println!("SiteForge Configuration");
    println!("=======================");
    println!();
    match &config.source {
        Some(source) => println!("Config file: {}", source.display()),
        None => println!("No {} found, using defaults", path.display()),
    }
    println!();

    println!("[github]");
    println!("  org = {}", display_opt(toml.github.org.as_deref()));
    println!("  api_url = \"{}\"", toml.github.api_url);
    println!("  workflow = \"{}\"", toml.github.workflow);
    println!("  branch = \"{}\"", toml.github.branch);
    println!();

    println!("[netlify]");
    println!(
        "  account_slug = {}",
        display_opt(toml.netlify.account_slug.as_deref())
    );
    println!(
        "  installation_id = {}",
        toml.netlify
            .installation_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "(unset)".to_string())
    );
    println!("  api_url = \"{}\"", toml.netlify.api_url);
    println!();

    println!("[agent]");
    println!("  default_model = \"{}\"", toml.agent.default_model);
    println!("  build_model = \"{}\"", toml.agent.build_model);
    println!("  secret_name = \"{}\"", toml.agent.secret_name);
    println!();

    println!("[timing]");
    println!("  repo_init_delay_ms = {}", toml.timing.repo_init_delay_ms);
    println!("  dispatch_attempts = {}", toml.timing.dispatch_attempts);
    println!(
        "  dispatch_base_delay_ms = {}",
        toml.timing.dispatch_base_delay_ms
    );
    println!();

    println!("[server]");
    println!("  port = {}", toml.server.port);
    println!();

    // Credentials only ever come from the environment; never print values
    println!("Credentials (environment):");
    for (name, value) in [
        (ENV_GITHUB_TOKEN, &config.credentials.github_token),
        (ENV_NETLIFY_TOKEN, &config.credentials.netlify_token),
        (ENV_ANTHROPIC_API_KEY, &config.credentials.anthropic_api_key),
    ] {
        println!("  {} = {}", name, credential_state(value));
    }
    println!();
    Ok(())
}

fn validate(path: &Path) -> Result<()> {
    println!();
    println!("Validating configuration...");
    println!();

    let config = SiteforgeConfig::load(Some(path))?;
    let problems = config.validate();

    if problems.is_empty() {
        println!("Configuration is valid.");
        println!();
        return Ok(());
    }

    println!("Configuration problems:");
    for problem in &problems {
        println!("  - {}", problem);
    }
    println!();
    anyhow::bail!("Configuration has {} problem(s)", problems.len())
}

fn init(path: &Path) -> Result<()> {
    if path.exists() {
        println!("{} already exists at {}", CONFIG_FILE_NAME, path.display());
        println!("Delete it first if you want to recreate it.");
        return Ok(());
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    SiteforgeToml::default().save(path)?;

    println!("Created {} at {}", CONFIG_FILE_NAME, path.display());
    println!();
    println!("You can now customize:");
    println!("  - [github] org, workflow, branch");
    println!("  - [netlify] account_slug, installation_id");
    println!("  - [agent] default_model, build_model");
    println!();
    println!(
        "Credentials are read from the environment only: {}, {}, {}",
        ENV_GITHUB_TOKEN, ENV_NETLIFY_TOKEN, ENV_ANTHROPIC_API_KEY
    );
    println!();
    Ok(())
}

fn display_opt(value: Option<&str>) -> String {
    value
        .map(|v| format!("\"{}\"", v))
        .unwrap_or_else(|| "(unset)".to_string())
}

fn credential_state(value: &Option<SecretString>) -> &'static str {
    if value.is_some() { "set" } else { "(unset)" }
}
