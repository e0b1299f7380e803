//! Site commands (`siteforge sites`), a thin client of a running dashboard.

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use siteforge::client::DashboardClient;
use siteforge::site::{RunState, WorkflowStatus};
use siteforge::watch::{self, REFRESH_GRACE, WatchEvent};

use super::super::{SitesArgs, SitesCommands};

pub async fn cmd_sites(args: &SitesArgs) -> Result<()> {
    let client = DashboardClient::new(&args.server, &args.user)?;

    match &args.command {
        SitesCommands::List => list(&client).await,
        SitesCommands::Create {
            name,
            description,
            open,
        } => create(&client, name, description.as_deref(), *open).await,
        SitesCommands::Show { id } => show(&client, id).await,
        SitesCommands::Edit { id, prompt, watch } => {
            let accepted = client.trigger_edit(id, prompt).await?;
            println!("{} {}", style("✓").green(), accepted.message);
            if *watch {
                follow(client, id, true).await?;
            }
            Ok(())
        }
        SitesCommands::Status { id } => {
            let status = client.workflow_status(id).await?;
            println!("{}", describe_status(&status));
            if let Some(url) = &status.html_url {
                println!("  {}", style(url).dim());
            }
            Ok(())
        }
        SitesCommands::Watch { id, once } => follow(client, id, *once).await,
    }
}

async fn list(client: &DashboardClient) -> Result<()> {
    let sites = client.list_sites().await?;
    if sites.is_empty() {
        println!();
        println!("No sites yet. Run 'siteforge sites create <name>' to make one.");
        println!();
        return Ok(());
    }

    println!();
    println!("{:<28} {:<24} URL", "ID", "Name");
    println!("{:<28} {:<24} ---", "----------------------------", "------------------------");
    for site in &sites {
        println!("{:<28} {:<24} {}", site.id, site.name, site.url);
    }
    println!();
    Ok(())
}

async fn create(
    client: &DashboardClient,
    name: &str,
    description: Option<&str>,
    open: bool,
) -> Result<()> {
    let spinner = spinner(format!("Creating {}...", style(name).cyan()));
    let result = client.create_site(name, description).await;
    spinner.finish_and_clear();
    let created = result?;

    println!();
    println!("{} Created {}", style("✓").green(), style(&created.name).bold());
    println!("  id:      {}", created.id);
    println!("  url:     {}", created.url);
    println!("  github:  {}", created.github_url);
    if let Some(admin) = &created.admin_url {
        println!("  netlify: {}", admin);
    }
    if description.is_some_and(|d| !d.trim().is_empty()) {
        println!();
        println!(
            "Initial build started. Follow it with 'siteforge sites watch {}'.",
            created.id
        );
    }
    println!();

    if open {
        if let Err(e) = open::that(&created.url) {
            eprintln!("Failed to open browser: {}", e);
        }
    }
    Ok(())
}

async fn show(client: &DashboardClient, id: &str) -> Result<()> {
    let detail = client.site_detail(id).await?;
    println!();
    println!("{}", style(&detail.name).bold());
    println!("  id:      {}", detail.id);
    println!("  url:     {}", detail.url);
    println!("  github:  {}", detail.github_url);
    if let Some(admin) = &detail.admin_url {
        println!("  netlify: {}", admin);
    }
    if let Some(state) = &detail.deploy_state {
        println!("  deploy:  {}", state);
    }
    if let Some(created) = detail.created_at {
        println!("  created: {}", created.format("%Y-%m-%d %H:%M UTC"));
    }
    println!();
    Ok(())
}

/// Poll the site's edit jobs, printing transitions, until Ctrl+C or (with
/// `once`) the first job finishes.
async fn follow(client: DashboardClient, id: &str, once: bool) -> Result<()> {
    let detail = client
        .site_detail(id)
        .await
        .with_context(|| format!("Cannot watch site {}", id))?;

    let (tx, mut rx) = mpsc::channel(16);
    let _handle = watch::spawn_watch(Arc::new(client), id.to_string(), tx);
    let spinner = spinner(format!("Watching {}...", style(id).cyan()));

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let outcome = loop {
        let event = tokio::select! {
            event = rx.recv() => event,
            _ = &mut ctrl_c => break Ok(()),
        };
        let Some(event) = event else {
            break Ok(());
        };

        match event {
            WatchEvent::Polled(status) => spinner.set_message(describe_status(&status)),
            WatchEvent::Started { html_url } => {
                spinner.println(format!("{} Edit started", style("▶").cyan()));
                if let Some(url) = html_url {
                    spinner.println(format!("  {}", style(url).dim()));
                }
            }
            WatchEvent::Completed { .. } => {
                spinner.println(format!(
                    "{} Edit finished, waiting {}s for the deploy",
                    style("✓").green(),
                    REFRESH_GRACE.as_secs()
                ));
            }
            WatchEvent::RefreshPreview => {
                spinner.println(format!("{} Live at {}", style("●").green(), detail.url));
                if once {
                    break Ok(());
                }
            }
            WatchEvent::Failed {
                conclusion,
                html_url,
            } => {
                let conclusion = conclusion.unwrap_or_else(|| "unknown".to_string());
                spinner.println(format!(
                    "{} Edit failed ({})",
                    style("✗").red(),
                    conclusion
                ));
                if let Some(url) = html_url {
                    spinner.println(format!("  {}", style(url).dim()));
                }
                if once {
                    break Err(anyhow::anyhow!("Edit job for {} failed: {}", id, conclusion));
                }
            }
            WatchEvent::PollFailed { message } => {
                spinner.set_message(format!("{}", style(message).yellow()));
            }
        }
    };

    spinner.finish_and_clear();
    outcome
}

fn spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg}")
            .expect("progress bar template is a valid static string"),
    );
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// One-line summary of a job status.
fn describe_status(status: &WorkflowStatus) -> String {
    match status.state {
        RunState::None => "No edits yet".to_string(),
        RunState::Working => format!("Working ({})", status.status.replace('_', " ")),
        RunState::Done => "Last edit succeeded".to_string(),
        RunState::Failed => format!(
            "Last edit failed ({})",
            status.conclusion.as_deref().unwrap_or("unknown")
        ),
    }
}
