//! Site workflow: the operations the dashboard API exposes.
//!
//! Creation is a fixed sequence of remote calls:
//!
//! ```text
//! validate name → slug → create repo (owner/display tags) → wait for init
//!   → push template files → store agent secret → link host
//!   → respond, then (description given) queue the initial build
//! ```
//!
//! Any step failing aborts the rest. Nothing already created is rolled back,
//! so a host failure leaves an orphaned repository behind.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use secrecy::SecretString;

use super::dispatch::{JobDispatcher, RetryPolicy};
use super::jobs::{BackgroundJobs, EditJob};
use super::models::{CreatedSite, SiteDetail, SiteSummary, WorkflowStatus, default_site_url};
use super::provider::{HostProvider, SourceControl};
use super::registry::SiteRegistry;
use super::status::StatusPoller;
use super::{prompts, slug, tags};
use crate::config::{ENV_ANTHROPIC_API_KEY, SiteforgeConfig};
use crate::errors::SiteError;
use crate::templates;

/// Settings the workflow needs beyond the two provider clients.
#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub repo_init_delay: Duration,
    pub secret_name: String,
    pub agent_api_key: SecretString,
    pub default_model: String,
    pub build_model: String,
    pub retry: RetryPolicy,
}

impl SiteSettings {
    pub fn from_config(config: &SiteforgeConfig) -> Result<Self> {
        let agent_api_key = config
            .credentials
            .anthropic_api_key
            .clone()
            .with_context(|| format!("{} is not set", ENV_ANTHROPIC_API_KEY))?;

        Ok(Self {
            repo_init_delay: config.repo_init_delay(),
            secret_name: config.toml.agent.secret_name.clone(),
            agent_api_key,
            default_model: config.toml.agent.default_model.clone(),
            build_model: config.toml.agent.build_model.clone(),
            retry: config.retry_policy(),
        })
    }
}

#[derive(Clone)]
pub struct SiteService {
    source: Arc<dyn SourceControl>,
    host: Arc<dyn HostProvider>,
    dispatcher: JobDispatcher,
    jobs: BackgroundJobs,
    poller: StatusPoller,
    registry: SiteRegistry,
    settings: Arc<SiteSettings>,
}

impl SiteService {
    pub fn new(
        source: Arc<dyn SourceControl>,
        host: Arc<dyn HostProvider>,
        settings: SiteSettings,
    ) -> Self {
        let dispatcher = JobDispatcher::new(
            Arc::clone(&source),
            settings.retry,
            settings.default_model.clone(),
        );
        Self {
            jobs: BackgroundJobs::new(dispatcher.clone()),
            poller: StatusPoller::new(Arc::clone(&source)),
            registry: SiteRegistry::new(Arc::clone(&source)),
            dispatcher,
            source,
            host,
            settings: Arc::new(settings),
        }
    }

    /// Provision a repository and a linked hosting site for `owner_id`.
    ///
    /// The returned future completes once the host is linked; the initial
    /// build for a non-blank `description` runs in the background.
    pub async fn create_site(
        &self,
        owner_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<CreatedSite, SiteError> {
        tags::validate_owner_id(owner_id)?;
        let slug = slug::generate_slug(name)?;
        let files = templates::site_files(name)?;

        tracing::info!(owner = owner_id, slug = %slug, "Creating site repository");
        let repo = self
            .source
            .create_repository(&slug, &tags::encode_description(owner_id, name))
            .await?;

        // Contents API calls against a brand-new repo race its initial commit
        tokio::time::sleep(self.settings.repo_init_delay).await;

        for file in &files {
            self.source
                .put_file(
                    &slug,
                    file.path,
                    file.content.as_bytes(),
                    &format!("Add {}", file.path),
                )
                .await?;
            tracing::debug!(slug = %slug, path = file.path, "Pushed template file");
        }

        self.source
            .set_secret(&slug, &self.settings.secret_name, &self.settings.agent_api_key)
            .await?;

        tracing::info!(slug = %slug, "Linking hosting site");
        let hosted = self.host.link_site(&slug).await?;

        let created = CreatedSite {
            id: slug.clone(),
            name: name.to_string(),
            url: hosted.url,
            github_url: repo.html_url,
            admin_url: hosted.admin_url,
        };

        if let Some(description) = description.map(str::trim).filter(|d| !d.is_empty()) {
            self.jobs.submit(EditJob {
                slug: slug.clone(),
                prompt: prompts::initial_build_prompt(name, description),
                model: Some(self.settings.build_model.clone()),
            });
        }

        tracing::info!(slug = %slug, url = %created.url, "Site created");
        Ok(created)
    }

    pub async fn list_sites(&self, owner_id: &str) -> Result<Vec<SiteSummary>, SiteError> {
        tags::validate_owner_id(owner_id)?;
        self.registry.list_sites(owner_id).await
    }

    /// Dispatch an edit and wait only for the dispatch itself (with retries),
    /// never for the job.
    pub async fn trigger_edit(
        &self,
        slug: &str,
        prompt: &str,
        model: Option<&str>,
    ) -> Result<(), SiteError> {
        self.dispatcher.dispatch(slug, prompt, model).await
    }

    pub async fn workflow_status(&self, slug: &str) -> WorkflowStatus {
        self.poller.status(slug).await
    }

    /// Wait up to `timeout` for queued background edits to finish. Returns
    /// the slugs of the jobs still running when the wait gave up.
    pub async fn shutdown(&self, timeout: Duration) -> Vec<String> {
        self.jobs.shutdown(timeout).await
    }

    /// Repository and hosting details, visible only to the site's owner.
    /// Unknown and foreign sites are indistinguishable to the caller.
    pub async fn site_detail(&self, owner_id: &str, slug: &str) -> Result<SiteDetail, SiteError> {
        tags::validate_owner_id(owner_id)?;
        let not_found = || SiteError::NotFound {
            slug: slug.to_string(),
        };

        let repo = match self.source.get_repository(slug).await {
            Ok(repo) => repo,
            Err(SiteError::GitHub { status: 404, .. }) => return Err(not_found()),
            Err(e) => return Err(e),
        };
        if !tags::is_owned_by(repo.description.as_deref(), owner_id) {
            return Err(not_found());
        }

        let hosted = match self.host.find_site(slug).await {
            Ok(hosted) => hosted,
            Err(e) => {
                tracing::warn!(slug, error = %e, "Hosting lookup failed");
                None
            }
        };

        let name = tags::parse_display_name(repo.description.as_deref())
            .unwrap_or_else(|| repo.name.clone());
        Ok(SiteDetail {
            id: repo.name.clone(),
            name,
            owner: owner_id.to_string(),
            url: hosted
                .as_ref()
                .map(|h| h.url.clone())
                .unwrap_or_else(|| default_site_url(&repo.name)),
            github_url: repo.html_url,
            created_at: repo.created_at,
            admin_url: hosted.as_ref().and_then(|h| h.admin_url.clone()),
            deploy_state: hosted.and_then(|h| h.deploy_state),
        })
    }
}
