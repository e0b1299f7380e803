//! Site Registry: derives a user's sites from repository descriptions.
//!
//! A full scan of the organization on every call followed by an owner-tag
//! filter. There is no index or cache; fine for a few hundred repositories.

use std::sync::Arc;

use super::models::{Repository, SiteSummary, default_site_url};
use super::provider::SourceControl;
use super::tags;
use crate::errors::SiteError;

#[derive(Clone)]
pub struct SiteRegistry {
    source: Arc<dyn SourceControl>,
}

impl SiteRegistry {
    pub fn new(source: Arc<dyn SourceControl>) -> Self {
        Self { source }
    }

    /// Every repository tagged with `[owner:<owner_id>]`, in upstream order.
    pub async fn owned_repositories(&self, owner_id: &str) -> Result<Vec<Repository>, SiteError> {
        let repos = self.source.list_repositories().await?;
        let total = repos.len();
        let owned: Vec<Repository> = repos
            .into_iter()
            .filter(|r| tags::is_owned_by(r.description.as_deref(), owner_id))
            .collect();
        tracing::debug!(owner = owner_id, total, owned = owned.len(), "Scanned repositories");
        Ok(owned)
    }

    /// Listing entries for the owner's sites.
    pub async fn list_sites(&self, owner_id: &str) -> Result<Vec<SiteSummary>, SiteError> {
        let repos = self.owned_repositories(owner_id).await?;
        Ok(repos.into_iter().map(summarize).collect())
    }
}

/// Listing entry for one repository. The display name falls back to the slug
/// when the description lost its `[display:...]` tag.
pub fn summarize(repo: Repository) -> SiteSummary {
    let name = tags::parse_display_name(repo.description.as_deref())
        .unwrap_or_else(|| repo.name.clone());
    SiteSummary {
        url: default_site_url(&repo.name),
        id: repo.name,
        name,
        github_url: repo.html_url,
        created_at: repo.created_at,
    }
}
