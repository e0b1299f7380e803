use async_trait::async_trait;
use secrecy::SecretString;

use super::models::{HostedSite, Repository, WorkflowInputs, WorkflowRun};
use crate::errors::SiteError;

/// Abstraction over the source-control host for testability.
/// Real implementation: `GitHubClient`. Test doubles live in the workflow tests.
#[async_trait]
pub trait SourceControl: Send + Sync {
    /// Create a new auto-initialised repository in the organization.
    async fn create_repository(&self, name: &str, description: &str)
    -> Result<Repository, SiteError>;

    /// Commit a single file to the default branch.
    async fn put_file(
        &self,
        repo: &str,
        path: &str,
        content: &[u8],
        message: &str,
    ) -> Result<(), SiteError>;

    /// Encrypt `value` for the repository and store it as an Actions secret.
    async fn set_secret(
        &self,
        repo: &str,
        name: &str,
        value: &SecretString,
    ) -> Result<(), SiteError>;

    /// Trigger the AI edit workflow once. No retries at this level.
    async fn dispatch_workflow(&self, repo: &str, inputs: &WorkflowInputs)
    -> Result<(), SiteError>;

    /// The most recent workflow run, if any exists.
    async fn latest_run(&self, repo: &str) -> Result<Option<WorkflowRun>, SiteError>;

    /// Every repository in the organization (upstream default page only).
    async fn list_repositories(&self) -> Result<Vec<Repository>, SiteError>;

    async fn get_repository(&self, repo: &str) -> Result<Repository, SiteError>;
}

/// Abstraction over the static hosting provider.
/// Real implementation: `NetlifyClient`.
#[async_trait]
pub trait HostProvider: Send + Sync {
    /// Create a site that deploys `slug`'s repository on every push.
    async fn link_site(&self, slug: &str) -> Result<HostedSite, SiteError>;

    /// Look up the site serving `slug`; `Ok(None)` when it does not exist.
    async fn find_site(&self, slug: &str) -> Result<Option<HostedSite>, SiteError>;
}
