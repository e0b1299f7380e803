//! GitHub REST client for the site organization.
//!
//! | Module    | Endpoints                                                  |
//! |-----------|------------------------------------------------------------|
//! | `repos`   | create in org, contents PUT, list org repos, get repo      |
//! | `secrets` | Actions public key, sealed-box encryption, secret PUT      |
//! | `actions` | `workflow_dispatch`, latest workflow run                   |
//!
//! Every request carries the bearer token, the v3 JSON media type and a
//! pinned API version. Non-2xx responses become [`SiteError::GitHub`] with
//! the upstream message verbatim.

mod actions;
mod repos;
mod secrets;

pub use secrets::seal_secret;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use crate::config::{ENV_GITHUB_ORG, ENV_GITHUB_TOKEN, SiteforgeConfig};
use crate::errors::SiteError;
use crate::http;
use crate::site::models::{Repository, WorkflowInputs, WorkflowRun};
use crate::site::provider::SourceControl;

const ACCEPT: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";

pub struct GitHubClient {
    http: reqwest::Client,
    base_url: String,
    org: String,
    token: SecretString,
    workflow: String,
    branch: String,
}

impl GitHubClient {
    /// Client for `org` with the default `ai-edit.yml` workflow on `main`.
    pub fn new(base_url: &str, org: &str, token: SecretString) -> Result<Self, SiteError> {
        let http = http::build_client().map_err(|source| SiteError::Transport {
            service: "GitHub",
            source,
        })?;
        Ok(Self {
            http,
            base_url: base_url.to_string(),
            org: org.to_string(),
            token,
            workflow: "ai-edit.yml".to_string(),
            branch: "main".to_string(),
        })
    }

    pub fn from_config(config: &SiteforgeConfig) -> anyhow::Result<Self> {
        let github = &config.toml.github;
        let org = github
            .org
            .as_deref()
            .with_context(|| format!("{} is not set", ENV_GITHUB_ORG))?;
        let token = config
            .credentials
            .github_token
            .clone()
            .with_context(|| format!("{} is not set", ENV_GITHUB_TOKEN))?;

        Ok(Self::new(&github.api_url, org, token)?.with_workflow(&github.workflow, &github.branch))
    }

    pub fn with_workflow(mut self, workflow: &str, branch: &str) -> Self {
        self.workflow = workflow.to_string();
        self.branch = branch.to_string();
        self
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    // ── Request plumbing ─────────────────────────────────────────────

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = http::join_url(&self.base_url, path);
        tracing::debug!(%method, %url, "GitHub request");
        self.http
            .request(method, url)
            .bearer_auth(self.token.expose_secret())
            .header(reqwest::header::ACCEPT, ACCEPT)
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    fn repo_path(&self, repo: &str, rest: &str) -> String {
        format!("repos/{}/{}/{}", self.org, repo, rest.trim_start_matches('/'))
    }

    async fn send(&self, req: RequestBuilder) -> Result<reqwest::Response, SiteError> {
        let resp = req.send().await.map_err(transport)?;
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let (status, message) = http::error_parts(resp).await;
            Err(SiteError::GitHub { status, message })
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, SiteError> {
        self.send(req).await?.json::<T>().await.map_err(transport)
    }

    async fn send_empty(&self, req: RequestBuilder) -> Result<(), SiteError> {
        self.send(req).await.map(|_| ())
    }
}

fn transport(source: reqwest::Error) -> SiteError {
    SiteError::Transport {
        service: "GitHub",
        source,
    }
}

#[async_trait]
impl SourceControl for GitHubClient {
    async fn create_repository(
        &self,
        name: &str,
        description: &str,
    ) -> Result<Repository, SiteError> {
        self.create_org_repo(name, description).await
    }

    async fn put_file(
        &self,
        repo: &str,
        path: &str,
        content: &[u8],
        message: &str,
    ) -> Result<(), SiteError> {
        self.put_contents(repo, path, content, message).await
    }

    async fn set_secret(
        &self,
        repo: &str,
        name: &str,
        value: &SecretString,
    ) -> Result<(), SiteError> {
        self.put_actions_secret(repo, name, value).await
    }

    async fn dispatch_workflow(
        &self,
        repo: &str,
        inputs: &WorkflowInputs,
    ) -> Result<(), SiteError> {
        self.create_workflow_dispatch(repo, inputs).await
    }

    async fn latest_run(&self, repo: &str) -> Result<Option<WorkflowRun>, SiteError> {
        self.latest_workflow_run(repo).await
    }

    async fn list_repositories(&self) -> Result<Vec<Repository>, SiteError> {
        self.list_org_repos().await
    }

    async fn get_repository(&self, repo: &str) -> Result<Repository, SiteError> {
        self.get_repo(repo).await
    }
}
