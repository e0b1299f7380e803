//! Netlify REST client: deploy keys and repository-linked sites.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::{
    ENV_GITHUB_ORG, ENV_NETLIFY_ACCOUNT, ENV_NETLIFY_INSTALLATION_ID, ENV_NETLIFY_TOKEN,
    SiteforgeConfig,
};
use crate::errors::SiteError;
use crate::http;
use crate::site::models::{HostedSite, default_site_url};
use crate::site::provider::HostProvider;

#[derive(Debug, Deserialize)]
struct DeployKey {
    id: String,
}

#[derive(Serialize)]
struct RepoLink<'a> {
    provider: &'a str,
    repo: String,
    branch: &'a str,
    /// Empty: the repository root is published as-is
    cmd: &'a str,
    dir: &'a str,
    installation_id: u64,
    deploy_key_id: &'a str,
}

#[derive(Serialize)]
struct CreateSiteRequest<'a> {
    name: &'a str,
    repo: RepoLink<'a>,
}

#[derive(Debug, Deserialize)]
struct PublishedDeploy {
    #[serde(default)]
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SiteResponse {
    id: String,
    name: String,
    #[serde(default)]
    ssl_url: Option<String>,
    #[serde(default)]
    admin_url: Option<String>,
    #[serde(default)]
    published_deploy: Option<PublishedDeploy>,
}

impl From<SiteResponse> for HostedSite {
    fn from(site: SiteResponse) -> Self {
        let url = site
            .ssl_url
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| default_site_url(&site.name));
        HostedSite {
            id: site.id,
            url,
            name: site.name,
            admin_url: site.admin_url,
            deploy_state: site.published_deploy.and_then(|d| d.state),
        }
    }
}

/// Where new sites pull their code from.
#[derive(Debug, Clone)]
pub struct RepoSource {
    pub org: String,
    pub branch: String,
    /// Netlify's GitHub App installation on `org`
    pub installation_id: u64,
}

pub struct NetlifyClient {
    http: reqwest::Client,
    base_url: String,
    token: SecretString,
    account_slug: String,
    source: RepoSource,
}

impl NetlifyClient {
    pub fn new(
        base_url: &str,
        token: SecretString,
        account_slug: &str,
        source: RepoSource,
    ) -> Result<Self, SiteError> {
        let http = http::build_client().map_err(transport)?;
        Ok(Self {
            http,
            base_url: base_url.to_string(),
            token,
            account_slug: account_slug.to_string(),
            source,
        })
    }

    pub fn from_config(config: &SiteforgeConfig) -> anyhow::Result<Self> {
        let netlify = &config.toml.netlify;
        let token = config
            .credentials
            .netlify_token
            .clone()
            .with_context(|| format!("{} is not set", ENV_NETLIFY_TOKEN))?;
        let account = netlify
            .account_slug
            .as_deref()
            .with_context(|| format!("{} is not set", ENV_NETLIFY_ACCOUNT))?;
        let installation_id = netlify
            .installation_id
            .with_context(|| format!("{} is not set", ENV_NETLIFY_INSTALLATION_ID))?;
        let org = config
            .toml
            .github
            .org
            .clone()
            .with_context(|| format!("{} is not set", ENV_GITHUB_ORG))?;

        let source = RepoSource {
            org,
            branch: config.toml.github.branch.clone(),
            installation_id,
        };
        Ok(Self::new(&netlify.api_url, token, account, source)?)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = http::join_url(&self.base_url, path);
        tracing::debug!(%method, %url, "Netlify request");
        self.http
            .request(method, url)
            .bearer_auth(self.token.expose_secret())
    }

    async fn send(&self, req: RequestBuilder) -> Result<reqwest::Response, SiteError> {
        let resp = req.send().await.map_err(transport)?;
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let (status, message) = http::error_parts(resp).await;
            Err(SiteError::Netlify { status, message })
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, SiteError> {
        self.send(req).await?.json::<T>().await.map_err(transport)
    }

    async fn create_deploy_key(&self) -> Result<DeployKey, SiteError> {
        self.send_json(self.request(Method::POST, "deploy_keys")).await
    }
}

fn transport(source: reqwest::Error) -> SiteError {
    SiteError::Transport {
        service: "Netlify",
        source,
    }
}

#[async_trait]
impl HostProvider for NetlifyClient {
    async fn link_site(&self, slug: &str) -> Result<HostedSite, SiteError> {
        let key = self.create_deploy_key().await?;
        tracing::debug!(slug, deploy_key = %key.id, "Created deploy key");

        let body = CreateSiteRequest {
            name: slug,
            repo: RepoLink {
                provider: "github",
                repo: format!("{}/{}", self.source.org, slug),
                branch: &self.source.branch,
                cmd: "",
                dir: ".",
                installation_id: self.source.installation_id,
                deploy_key_id: &key.id,
            },
        };
        let req = self
            .request(Method::POST, &format!("{}/sites", self.account_slug))
            .json(&body);
        let site: SiteResponse = self.send_json(req).await?;
        Ok(site.into())
    }

    async fn find_site(&self, slug: &str) -> Result<Option<HostedSite>, SiteError> {
        let req = self.request(Method::GET, &format!("sites/{}.netlify.app", slug));
        let resp = req.send().await.map_err(transport)?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            let (status, message) = http::error_parts(resp).await;
            return Err(SiteError::Netlify { status, message });
        }
        let site: SiteResponse = resp.json().await.map_err(transport)?;
        Ok(Some(site.into()))
    }
}
