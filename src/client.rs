//! Typed HTTP client for a running dashboard, used by the `sites` commands.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::dashboard::USER_HEADER;
use crate::dashboard::api::{CreateSiteRequest, EditAccepted, EditRequest};
use crate::errors::ClientError;
use crate::http;
use crate::site::models::{CreatedSite, SiteDetail, SiteSummary, WorkflowStatus};
use crate::watch::StatusSource;

pub struct DashboardClient {
    http: reqwest::Client,
    base_url: String,
    user: String,
}

impl DashboardClient {
    pub fn new(base_url: &str, user: &str) -> Result<Self, ClientError> {
        let http = http::build_client().map_err(|source| ClientError::Transport {
            url: base_url.to_string(),
            source,
        })?;
        Ok(Self {
            http,
            base_url: base_url.to_string(),
            user: user.to_string(),
        })
    }

    async fn send<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<T, ClientError> {
        let transport = |source| ClientError::Transport {
            url: url.to_string(),
            source,
        };
        let resp = req
            .header(USER_HEADER, &self.user)
            .send()
            .await
            .map_err(transport)?;
        if !resp.status().is_success() {
            let (status, message) = http::error_parts(resp).await;
            return Err(ClientError::Api { status, message });
        }
        resp.json::<T>().await.map_err(transport)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ClientError> {
        let url = http::join_url(&self.base_url, path);
        self.send(self.http.get(&url).query(query), &url).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let url = http::join_url(&self.base_url, path);
        self.send(self.http.post(&url).json(body), &url).await
    }

    pub async fn list_sites(&self) -> Result<Vec<SiteSummary>, ClientError> {
        self.get("api/sites", &[]).await
    }

    pub async fn create_site(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<CreatedSite, ClientError> {
        let body = CreateSiteRequest {
            name: Some(name.to_string()),
            description: description.map(String::from),
        };
        self.post("api/sites", &body).await
    }

    pub async fn site_detail(&self, site_id: &str) -> Result<SiteDetail, ClientError> {
        self.get(&format!("api/sites/{}", site_id), &[]).await
    }

    pub async fn trigger_edit(
        &self,
        site_id: &str,
        prompt: &str,
    ) -> Result<EditAccepted, ClientError> {
        let body = EditRequest {
            site_id: Some(site_id.to_string()),
            prompt: Some(prompt.to_string()),
        };
        self.post("api/ai-edit", &body).await
    }

    pub async fn workflow_status(&self, site_id: &str) -> Result<WorkflowStatus, ClientError> {
        self.get("api/workflow-status", &[("repo", site_id)]).await
    }
}

#[async_trait]
impl StatusSource for DashboardClient {
    async fn fetch_status(&self, site_id: &str) -> Result<WorkflowStatus, ClientError> {
        self.workflow_status(site_id).await
    }
}
