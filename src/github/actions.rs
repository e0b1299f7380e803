use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::GitHubClient;
use crate::errors::SiteError;
use crate::site::models::{WorkflowInputs, WorkflowRun};

#[derive(Serialize)]
struct DispatchRequest<'a> {
    #[serde(rename = "ref")]
    git_ref: &'a str,
    inputs: &'a WorkflowInputs,
}

#[derive(Deserialize)]
struct WorkflowRunsPage {
    #[serde(default)]
    workflow_runs: Vec<WorkflowRun>,
}

impl GitHubClient {
    /// `POST .../actions/workflows/{workflow}/dispatches`. GitHub answers 204
    /// without a run id, so there is nothing to return.
    pub(super) async fn create_workflow_dispatch(
        &self,
        repo: &str,
        inputs: &WorkflowInputs,
    ) -> Result<(), SiteError> {
        let body = DispatchRequest {
            git_ref: &self.branch,
            inputs,
        };
        let req = self
            .request(
                Method::POST,
                &self.repo_path(repo, &format!("actions/workflows/{}/dispatches", self.workflow)),
            )
            .json(&body);
        self.send_empty(req).await
    }

    pub(super) async fn latest_workflow_run(
        &self,
        repo: &str,
    ) -> Result<Option<WorkflowRun>, SiteError> {
        let req = self
            .request(Method::GET, &self.repo_path(repo, "actions/runs"))
            .query(&[("per_page", "1")]);
        let page: WorkflowRunsPage = self.send_json(req).await?;
        Ok(page.workflow_runs.into_iter().next())
    }
}
