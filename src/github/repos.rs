use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Method;
use serde::Serialize;

use super::GitHubClient;
use crate::errors::SiteError;
use crate::site::models::Repository;

#[derive(Serialize)]
struct CreateRepoRequest<'a> {
    name: &'a str,
    description: &'a str,
    auto_init: bool,
    private: bool,
}

#[derive(Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
}

impl GitHubClient {
    /// `POST /orgs/{org}/repos`, public and auto-initialised so the contents
    /// API has a branch to commit to.
    pub(super) async fn create_org_repo(
        &self,
        name: &str,
        description: &str,
    ) -> Result<Repository, SiteError> {
        let body = CreateRepoRequest {
            name,
            description,
            auto_init: true,
            private: false,
        };
        let req = self
            .request(Method::POST, &format!("orgs/{}/repos", self.org))
            .json(&body);
        self.send_json(req).await
    }

    /// `PUT /repos/{org}/{repo}/contents/{path}`. Creates the file; updating an
    /// existing file would need its blob sha, which new repositories never have.
    pub(super) async fn put_contents(
        &self,
        repo: &str,
        path: &str,
        content: &[u8],
        message: &str,
    ) -> Result<(), SiteError> {
        let body = PutContentsRequest {
            message,
            content: STANDARD.encode(content),
            branch: &self.branch,
        };
        let req = self
            .request(Method::PUT, &self.repo_path(repo, &format!("contents/{}", path)))
            .json(&body);
        self.send_empty(req).await
    }

    /// First page of `GET /orgs/{org}/repos`, most recently updated first.
    pub(super) async fn list_org_repos(&self) -> Result<Vec<Repository>, SiteError> {
        let req = self
            .request(Method::GET, &format!("orgs/{}/repos", self.org))
            .query(&[("type", "all"), ("sort", "updated")]);
        self.send_json(req).await
    }

    pub(super) async fn get_repo(&self, repo: &str) -> Result<Repository, SiteError> {
        let req = self.request(Method::GET, &format!("repos/{}/{}", self.org, repo));
        self.send_json(req).await
    }
}
