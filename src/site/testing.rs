//! In-memory provider doubles shared by the workflow tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Notify;
use tokio::time::Instant;

use super::models::{HostedSite, Repository, WorkflowInputs, WorkflowRun, default_site_url};
use super::provider::{HostProvider, SourceControl};
use crate::errors::SiteError;

/// Records every call in order and serves canned repositories and runs.
#[derive(Default)]
pub struct MockSourceControl {
    calls: Mutex<Vec<String>>,
    repos: Mutex<Vec<Repository>>,
    files: Mutex<Vec<(String, String, Vec<u8>)>>,
    secrets: Mutex<Vec<(String, String, String)>>,
    dispatched: Mutex<Vec<(String, WorkflowInputs)>>,
    attempt_times: Mutex<Vec<Instant>>,
    failing_dispatches: AtomicU32,
    fail_create: Mutex<Option<SiteError>>,
    fail_list: AtomicBool,
    latest_run: Mutex<Option<WorkflowRun>>,
    fail_latest_run: AtomicBool,
    pub dispatch_notify: Notify,
}

impl MockSourceControl {
    pub fn with_repos(repos: Vec<Repository>) -> Self {
        let mock = Self::default();
        *mock.repos.lock().unwrap() = repos;
        mock
    }

    pub fn fail_next_dispatches(&self, count: u32) {
        self.failing_dispatches.store(count, Ordering::SeqCst);
    }

    pub fn fail_create_with(&self, err: SiteError) {
        *self.fail_create.lock().unwrap() = Some(err);
    }

    pub fn fail_listing(&self) {
        self.fail_list.store(true, Ordering::SeqCst);
    }

    pub fn set_latest_run(&self, run: Option<WorkflowRun>) {
        *self.latest_run.lock().unwrap() = run;
    }

    pub fn fail_latest_run(&self) {
        self.fail_latest_run.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn files(&self) -> Vec<(String, String, Vec<u8>)> {
        self.files.lock().unwrap().clone()
    }

    pub fn secrets(&self) -> Vec<(String, String, String)> {
        self.secrets.lock().unwrap().clone()
    }

    pub fn dispatched(&self) -> Vec<(String, WorkflowInputs)> {
        self.dispatched.lock().unwrap().clone()
    }

    pub fn dispatch_attempt_count(&self) -> usize {
        self.attempt_times.lock().unwrap().len()
    }

    pub fn dispatch_attempt_times(&self) -> Vec<Instant> {
        self.attempt_times.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl SourceControl for MockSourceControl {
    async fn create_repository(
        &self,
        name: &str,
        description: &str,
    ) -> Result<Repository, SiteError> {
        self.record(format!("create_repository:{}", name));
        if let Some(err) = self.fail_create.lock().unwrap().take() {
            return Err(err);
        }
        let repo = Repository {
            name: name.to_string(),
            html_url: format!("https://github.com/test-org/{}", name),
            description: Some(description.to_string()),
            created_at: Some(chrono::Utc::now()),
        };
        self.repos.lock().unwrap().push(repo.clone());
        Ok(repo)
    }

    async fn put_file(
        &self,
        repo: &str,
        path: &str,
        content: &[u8],
        _message: &str,
    ) -> Result<(), SiteError> {
        self.record(format!("put_file:{}", path));
        self.files
            .lock()
            .unwrap()
            .push((repo.to_string(), path.to_string(), content.to_vec()));
        Ok(())
    }

    async fn set_secret(
        &self,
        repo: &str,
        name: &str,
        value: &SecretString,
    ) -> Result<(), SiteError> {
        self.record(format!("set_secret:{}", name));
        self.secrets.lock().unwrap().push((
            repo.to_string(),
            name.to_string(),
            value.expose_secret().to_string(),
        ));
        Ok(())
    }

    async fn dispatch_workflow(
        &self,
        repo: &str,
        inputs: &WorkflowInputs,
    ) -> Result<(), SiteError> {
        let attempt = {
            let mut times = self.attempt_times.lock().unwrap();
            times.push(Instant::now());
            times.len()
        };
        self.record(format!("dispatch_workflow:{}", repo));

        let remaining = self.failing_dispatches.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_dispatches.store(remaining - 1, Ordering::SeqCst);
            self.dispatch_notify.notify_waiters();
            return Err(SiteError::GitHub {
                status: 404,
                message: format!("Not Found (attempt {})", attempt),
            });
        }

        self.dispatched
            .lock()
            .unwrap()
            .push((repo.to_string(), inputs.clone()));
        self.dispatch_notify.notify_waiters();
        Ok(())
    }

    async fn latest_run(&self, _repo: &str) -> Result<Option<WorkflowRun>, SiteError> {
        if self.fail_latest_run.load(Ordering::SeqCst) {
            return Err(SiteError::GitHub {
                status: 500,
                message: "Server Error".into(),
            });
        }
        Ok(self.latest_run.lock().unwrap().clone())
    }

    async fn list_repositories(&self) -> Result<Vec<Repository>, SiteError> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(SiteError::GitHub {
                status: 403,
                message: "API rate limit exceeded".into(),
            });
        }
        Ok(self.repos.lock().unwrap().clone())
    }

    async fn get_repository(&self, repo: &str) -> Result<Repository, SiteError> {
        self.repos
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.name == repo)
            .cloned()
            .ok_or_else(|| SiteError::GitHub {
                status: 404,
                message: "Not Found".into(),
            })
    }
}

/// Hosting double that links every slug unless told to fail.
#[derive(Default)]
pub struct MockHost {
    linked: Mutex<Vec<String>>,
    fail_link: AtomicBool,
}

impl MockHost {
    pub fn failing() -> Self {
        let host = Self::default();
        host.fail_link.store(true, Ordering::SeqCst);
        host
    }

    pub fn linked(&self) -> Vec<String> {
        self.linked.lock().unwrap().clone()
    }
}

#[async_trait]
impl HostProvider for MockHost {
    async fn link_site(&self, slug: &str) -> Result<HostedSite, SiteError> {
        if self.fail_link.load(Ordering::SeqCst) {
            return Err(SiteError::Netlify {
                status: 422,
                message: "name already taken".into(),
            });
        }
        self.linked.lock().unwrap().push(slug.to_string());
        Ok(HostedSite {
            id: format!("site-{}", slug),
            name: slug.to_string(),
            url: default_site_url(slug),
            admin_url: Some(format!("https://app.netlify.com/sites/{}", slug)),
            deploy_state: None,
        })
    }

    async fn find_site(&self, slug: &str) -> Result<Option<HostedSite>, SiteError> {
        if !self.linked.lock().unwrap().iter().any(|s| s == slug) {
            return Ok(None);
        }
        Ok(Some(HostedSite {
            id: format!("site-{}", slug),
            name: slug.to_string(),
            url: default_site_url(slug),
            admin_url: Some(format!("https://app.netlify.com/sites/{}", slug)),
            deploy_state: Some("ready".into()),
        }))
    }
}
