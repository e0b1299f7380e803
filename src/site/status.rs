//! Status Poller: classifies the latest CI run of a site repository.
//!
//! Stateless per call: every poll re-derives the state from the remote
//! system's most recent run. Query failures are logged and reported as
//! `none`, the same as a repository that has never run a job, so a flaky
//! upstream never breaks a dashboard that polls every few seconds.

use std::sync::Arc;

use super::models::WorkflowStatus;
use super::provider::SourceControl;

#[derive(Clone)]
pub struct StatusPoller {
    source: Arc<dyn SourceControl>,
}

impl StatusPoller {
    pub fn new(source: Arc<dyn SourceControl>) -> Self {
        Self { source }
    }

    pub async fn status(&self, slug: &str) -> WorkflowStatus {
        match self.source.latest_run(slug).await {
            Ok(Some(run)) => WorkflowStatus::from_run(run),
            Ok(None) => WorkflowStatus::none(),
            Err(e) => {
                tracing::warn!(slug, error = %e, "Workflow status query failed, reporting none");
                WorkflowStatus::none()
            }
        }
    }
}
