//! Job Dispatcher: triggers the AI edit workflow with bounded retries.
//!
//! A freshly pushed workflow file is not dispatchable until the platform has
//! indexed it, so the first dispatch after site creation routinely fails. The
//! dispatcher makes at most `max_attempts` calls, sleeping `attempt × base`
//! between them (linear, no jitter), and returns the last error unchanged.
//!
//! Every failure is retried, including authorization and quota errors that
//! will never succeed; telling "not indexed yet" apart from those is left to
//! a future change.

use std::sync::Arc;
use std::time::Duration;

use super::models::WorkflowInputs;
use super::provider::SourceControl;
use crate::errors::SiteError;

/// Bounded linear backoff for workflow dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(3000),
        }
    }
}

impl RetryPolicy {
    /// Delay after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

/// Dispatches edit jobs for a site repository.
#[derive(Clone)]
pub struct JobDispatcher {
    source: Arc<dyn SourceControl>,
    policy: RetryPolicy,
    default_model: String,
}

impl JobDispatcher {
    pub fn new(source: Arc<dyn SourceControl>, policy: RetryPolicy, default_model: String) -> Self {
        Self {
            source,
            policy,
            default_model,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Trigger one workflow run carrying `prompt`, falling back to the
    /// configured default model when `model` is `None`.
    ///
    /// Not idempotent: every successful call creates a new remote run.
    pub async fn dispatch(
        &self,
        slug: &str,
        prompt: &str,
        model: Option<&str>,
    ) -> Result<(), SiteError> {
        let inputs = WorkflowInputs {
            prompt: prompt.to_string(),
            model: model.unwrap_or(&self.default_model).to_string(),
        };

        let mut attempt = 1;
        loop {
            match self.source.dispatch_workflow(slug, &inputs).await {
                Ok(()) => {
                    tracing::info!(slug, attempt, model = %inputs.model, "Dispatched AI edit");
                    return Ok(());
                }
                Err(e) if attempt < self.policy.max_attempts => {
                    let delay = self.policy.delay_after(attempt);
                    tracing::warn!(
                        slug,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "Workflow dispatch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(slug, attempt, error = %e, "Workflow dispatch failed, giving up");
                    return Err(e);
                }
            }
        }
    }
}
