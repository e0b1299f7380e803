use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A source repository (subset of fields we care about).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Repository {
    pub name: String,
    pub html_url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// The most recent CI run of a repository (subset of fields).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowRun {
    pub status: String,
    #[serde(default)]
    pub conclusion: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub html_url: String,
}

/// Inputs passed to the `workflow_dispatch` trigger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowInputs {
    pub prompt: String,
    pub model: String,
}

/// A hosting-provider site linked to a repository.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostedSite {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub admin_url: Option<String>,
    #[serde(default)]
    pub deploy_state: Option<String>,
}

/// Classified state of the latest edit job, derived on every poll.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    None,
    Working,
    Done,
    Failed,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Working => "working",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Pure mapping from a run's `(status, conclusion)` pair.
    ///
    /// Any status other than `completed` (`queued`, `in_progress`, `waiting`,
    /// ...) is still working. A completed run is `done` only on `success`.
    pub fn from_run_fields(status: &str, conclusion: Option<&str>) -> Self {
        match (status, conclusion) {
            ("completed", Some("success")) => Self::Done,
            ("completed", _) => Self::Failed,
            _ => Self::Working,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl FromStr for RunState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "working" => Ok(Self::Working),
            "done" => Ok(Self::Done),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid run state: {}", s)),
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status payload returned to dashboard clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowStatus {
    pub state: RunState,
    /// Raw upstream status, or `none` when there is no run
    pub status: String,
    #[serde(default)]
    pub conclusion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
}

impl WorkflowStatus {
    pub fn none() -> Self {
        Self {
            state: RunState::None,
            status: "none".to_string(),
            conclusion: None,
            started_at: None,
            html_url: None,
        }
    }

    pub fn from_run(run: WorkflowRun) -> Self {
        Self {
            state: RunState::from_run_fields(&run.status, run.conclusion.as_deref()),
            status: run.status,
            conclusion: run.conclusion,
            started_at: run.created_at,
            html_url: Some(run.html_url),
        }
    }
}

/// One entry of a user's site listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteSummary {
    pub id: String,
    pub name: String,
    pub url: String,
    pub github_url: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Result of a successful site creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreatedSite {
    pub id: String,
    pub name: String,
    pub url: String,
    pub github_url: String,
    #[serde(default)]
    pub admin_url: Option<String>,
}

/// Repository and hosting details for a single owned site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteDetail {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub url: String,
    pub github_url: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub admin_url: Option<String>,
    #[serde(default)]
    pub deploy_state: Option<String>,
}

/// Public URL a site is served from before the host reports its own.
pub fn default_site_url(slug: &str) -> String {
    format!("https://{}.netlify.app", slug)
}
