//! Typed error hierarchy for SiteForge.
//!
//! Two top-level enums cover the two sides of the system:
//! - `SiteError`: provisioning, dispatch and lookup failures in the site workflow
//! - `ClientError`: failures of the CLI's HTTP client talking to a running dashboard

use thiserror::Error;

/// Errors from the site workflow and the provider clients underneath it.
#[derive(Debug, Error)]
pub enum SiteError {
    #[error("Site name must be lowercase letters, numbers, and hyphens only")]
    InvalidName { name: String },

    #[error("Invalid user id")]
    InvalidOwner { owner: String },

    #[error("GitHub API error {status}: {message}")]
    GitHub { status: u16, message: String },

    #[error("Netlify API error {status}: {message}")]
    Netlify { status: u16, message: String },

    #[error("Failed to encrypt secret {name}: {message}")]
    Encryption { name: String, message: String },

    #[error("Template file {path} is missing from the embedded templates")]
    MissingTemplate { path: String },

    #[error("Site {slug} not found")]
    NotFound { slug: String },

    #[error("Request to {service} failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

impl SiteError {
    /// True for errors raised before any remote call was made.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SiteError::InvalidName { .. } | SiteError::InvalidOwner { .. }
        )
    }

    /// HTTP status reported by the upstream provider, if any.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            SiteError::GitHub { status, .. } | SiteError::Netlify { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors from the dashboard HTTP client used by the `sites` commands.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Dashboard returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to reach dashboard at {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}
