//! SiteForge: natural-language website builder.
//!
//! Provisions one GitHub repository and one linked Netlify site per website,
//! then drives AI edit jobs on it through the repository's CI workflow.

pub mod client;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod github;
pub mod http;
pub mod logging;
pub mod netlify;
pub mod site;
pub mod templates;
pub mod watch;
