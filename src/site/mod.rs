//! Site workflow: provisioning, edit dispatch and status for SiteForge sites.
//!
//! ## Overview
//!
//! A site is a public repository in one organization plus a hosting site that
//! deploys it on every push. There is no database: ownership and display name
//! are encoded as `[owner:<id>] [display:<name>]` tags in the repository
//! description, and edit jobs are whatever the CI system reports as the
//! latest run.
//!
//! ## Module Map
//!
//! ```text
//!                 ┌──────────────────────────────────────────────┐
//! dashboard ────> │  service.rs  (SiteService, SiteSettings)     │
//!                 │     │ create   slug.rs, tags.rs, templates   │
//!                 │     │          then HostProvider::link_site  │
//!                 │     │          then jobs.rs (initial build)  │
//!                 │     │ edit     dispatch.rs (JobDispatcher)   │
//!                 │     │ status   status.rs  (StatusPoller)     │
//!                 │     │ list     registry.rs (SiteRegistry)    │
//!                 │     v                                        │
//!                 │  provider.rs  (SourceControl, HostProvider)  │
//!                 └─────┬───────────────────────┬────────────────┘
//!                       v                       v
//!                crate::github           crate::netlify
//! ```
//!
//! ## Supporting Modules
//!
//! | Module    | Responsibility                                         |
//! |-----------|--------------------------------------------------------|
//! | `models`  | `Repository`, `WorkflowRun`, `RunState`, API payloads  |
//! | `prompts` | Initial build prompt, URL detection                    |
//! | `jobs`    | Fire-and-forget edit jobs on background tasks          |

pub mod dispatch;
pub mod jobs;
pub mod models;
pub mod prompts;
pub mod provider;
pub mod registry;
pub mod service;
pub mod slug;
pub mod status;
pub mod tags;

#[cfg(test)]
pub(crate) mod testing;

pub use dispatch::{JobDispatcher, RetryPolicy};
pub use models::{CreatedSite, RunState, SiteDetail, SiteSummary, WorkflowStatus};
pub use provider::{HostProvider, SourceControl};
pub use service::{SiteService, SiteSettings};
