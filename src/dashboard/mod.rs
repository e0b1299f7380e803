//! Dashboard: the JSON API the site builder UI talks to.
//!
//! ## Module Map
//!
//! ```text
//! ┌──────────┐  HTTP   ┌───────────────────────────────────────────────┐
//! │ Identity │ ──────> │  server.rs  (ServerConfig, TraceLayer, CORS)  │
//! │  proxy   │ <────── │    └─ api.rs  (routes, OwnerId, ApiError)     │
//! └──────────┘         │         │                                     │
//!                      │         v                                     │
//!                      │  site::SiteService                            │
//!                      └───────────────────────────────────────────────┘
//! ```
//!
//! The server does no authentication of its own. A fronting identity proxy
//! puts the signed-in user's opaque id in the [`USER_HEADER`] header; every
//! `/api` route rejects requests without it.

pub mod api;
pub mod server;

/// Request header carrying the caller's user id.
pub const USER_HEADER: &str = "x-siteforge-user";
