use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, Query, State},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use super::USER_HEADER;
use crate::errors::SiteError;
use crate::site::SiteService;
use crate::site::tags;

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub sites: SiteService,
}

pub type SharedState = Arc<AppState>;

// ── Request payload types ─────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSiteRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EditRequest {
    #[serde(default, alias = "siteId")]
    pub site_id: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EditAccepted {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    #[serde(default)]
    pub repo: Option<String>,
}

// ── Caller identity ───────────────────────────────────────────────────

/// The opaque user id set by the identity proxy.
#[derive(Debug, Clone)]
pub struct OwnerId(pub String);

impl<S: Send + Sync> FromRequestParts<S> for OwnerId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let owner = parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(ApiError::Unauthorized)?;
        tags::validate_owner_id(owner)?;
        Ok(OwnerId(owner.to_string()))
    }
}

// ── Error handling ────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    BadRequest(String),
    NotFound(String),
    /// An upstream provider refused or failed the request
    Upstream(String),
    Internal(String),
}

impl From<SiteError> for ApiError {
    fn from(err: SiteError) -> Self {
        match &err {
            SiteError::InvalidName { .. } | SiteError::InvalidOwner { .. } => {
                ApiError::BadRequest(err.to_string())
            }
            SiteError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            SiteError::GitHub { .. } | SiteError::Netlify { .. } | SiteError::Transport { .. } => {
                ApiError::Upstream(err.to_string())
            }
            SiteError::Encryption { .. } | SiteError::MissingTemplate { .. } => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        if status.is_server_error() {
            tracing::error!(%status, error = %message, "Request failed");
        }
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/api/sites", get(list_sites).post(create_site))
        .route("/api/sites/{id}", get(get_site))
        .route("/api/ai-edit", post(trigger_edit))
        .route("/api/workflow-status", get(workflow_status))
        .route("/health", get(health_check))
}

fn required(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

async fn list_sites(
    State(state): State<SharedState>,
    OwnerId(owner): OwnerId,
) -> Result<impl IntoResponse, ApiError> {
    let sites = state.sites.list_sites(&owner).await?;
    Ok(Json(sites))
}

async fn create_site(
    State(state): State<SharedState>,
    OwnerId(owner): OwnerId,
    Json(req): Json<CreateSiteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // A missing name fails the same pattern check as a malformed one
    let name = req.name.unwrap_or_default();
    let created = state
        .sites
        .create_site(&owner, &name, req.description.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_site(
    State(state): State<SharedState>,
    OwnerId(owner): OwnerId,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state.sites.site_detail(&owner, &id).await?;
    Ok(Json(detail))
}

async fn trigger_edit(
    State(state): State<SharedState>,
    OwnerId(owner): OwnerId,
    Json(req): Json<EditRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(site_id), Some(prompt)) = (required(req.site_id), required(req.prompt)) else {
        return Err(ApiError::BadRequest("Missing site_id or prompt".into()));
    };

    tracing::info!(owner = %owner, site_id = %site_id, "Edit requested");
    state.sites.trigger_edit(&site_id, &prompt, None).await?;

    Ok(Json(EditAccepted {
        ok: true,
        message: "Edit triggered".to_string(),
    }))
}

async fn workflow_status(
    State(state): State<SharedState>,
    _owner: OwnerId,
    Query(query): Query<StatusQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = required(query.repo).ok_or_else(|| ApiError::BadRequest("Missing repo param".into()))?;
    Ok(Json(state.sites.workflow_status(&repo).await))
}

// ── Tests ─────────────────────────────────────────────────────────────
