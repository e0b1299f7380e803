//! Helpers shared by the GitHub and Netlify REST clients.

use serde::Deserialize;

pub const USER_AGENT: &str = concat!("siteforge/", env!("CARGO_PKG_VERSION"));

/// GitHub and Netlify report failures as `{"message": "..."}`, the dashboard
/// as `{"error": "..."}`.
#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(default, alias = "error")]
    message: Option<String>,
}

/// Status code and the most useful message from a failed response.
pub async fn error_parts(resp: reqwest::Response) -> (u16, String) {
    let status = resp.status();
    let raw = resp.text().await.unwrap_or_default();

    let message = match serde_json::from_str::<ErrorResponse>(&raw) {
        Ok(ErrorResponse { message: Some(m) }) => m,
        _ if !raw.trim().is_empty() => raw,
        _ => status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string(),
    };
    (status.as_u16(), message)
}

/// Join `path` onto `base` with exactly one slash between them.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

pub fn build_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().user_agent(USER_AGENT).build()
}
