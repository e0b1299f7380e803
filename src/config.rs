//! Layered configuration for SiteForge.
//!
//! Settings are resolved in three layers, later layers winning:
//! 1. `siteforge.toml` (non-secret settings only)
//! 2. Environment variables (credentials live here exclusively, `.env` is honoured)
//! 3. CLI arguments (port, dev mode)
//!
//! # Configuration File Format
//!
//! ```toml
//! [github]
//! org = "my-sites"
//! workflow = "ai-edit.yml"
//! branch = "main"
//!
//! [netlify]
//! account_slug = "my-team"
//! installation_id = 12345678
//!
//! [agent]
//! default_model = "claude-sonnet-4-5-20250929"
//! build_model = "claude-opus-4-1-20250805"
//!
//! [timing]
//! repo_init_delay_ms = 2000
//! dispatch_attempts = 3
//! dispatch_base_delay_ms = 3000
//!
//! [server]
//! port = 3141
//! ```

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::site::dispatch::RetryPolicy;

/// Default file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "siteforge.toml";

pub const ENV_GITHUB_TOKEN: &str = "GITHUB_PAT";
pub const ENV_GITHUB_ORG: &str = "GITHUB_ORG";
pub const ENV_ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const ENV_NETLIFY_TOKEN: &str = "NETLIFY_AUTH_TOKEN";
pub const ENV_NETLIFY_ACCOUNT: &str = "NETLIFY_ACCOUNT_SLUG";
pub const ENV_NETLIFY_INSTALLATION_ID: &str = "NETLIFY_GITHUB_INSTALLATION_ID";
pub const ENV_GITHUB_API_URL: &str = "SITEFORGE_GITHUB_API_URL";
pub const ENV_NETLIFY_API_URL: &str = "SITEFORGE_NETLIFY_API_URL";

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_workflow() -> String {
    "ai-edit.yml".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_netlify_api_url() -> String {
    "https://api.netlify.com/api/v1".to_string()
}

fn default_model() -> String {
    "claude-sonnet-4-5-20250929".to_string()
}

fn default_build_model() -> String {
    "claude-opus-4-1-20250805".to_string()
}

fn default_secret_name() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

fn default_repo_init_delay_ms() -> u64 {
    2000
}

fn default_dispatch_attempts() -> u32 {
    3
}

fn default_dispatch_base_delay_ms() -> u64 {
    3000
}

fn default_port() -> u16 {
    3141
}

/// Source-control settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubSection {
    /// Organization that owns every site repository
    #[serde(default)]
    pub org: Option<String>,
    #[serde(default = "default_github_api_url")]
    pub api_url: String,
    /// Workflow file dispatched for AI edits
    #[serde(default = "default_workflow")]
    pub workflow: String,
    /// Branch the workflow runs on and the host deploys from
    #[serde(default = "default_branch")]
    pub branch: String,
}

impl Default for GitHubSection {
    fn default() -> Self {
        Self {
            org: None,
            api_url: default_github_api_url(),
            workflow: default_workflow(),
            branch: default_branch(),
        }
    }
}

/// Hosting-provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetlifySection {
    #[serde(default)]
    pub account_slug: Option<String>,
    /// Netlify's GitHub App installation id for the organization
    #[serde(default)]
    pub installation_id: Option<u64>,
    #[serde(default = "default_netlify_api_url")]
    pub api_url: String,
}

impl Default for NetlifySection {
    fn default() -> Self {
        Self {
            account_slug: None,
            installation_id: None,
            api_url: default_netlify_api_url(),
        }
    }
}

/// Settings forwarded to the coding agent inside CI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSection {
    /// Model used for follow-up edits
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Model used for the initial build from a description
    #[serde(default = "default_build_model")]
    pub build_model: String,
    /// Name of the repository secret holding the agent's API key
    #[serde(default = "default_secret_name")]
    pub secret_name: String,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            build_model: default_build_model(),
            secret_name: default_secret_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingSection {
    #[serde(default = "default_repo_init_delay_ms")]
    pub repo_init_delay_ms: u64,
    #[serde(default = "default_dispatch_attempts")]
    pub dispatch_attempts: u32,
    #[serde(default = "default_dispatch_base_delay_ms")]
    pub dispatch_base_delay_ms: u64,
}

impl Default for TimingSection {
    fn default() -> Self {
        Self {
            repo_init_delay_ms: default_repo_init_delay_ms(),
            dispatch_attempts: default_dispatch_attempts(),
            dispatch_base_delay_ms: default_dispatch_base_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

/// The complete siteforge.toml structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteforgeToml {
    #[serde(default)]
    pub github: GitHubSection,
    #[serde(default)]
    pub netlify: NetlifySection,
    #[serde(default)]
    pub agent: AgentSection,
    #[serde(default)]
    pub timing: TimingSection,
    #[serde(default)]
    pub server: ServerSection,
}

impl SiteforgeToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse siteforge.toml")
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize siteforge.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the file-level settings and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.timing.dispatch_attempts == 0 {
            warnings.push("timing.dispatch_attempts must be at least 1".to_string());
        }
        if self.github.workflow.trim().is_empty() {
            warnings.push("github.workflow must name a workflow file".to_string());
        }
        if self.github.branch.trim().is_empty() {
            warnings.push("github.branch must not be empty".to_string());
        }
        for (key, url) in [
            ("github.api_url", &self.github.api_url),
            ("netlify.api_url", &self.netlify.api_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                warnings.push(format!("{} '{}' is not an http(s) URL", key, url));
            }
        }

        warnings
    }
}

/// Credentials read from the environment. Never serialized.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub github_token: Option<SecretString>,
    pub netlify_token: Option<SecretString>,
    pub anthropic_api_key: Option<SecretString>,
}

/// Fully resolved configuration used by the dashboard and the site workflow.
#[derive(Debug, Clone, Default)]
pub struct SiteforgeConfig {
    pub toml: SiteforgeToml,
    pub credentials: Credentials,
    /// File the settings were read from, if one existed
    pub source: Option<PathBuf>,
}

impl SiteforgeConfig {
    /// Load `path` (or `./siteforge.toml`) and apply process environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
        let toml = SiteforgeToml::load_or_default(&path)?;
        let source = path.exists().then_some(path);

        let mut config = Self {
            toml,
            credentials: Credentials::default(),
            source,
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = non_empty(ENV_GITHUB_TOKEN) {
            self.credentials.github_token = Some(SecretString::from(token));
        }
        if let Some(token) = non_empty(ENV_NETLIFY_TOKEN) {
            self.credentials.netlify_token = Some(SecretString::from(token));
        }
        if let Some(key) = non_empty(ENV_ANTHROPIC_API_KEY) {
            self.credentials.anthropic_api_key = Some(SecretString::from(key));
        }
        if let Some(org) = non_empty(ENV_GITHUB_ORG) {
            self.toml.github.org = Some(org);
        }
        if let Some(account) = non_empty(ENV_NETLIFY_ACCOUNT) {
            self.toml.netlify.account_slug = Some(account);
        }
        if let Some(id) = non_empty(ENV_NETLIFY_INSTALLATION_ID) {
            match id.trim().parse::<u64>() {
                Ok(id) => self.toml.netlify.installation_id = Some(id),
                Err(_) => tracing::warn!(
                    value = %id,
                    "{} is not a number, ignoring",
                    ENV_NETLIFY_INSTALLATION_ID
                ),
            }
        }
        if let Some(url) = non_empty(ENV_GITHUB_API_URL) {
            self.toml.github.api_url = url;
        }
        if let Some(url) = non_empty(ENV_NETLIFY_API_URL) {
            self.toml.netlify.api_url = url;
        }
    }

    /// Everything that prevents the dashboard from provisioning sites.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = self.toml.validate();

        let missing = [
            (self.credentials.github_token.is_none(), ENV_GITHUB_TOKEN),
            (self.credentials.netlify_token.is_none(), ENV_NETLIFY_TOKEN),
            (
                self.credentials.anthropic_api_key.is_none(),
                ENV_ANTHROPIC_API_KEY,
            ),
            (self.toml.github.org.is_none(), ENV_GITHUB_ORG),
            (self.toml.netlify.account_slug.is_none(), ENV_NETLIFY_ACCOUNT),
            (
                self.toml.netlify.installation_id.is_none(),
                ENV_NETLIFY_INSTALLATION_ID,
            ),
        ];
        for (is_missing, name) in missing {
            if is_missing {
                problems.push(format!("{} is not set", name));
            }
        }

        problems
    }

    pub fn repo_init_delay(&self) -> Duration {
        Duration::from_millis(self.toml.timing.repo_init_delay_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.toml.timing.dispatch_attempts.max(1),
            base_delay: Duration::from_millis(self.toml.timing.dispatch_base_delay_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn full_env() -> HashMap<String, String> {
        env(&[
            (ENV_GITHUB_TOKEN, "github_pat_abc"),
            (ENV_GITHUB_ORG, "my-sites"),
            (ENV_ANTHROPIC_API_KEY, "sk-ant-123"),
            (ENV_NETLIFY_TOKEN, "nfp_456"),
            (ENV_NETLIFY_ACCOUNT, "my-team"),
            (ENV_NETLIFY_INSTALLATION_ID, "987654"),
        ])
    }

    #[test]
    fn test_parse_empty_uses_defaults() {
        let toml = SiteforgeToml::parse("").unwrap();
        assert_eq!(toml.github.api_url, "https://api.github.com");
        assert_eq!(toml.github.workflow, "ai-edit.yml");
        assert_eq!(toml.github.branch, "main");
        assert_eq!(toml.netlify.api_url, "https://api.netlify.com/api/v1");
        assert_eq!(toml.timing.repo_init_delay_ms, 2000);
        assert_eq!(toml.timing.dispatch_attempts, 3);
        assert_eq!(toml.timing.dispatch_base_delay_ms, 3000);
        assert_eq!(toml.server.port, 3141);
        assert!(toml.github.org.is_none());
    }

    #[test]
    fn test_parse_sections() {
        let toml = SiteforgeToml::parse(
            r#"
            [github]
            org = "acme-sites"
            branch = "trunk"

            [netlify]
            account_slug = "acme"
            installation_id = 42

            [agent]
            build_model = "claude-big"

            [timing]
            dispatch_base_delay_ms = 10
            "#,
        )
        .unwrap();
        assert_eq!(toml.github.org.as_deref(), Some("acme-sites"));
        assert_eq!(toml.github.branch, "trunk");
        assert_eq!(toml.github.workflow, "ai-edit.yml");
        assert_eq!(toml.netlify.installation_id, Some(42));
        assert_eq!(toml.agent.build_model, "claude-big");
        assert_eq!(toml.agent.default_model, "claude-sonnet-4-5-20250929");
        assert_eq!(toml.timing.dispatch_base_delay_ms, 10);
        assert_eq!(toml.timing.dispatch_attempts, 3);
    }

    #[test]
    fn test_parse_invalid_toml_fails() {
        assert!(SiteforgeToml::parse("[github\norg = ").is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip_through_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let mut toml = SiteforgeToml::default();
        toml.github.org = Some("roundtrip-org".into());
        toml.save(&path).unwrap();

        let loaded = SiteforgeToml::load_or_default(&path).unwrap();
        assert_eq!(loaded.github.org.as_deref(), Some("roundtrip-org"));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let toml = SiteforgeToml::load_or_default(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(toml.server.port, 3141);
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = SiteforgeConfig::default();
        config.toml.github.org = Some("from-file".into());
        let vars = full_env();
        config.apply_env(|k| vars.get(k).cloned());

        assert_eq!(config.toml.github.org.as_deref(), Some("my-sites"));
        assert_eq!(config.toml.netlify.account_slug.as_deref(), Some("my-team"));
        assert_eq!(config.toml.netlify.installation_id, Some(987654));
        assert_eq!(
            config
                .credentials
                .github_token
                .as_ref()
                .unwrap()
                .expose_secret(),
            "github_pat_abc"
        );
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let mut config = SiteforgeConfig::default();
        config.toml.github.org = Some("kept".into());
        let vars = env(&[(ENV_GITHUB_ORG, "   ")]);
        config.apply_env(|k| vars.get(k).cloned());
        assert_eq!(config.toml.github.org.as_deref(), Some("kept"));
    }

    #[test]
    fn test_non_numeric_installation_id_is_ignored() {
        let mut config = SiteforgeConfig::default();
        let vars = env(&[(ENV_NETLIFY_INSTALLATION_ID, "abc")]);
        config.apply_env(|k| vars.get(k).cloned());
        assert!(config.toml.netlify.installation_id.is_none());
    }

    #[test]
    fn test_validate_reports_missing_credentials() {
        let config = SiteforgeConfig::default();
        let problems = config.validate();
        assert!(problems.iter().any(|p| p.contains(ENV_GITHUB_TOKEN)));
        assert!(problems.iter().any(|p| p.contains(ENV_NETLIFY_TOKEN)));
        assert!(problems.iter().any(|p| p.contains(ENV_ANTHROPIC_API_KEY)));
        assert!(problems.iter().any(|p| p.contains(ENV_GITHUB_ORG)));
    }

    #[test]
    fn test_validate_zero_attempts_and_bad_url() {
        let mut toml = SiteforgeToml::default();
        toml.timing.dispatch_attempts = 0;
        toml.github.api_url = "api.github.com".into();
        let warnings = toml.validate();
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_retry_policy_from_timing() {
        let mut config = SiteforgeConfig::default();
        config.toml.timing.dispatch_attempts = 0;
        config.toml.timing.dispatch_base_delay_ms = 250;
        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.base_delay, Duration::from_millis(250));
        assert_eq!(config.repo_init_delay(), Duration::from_millis(2000));
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let mut config = SiteforgeConfig::default();
        let vars = full_env();
        config.apply_env(|k| vars.get(k).cloned());
        let debug = format!("{:?}", config.credentials);
        assert!(!debug.contains("github_pat_abc"));
        assert!(!debug.contains("sk-ant-123"));
    }
}
