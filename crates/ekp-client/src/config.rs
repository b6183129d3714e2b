// ABOUTME: Client configuration: service base URLs, agent session, retrieval depth
// ABOUTME: Defaults, then ~/.config/ekp/config.toml, then EKP_* environment variables

use crate::error::{ClientError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_BIZ_URL: &str = "http://localhost:8080";
pub const DEFAULT_AGENT_SESSION: &str = "default";
pub const DEFAULT_TOP_K: u32 = 5;
pub const DEFAULT_HEALTH_POLL_SECS: u64 = 30;

pub const ENV_API_URL: &str = "EKP_API_URL";
pub const ENV_BIZ_URL: &str = "EKP_BIZ_URL";
pub const ENV_AGENT_SESSION: &str = "EKP_AGENT_SESSION";

/// Settings shared by every view of the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the AI service (documents, Q&A, agent).
    pub api_url: String,
    /// Base URL of the business service, used for its health probe.
    pub biz_url: String,
    /// Session id sent with agent queries and cleared by agent `clear`.
    pub agent_session_id: String,
    /// Number of excerpts retrieved per Q&A question.
    pub top_k: u32,
    /// Refetch interval for health probes, in seconds.
    pub health_poll_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            biz_url: DEFAULT_BIZ_URL.to_string(),
            agent_session_id: DEFAULT_AGENT_SESSION.to_string(),
            top_k: DEFAULT_TOP_K,
            health_poll_secs: DEFAULT_HEALTH_POLL_SECS,
        }
    }
}

impl ClientConfig {
    /// Returns the config directory path (~/.config/ekp)
    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ClientError::Config("Could not determine home directory".into()))?;
        Ok(home.join(".config").join("ekp"))
    }

    /// Returns the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load from the default file (if any) and the process environment.
    pub fn load() -> Result<Self> {
        let config = Self::from_default_file()?.with_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Settings from ~/.config/ekp/config.toml, or defaults when it is absent.
    /// Not validated.
    pub fn from_default_file() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse a TOML file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("Failed to read config from {:?}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| ClientError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Apply EKP_* overrides using `lookup` to read variables.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_url = url;
        }
        if let Some(url) = lookup(ENV_BIZ_URL).filter(|v| !v.trim().is_empty()) {
            self.biz_url = url;
        }
        if let Some(session) = lookup(ENV_AGENT_SESSION).filter(|v| !v.trim().is_empty()) {
            self.agent_session_id = session;
        }
        self
    }

    /// Validate that URLs are absolute http(s) and numeric settings are usable.
    pub fn validate(&self) -> Result<()> {
        validate_url("api_url", &self.api_url)?;
        validate_url("biz_url", &self.biz_url)?;
        if self.agent_session_id.trim().is_empty() {
            return Err(ClientError::Config("agent_session_id is required".into()));
        }
        if self.top_k == 0 {
            return Err(ClientError::Config("top_k must be at least 1".into()));
        }
        if self.health_poll_secs == 0 {
            return Err(ClientError::Config(
                "health_poll_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn health_poll_interval(&self) -> Duration {
        Duration::from_secs(self.health_poll_secs)
    }
}

fn validate_url(field: &str, value: &str) -> Result<()> {
    let url = url::Url::parse(value.trim())
        .map_err(|e| ClientError::Config(format!("{} is not a valid URL: {}", field, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ClientError::Config(format!(
            "{} must use http or https, got '{}'",
            field, other
        ))),
    }
}
