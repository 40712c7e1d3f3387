//! Configuration Management
//!
//! Handles persistent configuration storage for gitlab-objects. Values are
//! resolved with the precedence CLI flag > environment > config file > default.

use anyhow::{Context, Result};
use gitlab_objects::gitlab::auth::{JOB_TOKEN_ENV, OAUTH_TOKEN_ENV, PRIVATE_TOKEN_ENV};
use gitlab_objects::gitlab::{Credentials, RetryConfig, DEFAULT_URL};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable overriding the instance URL
pub const URL_ENV: &str = "GITLAB_URL";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// GitLab instance URL
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub private_token: Option<String>,
    #[serde(default)]
    pub oauth_token: Option<String>,
    #[serde(default)]
    pub job_token: Option<String>,
    /// Default page size for list commands
    #[serde(default)]
    pub per_page: Option<u32>,
    /// Request timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Retry budget; negative means unbounded
    #[serde(default)]
    pub max_retries: Option<i64>,
    #[serde(default)]
    pub retry_transient_errors: Option<bool>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gitlab-objects").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(())
    }

    /// Set one key by name, as used by `config set`
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "url" => self.url = Some(value.to_string()),
            "private_token" => self.private_token = Some(value.to_string()),
            "oauth_token" => self.oauth_token = Some(value.to_string()),
            "job_token" => self.job_token = Some(value.to_string()),
            "per_page" => self.per_page = Some(value.parse().context("per_page must be a number")?),
            "timeout_secs" => {
                self.timeout_secs = Some(value.parse().context("timeout_secs must be a number")?)
            }
            "max_retries" => {
                self.max_retries = Some(value.parse().context("max_retries must be a number")?)
            }
            "retry_transient_errors" => {
                self.retry_transient_errors =
                    Some(value.parse().context("retry_transient_errors must be true or false")?)
            }
            other => anyhow::bail!("Unknown config key: {other}"),
        }
        Ok(())
    }

    /// Get effective URL (CLI > env > config > gitlab.com)
    pub fn effective_url(&self, cli: Option<&str>) -> String {
        cli.map(str::to_string)
            .or_else(|| env_var(URL_ENV))
            .or_else(|| self.url.clone())
            .unwrap_or_else(|| DEFAULT_URL.to_string())
    }

    /// Get effective credentials (CLI > env > config > anonymous)
    pub fn effective_credentials(&self, cli: Credentials) -> Credentials {
        if !cli.is_anonymous() {
            return cli;
        }
        if let Some(creds) = Credentials::from_env() {
            return creds;
        }
        self.file_credentials()
    }

    fn file_credentials(&self) -> Credentials {
        self.private_token
            .clone()
            .map(Credentials::PrivateToken)
            .or_else(|| self.oauth_token.clone().map(Credentials::OAuthToken))
            .or_else(|| self.job_token.clone().map(Credentials::JobToken))
            .unwrap_or_default()
    }

    pub fn effective_per_page(&self, cli: Option<u32>) -> Option<u32> {
        cli.or(self.per_page)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn retry(&self) -> RetryConfig {
        let defaults = RetryConfig::default();
        RetryConfig {
            max_retries: match self.max_retries {
                Some(n) if n < 0 => None,
                Some(n) => Some(u32::try_from(n).unwrap_or(u32::MAX)),
                None => defaults.max_retries,
            },
            retry_transient_errors: self
                .retry_transient_errors
                .unwrap_or(defaults.retry_transient_errors),
            ..defaults
        }
    }

    /// Config as JSON with tokens masked, for `config show`
    pub fn redacted(&self) -> serde_json::Value {
        let mask = |token: &Option<String>| token.as_ref().map(|_| "***".to_string());
        let shown = Config {
            private_token: mask(&self.private_token),
            oauth_token: mask(&self.oauth_token),
            job_token: mask(&self.job_token),
            ..self.clone()
        };
        serde_json::to_value(shown).unwrap_or_default()
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Names of the environment variables consulted, for `config show`
pub fn env_overrides() -> Vec<&'static str> {
    [URL_ENV, PRIVATE_TOKEN_ENV, OAUTH_TOKEN_ENV, JOB_TOKEN_ENV]
        .into_iter()
        .filter(|name| env_var(name).is_some())
        .collect()
}
