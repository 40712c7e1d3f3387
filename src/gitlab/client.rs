//! GitLab Client
//!
//! Main client for interacting with the GitLab API, combining authentication,
//! HTTP functionality and the client-wide list defaults. Resource managers are
//! reached from here.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use super::auth::Credentials;
use super::http::{GitlabHttpClient, RetryConfig};
use crate::error::{GitlabError, Result};
use crate::objects::{Group, LdapGroupManager, Project, RegistryRepositoryManager};
use crate::resource::ResourceId;

/// Default GitLab instance
pub const DEFAULT_URL: &str = "https://gitlab.com";

/// API version prefix appended to the instance URL
pub const API_PREFIX: &str = "/api/v4";

/// Main GitLab client. Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct Gitlab {
    inner: Arc<Inner>,
}

struct Inner {
    url: String,
    http: GitlabHttpClient,
    per_page: Option<u32>,
    order_by: Option<String>,
    pagination: Option<String>,
}

impl Gitlab {
    /// Create a client with default settings
    pub fn new(url: &str, credentials: Credentials) -> Result<Self> {
        GitlabBuilder::new(url).credentials(credentials).build()
    }

    pub fn builder(url: &str) -> GitlabBuilder {
        GitlabBuilder::new(url)
    }

    /// Instance URL, without the API prefix
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub fn api_url(&self) -> &str {
        self.inner.http.api_url()
    }

    pub fn http(&self) -> &GitlabHttpClient {
        &self.inner.http
    }

    pub fn per_page(&self) -> Option<u32> {
        self.inner.per_page
    }

    pub fn order_by(&self) -> Option<&str> {
        self.inner.order_by.as_deref()
    }

    pub fn pagination(&self) -> Option<&str> {
        self.inner.pagination.as_deref()
    }

    // =========================================================================
    // Entry points
    // =========================================================================

    /// Handle on a project, by numeric id or full path
    pub fn project(&self, id: impl Into<ResourceId>) -> Project {
        Project::new(self.clone(), id.into())
    }

    /// Handle on a group, by numeric id or full path
    pub fn group(&self, id: impl Into<ResourceId>) -> Group {
        Group::new(self.clone(), id.into())
    }

    pub fn ldap_groups(&self) -> LdapGroupManager {
        LdapGroupManager::new(self.clone())
    }

    /// Container registry repositories addressed by their global id
    pub fn registry_repositories(&self) -> RegistryRepositoryManager {
        RegistryRepositoryManager::new(self.clone())
    }
}

impl fmt::Debug for Gitlab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gitlab")
            .field("url", &self.inner.url)
            .field("per_page", &self.inner.per_page)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Gitlab`]
#[derive(Debug, Clone)]
pub struct GitlabBuilder {
    url: String,
    credentials: Credentials,
    per_page: Option<u32>,
    order_by: Option<String>,
    pagination: Option<String>,
    timeout: Option<Duration>,
    retry: RetryConfig,
}

impl GitlabBuilder {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            credentials: Credentials::None,
            per_page: None,
            order_by: None,
            pagination: None,
            timeout: None,
            retry: RetryConfig::default(),
        }
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn private_token(self, token: impl Into<String>) -> Self {
        self.credentials(Credentials::PrivateToken(token.into()))
    }

    pub fn oauth_token(self, token: impl Into<String>) -> Self {
        self.credentials(Credentials::OAuthToken(token.into()))
    }

    pub fn job_token(self, token: impl Into<String>) -> Self {
        self.credentials(Credentials::JobToken(token.into()))
    }

    /// Default page size for every list call
    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    /// Pagination mode, e.g. `keyset`
    pub fn pagination(mut self, pagination: impl Into<String>) -> Self {
        self.pagination = Some(pagination.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn build(self) -> Result<Gitlab> {
        let url = normalize_url(&self.url)?;
        let api_url = format!("{url}{API_PREFIX}");
        let http = GitlabHttpClient::new(&api_url, self.credentials, self.timeout, self.retry)?;

        tracing::debug!("GitLab client for {}", api_url);

        Ok(Gitlab {
            inner: Arc::new(Inner {
                url,
                http,
                per_page: self.per_page,
                order_by: self.order_by,
                pagination: self.pagination,
            }),
        })
    }
}

/// Validate the instance URL and strip a trailing slash or API prefix
fn normalize_url(raw: &str) -> Result<String> {
    let parsed = Url::parse(raw.trim())
        .map_err(|e| GitlabError::Config(format!("invalid GitLab URL '{raw}': {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(GitlabError::Config(format!(
            "unsupported URL scheme '{}'",
            parsed.scheme()
        )));
    }

    let url = parsed.as_str().trim_end_matches('/');
    Ok(url.strip_suffix(API_PREFIX).unwrap_or(url).to_string())
}
