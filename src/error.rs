//! Error types for GitLab API operations
//!
//! Transport-level failures surface as [`GitlabError::Http`] or
//! [`GitlabError::Authentication`]. Manager methods re-tag `Http` failures with
//! the [`ErrorKind`] of the operation that was attempted, so callers can tell a
//! failed create from a failed delete without inspecting the URL.

use std::fmt;

use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T, E = GitlabError> = std::result::Result<T, E>;

/// The operation a failed request belonged to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    List,
    Get,
    Head,
    Create,
    Update,
    Delete,
    JobCancel,
    JobRetry,
    JobPlay,
    JobErase,
    Promote,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::List => "list",
            Self::Get => "get",
            Self::Head => "head",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::JobCancel => "job cancel",
            Self::JobRetry => "job retry",
            Self::JobPlay => "job play",
            Self::JobErase => "job erase",
            Self::Promote => "promote",
        };
        f.write_str(name)
    }
}

/// Server-side failures worth retrying: 5xx gateway errors, Cloudflare 52x
/// and 409 while a resource lock is held
pub fn is_transient_status(status: u16, body: &str) -> bool {
    matches!(status, 500 | 502 | 503 | 504 | 520..=530)
        || (status == 409 && body.contains("Resource lock"))
}

/// Main error type for the library
#[derive(Error, Debug)]
pub enum GitlabError {
    /// The server rejected the credentials (401)
    #[error("Authentication failed ({status}): {message}")]
    Authentication {
        status: u16,
        message: String,
        body: String,
    },

    /// Unexpected status, not yet attributed to an operation
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        body: String,
    },

    /// Unexpected status while performing a specific operation
    #[error("{kind} failed ({status}): {message}")]
    Operation {
        kind: ErrorKind,
        status: u16,
        message: String,
        body: String,
    },

    #[error("Missing attributes: {}", .0.join(", "))]
    MissingAttributes(Vec<String>),

    /// Zero or several attributes of a mutually exclusive set were provided
    #[error("Provide exactly one of these attributes: {}", .0.join(", "))]
    ExclusiveAttributes(Vec<String>),

    /// Connection, TLS or timeout failure
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to parse server response: {0}")]
    Parsing(String),

    #[error("Failed to decode content: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GitlabError {
    /// HTTP status carried by the error, if any
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { status, .. }
            | Self::Http { status, .. }
            | Self::Operation { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Operation kind, for errors produced by a manager method
    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Operation { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Raw response body, for errors produced by a server response
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Authentication { body, .. }
            | Self::Http { body, .. }
            | Self::Operation { body, .. } => Some(body),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Whether retrying the same request could succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_connect() || e.is_timeout(),
            _ => match self.status() {
                Some(429) => true,
                Some(status) => is_transient_status(status, self.body().unwrap_or_default()),
                None => false,
            },
        }
    }

    /// Attribute an `Http` failure to `kind`. Other variants pass through.
    #[must_use]
    pub fn with_kind(self, kind: ErrorKind) -> Self {
        match self {
            Self::Http {
                status,
                message,
                body,
            } => Self::Operation {
                kind,
                status,
                message,
                body,
            },
            other => other,
        }
    }
}

/// Attach an operation kind to the error side of a result
pub trait ResultExt<T> {
    fn on_http_error(self, kind: ErrorKind) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn on_http_error(self, kind: ErrorKind) -> Result<T> {
        self.map_err(|e| e.with_kind(kind))
    }
}
