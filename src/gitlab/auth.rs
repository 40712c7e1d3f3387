//! GitLab Authentication
//!
//! GitLab accepts three kinds of tokens, each sent in its own header.

use std::fmt;

use reqwest::RequestBuilder;

/// Environment variables checked by [`Credentials::from_env`], in order
pub const PRIVATE_TOKEN_ENV: &str = "GITLAB_PRIVATE_TOKEN";
pub const OAUTH_TOKEN_ENV: &str = "GITLAB_OAUTH_TOKEN";
pub const JOB_TOKEN_ENV: &str = "CI_JOB_TOKEN";

/// Token used to authenticate API requests
#[derive(Clone, Default, PartialEq, Eq)]
pub enum Credentials {
    /// Personal, project or group access token (`PRIVATE-TOKEN` header)
    PrivateToken(String),
    /// OAuth2 access token (`Authorization: Bearer`)
    OAuthToken(String),
    /// CI job token (`JOB-TOKEN` header)
    JobToken(String),
    /// Anonymous access
    #[default]
    None,
}

impl Credentials {
    /// Pick up a token from the environment, if one is set
    pub fn from_env() -> Option<Self> {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        read(PRIVATE_TOKEN_ENV)
            .map(Self::PrivateToken)
            .or_else(|| read(OAUTH_TOKEN_ENV).map(Self::OAuthToken))
            .or_else(|| read(JOB_TOKEN_ENV).map(Self::JobToken))
    }

    /// Attach the authentication header to a request
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Self::PrivateToken(token) => request.header("PRIVATE-TOKEN", token),
            Self::OAuthToken(token) => request.bearer_auth(token),
            Self::JobToken(token) => request.header("JOB-TOKEN", token),
            Self::None => request,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::None)
    }
}

// Security: never print tokens, only which kind is configured
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::PrivateToken(_) => "PrivateToken(***)",
            Self::OAuthToken(_) => "OAuthToken(***)",
            Self::JobToken(_) => "JobToken(***)",
            Self::None => "None",
        };
        f.write_str(kind)
    }
}
