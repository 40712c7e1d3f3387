//! GitLab API interaction module
//!
//! This module provides the core functionality for talking to a GitLab
//! instance: authentication, the HTTP layer, pagination and query encoding.
//!
//! # Module Structure
//!
//! - [`auth`] - Token kinds and the headers they are sent in
//! - [`client`] - Main GitLab client and its builder
//! - [`http`] - HTTP utilities, retry policy and status translation
//! - [`pagination`] - Page metadata and `Link` header parsing
//! - [`query`] - Query string encoding
//!
//! # Example
//!
//! ```ignore
//! use gitlab_objects::gitlab::Gitlab;
//!
//! async fn example() -> gitlab_objects::Result<()> {
//!     let gl = Gitlab::builder("https://gitlab.com").private_token("glpat-...").build()?;
//!     let readme = gl.project("group/app").files().raw("README.md", Some("main")).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
pub mod pagination;
pub mod query;

pub use auth::Credentials;
pub use client::{Gitlab, GitlabBuilder, DEFAULT_URL};
pub use http::{GitlabHttpClient, RetryConfig};
pub use pagination::ListPage;
