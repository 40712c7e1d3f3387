//! Typed bindings for a subset of the GitLab REST API (v4).
//!
//! Repository files, CI jobs, milestones, container registries and LDAP
//! groups are exposed as managers and objects. Managers map CRUD operations
//! onto HTTP verbs and paths; objects carry the server's attributes plus any
//! local changes waiting to be saved.
//!
//! ```ignore
//! use gitlab_objects::prelude::*;
//!
//! async fn close_milestone(gl: &Gitlab) -> gitlab_objects::Result<()> {
//!     let mut milestone = gl.project("group/app").milestones().get(12).await?;
//!     milestone.set("state_event", "close");
//!     milestone.save().await
//! }
//! ```

pub mod error;
pub mod gitlab;
pub mod objects;
pub mod resource;

pub use error::{ErrorKind, GitlabError, Result};
pub use gitlab::{Credentials, Gitlab, GitlabBuilder, ListPage, RetryConfig};

/// Everything needed to drive managers and objects
pub mod prelude {
    pub use crate::error::{ErrorKind, GitlabError, Result};
    pub use crate::gitlab::{Credentials, Gitlab, ListPage};
    pub use crate::objects::*;
    pub use crate::resource::{
        Attrs, Create, Delete, DeleteObject, Get, List, ListOptions, Manager, Refresh,
        ResourceId, ResourceObject, RestObject, Save, Update,
    };
}
