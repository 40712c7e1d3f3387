//! Resource abstraction layer
//!
//! This module provides the generic machinery shared by every GitLab
//! resource: the attribute bag objects are built from, the identifiers used in
//! URLs, the create/update attribute contracts, and the capability traits
//! managers implement.
//!
//! # Architecture
//!
//! - [`object`] - `RestObject`, attributes plus pending local changes
//! - [`manager`] - `List`/`Get`/`Create`/`Update`/`Delete` capabilities and the
//!   object-side `Save`/`DeleteObject`/`Refresh` operations
//! - [`attrs`] - required/optional attribute validation
//! - [`id`] - URL-encoded identifiers

pub mod attrs;
pub mod id;
pub mod manager;
pub mod object;

pub use attrs::{into_attrs, to_attrs, RequiredOptional};
pub use id::ResourceId;
pub use manager::{
    Create, Delete, DeleteObject, Get, List, ListOptions, Manager, Refresh, ResourceObject, Save,
    Update,
};
pub use object::RestObject;

/// Flat key/value record as exchanged with the API
pub type Attrs = serde_json::Map<String, serde_json::Value>;
