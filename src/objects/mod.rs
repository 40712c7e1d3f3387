//! GitLab resource bindings
//!
//! Managers and typed objects for the resource families this crate covers.
//! Managers are obtained from a [`Project`] or [`Group`] handle, or directly
//! from the client for instance-level resources.
//!
//! # Module Structure
//!
//! - [`parents`] - Project and group handles that scope child managers
//! - [`files`] - Repository files
//! - [`jobs`] - CI jobs, artifacts and traces
//! - [`milestones`] - Project and group milestones
//! - [`container_registry`] - Registry repositories and tags
//! - [`ldap`] - LDAP groups

/// Implement [`ResourceObject`](crate::resource::ResourceObject) for a typed
/// wrapper holding `rest` and `manager` fields.
macro_rules! resource_object {
    ($object:ident, $manager:ty) => {
        impl $crate::resource::ResourceObject for $object {
            type Manager = $manager;

            fn rest(&self) -> &$crate::resource::RestObject {
                &self.rest
            }

            fn rest_mut(&mut self) -> &mut $crate::resource::RestObject {
                &mut self.rest
            }

            fn manager(&self) -> &Self::Manager {
                &self.manager
            }
        }
    };
}

pub mod container_registry;
pub mod files;
pub mod jobs;
pub mod ldap;
pub mod milestones;
pub mod parents;

pub use container_registry::{
    GroupRegistryRepositoryManager, ProjectRegistryRepository, ProjectRegistryRepositoryManager,
    ProjectRegistryTag, ProjectRegistryTagManager, RegistryRepository, RegistryRepositoryManager,
};
pub use files::{ProjectFile, ProjectFileManager};
pub use jobs::{ProjectJob, ProjectJobManager};
pub use ldap::{LdapGroup, LdapGroupManager};
pub use milestones::{
    GroupMilestone, GroupMilestoneManager, ProjectMilestone, ProjectMilestoneManager,
};
pub use parents::{Group, Project};
