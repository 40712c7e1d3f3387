//! Parent handles
//!
//! A project or group handle carries no attributes of its own, only the id
//! substituted into its children's URL templates. No request is made until a
//! child manager is used.

use crate::gitlab::Gitlab;
use crate::resource::ResourceId;

use super::container_registry::{GroupRegistryRepositoryManager, ProjectRegistryRepositoryManager};
use super::files::ProjectFileManager;
use super::jobs::ProjectJobManager;
use super::milestones::{GroupMilestoneManager, ProjectMilestoneManager};

/// A project, by numeric id or full path
#[derive(Debug, Clone)]
pub struct Project {
    client: Gitlab,
    id: ResourceId,
}

impl Project {
    pub(crate) fn new(client: Gitlab, id: ResourceId) -> Self {
        Self { client, id }
    }

    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    pub fn files(&self) -> ProjectFileManager {
        ProjectFileManager::new(self.client.clone(), &self.id)
    }

    pub fn jobs(&self) -> ProjectJobManager {
        ProjectJobManager::new(self.client.clone(), &self.id)
    }

    pub fn milestones(&self) -> ProjectMilestoneManager {
        ProjectMilestoneManager::new(self.client.clone(), &self.id)
    }

    pub fn registry_repositories(&self) -> ProjectRegistryRepositoryManager {
        ProjectRegistryRepositoryManager::new(self.client.clone(), &self.id)
    }
}

/// A group, by numeric id or full path
#[derive(Debug, Clone)]
pub struct Group {
    client: Gitlab,
    id: ResourceId,
}

impl Group {
    pub(crate) fn new(client: Gitlab, id: ResourceId) -> Self {
        Self { client, id }
    }

    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    pub fn milestones(&self) -> GroupMilestoneManager {
        GroupMilestoneManager::new(self.client.clone(), &self.id)
    }

    pub fn registry_repositories(&self) -> GroupRegistryRepositoryManager {
        GroupRegistryRepositoryManager::new(self.client.clone(), &self.id)
    }
}
