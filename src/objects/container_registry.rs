//! Container registry repositories and tags

use serde_json::Value;

use crate::error::{ErrorKind, GitlabError, Result, ResultExt};
use crate::gitlab::query::Query;
use crate::gitlab::Gitlab;
use crate::resource::{Delete, Get, List, Manager, ResourceId, RestObject};

// =============================================================================
// Project repositories
// =============================================================================

/// Manager for `/projects/{project_id}/registry/repositories`
#[derive(Debug, Clone)]
pub struct ProjectRegistryRepositoryManager {
    client: Gitlab,
    project_id: ResourceId,
    path: String,
}

impl ProjectRegistryRepositoryManager {
    pub(crate) fn new(client: Gitlab, project_id: &ResourceId) -> Self {
        Self {
            client,
            project_id: project_id.clone(),
            path: format!("/projects/{project_id}/registry/repositories"),
        }
    }

    /// Tags of a repository of this project, by repository id
    pub fn tags(&self, repository_id: impl Into<ResourceId>) -> ProjectRegistryTagManager {
        ProjectRegistryTagManager::new(self.client.clone(), &self.project_id, &repository_id.into())
    }
}

impl Manager for ProjectRegistryRepositoryManager {
    type Object = ProjectRegistryRepository;

    fn client(&self) -> &Gitlab {
        &self.client
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn list_filters(&self) -> &'static [&'static str] {
        &["tags", "tags_count"]
    }

    fn wrap(&self, rest: RestObject) -> ProjectRegistryRepository {
        ProjectRegistryRepository {
            rest,
            manager: self.clone(),
        }
    }
}

impl List for ProjectRegistryRepositoryManager {}
impl Delete for ProjectRegistryRepositoryManager {}

/// An image repository inside a project's registry
#[derive(Debug, Clone)]
pub struct ProjectRegistryRepository {
    rest: RestObject,
    manager: ProjectRegistryRepositoryManager,
}

resource_object!(ProjectRegistryRepository, ProjectRegistryRepositoryManager);

impl ProjectRegistryRepository {
    pub fn name(&self) -> Option<&str> {
        self.rest.get_str("name")
    }

    /// Full image path, e.g. `group/app/backend`
    pub fn location(&self) -> Option<&str> {
        self.rest.get_str("location")
    }

    /// Tags of this repository, addressed through its `project_id` and `id`
    pub fn tags(&self) -> Result<ProjectRegistryTagManager> {
        let project_id = self
            .rest
            .get("project_id")
            .and_then(ResourceId::from_value)
            .ok_or_else(|| GitlabError::MissingAttributes(vec!["project_id".into()]))?;
        let repository_id = self.rest.require_id()?;

        Ok(ProjectRegistryTagManager::new(
            self.manager.client.clone(),
            &project_id,
            &repository_id,
        ))
    }
}

// =============================================================================
// Tags
// =============================================================================

/// Manager for `/projects/{project_id}/registry/repositories/{repository_id}/tags`
#[derive(Debug, Clone)]
pub struct ProjectRegistryTagManager {
    client: Gitlab,
    path: String,
}

impl ProjectRegistryTagManager {
    pub(crate) fn new(client: Gitlab, project_id: &ResourceId, repository_id: &ResourceId) -> Self {
        Self {
            client,
            path: format!("/projects/{project_id}/registry/repositories/{repository_id}/tags"),
        }
    }

    /// Delete tags matching `name_regex_delete` in one call.
    ///
    /// `keep_n` keeps the most recent matches, `name_regex_keep` protects
    /// tags from deletion and `older_than` (e.g. `1h`, `7d`) limits the
    /// deletion to older tags. The server processes the request
    /// asynchronously.
    pub async fn delete_in_bulk(
        &self,
        name_regex_delete: &str,
        keep_n: Option<u32>,
        name_regex_keep: Option<&str>,
        older_than: Option<&str>,
    ) -> Result<()> {
        let mut query: Query = vec![("name_regex_delete".to_string(), name_regex_delete.to_string())];
        if let Some(keep_n) = keep_n {
            query.push(("keep_n".to_string(), keep_n.to_string()));
        }
        if let Some(keep) = name_regex_keep {
            query.push(("name_regex_keep".to_string(), keep.to_string()));
        }
        if let Some(older_than) = older_than {
            query.push(("older_than".to_string(), older_than.to_string()));
        }

        tracing::info!("bulk deleting registry tags in {}", self.path);
        self.client
            .http()
            .delete(&self.path, &query)
            .await
            .on_http_error(ErrorKind::Delete)?;
        Ok(())
    }
}

impl Manager for ProjectRegistryTagManager {
    type Object = ProjectRegistryTag;

    fn client(&self) -> &Gitlab {
        &self.client
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn id_attr(&self) -> Option<&'static str> {
        Some("name")
    }

    fn wrap(&self, rest: RestObject) -> ProjectRegistryTag {
        ProjectRegistryTag {
            rest,
            manager: self.clone(),
        }
    }
}

impl List for ProjectRegistryTagManager {}
impl Get for ProjectRegistryTagManager {}
impl Delete for ProjectRegistryTagManager {}

/// An image tag
#[derive(Debug, Clone)]
pub struct ProjectRegistryTag {
    rest: RestObject,
    manager: ProjectRegistryTagManager,
}

resource_object!(ProjectRegistryTag, ProjectRegistryTagManager);

impl ProjectRegistryTag {
    pub fn name(&self) -> Option<&str> {
        self.rest.get_str("name")
    }

    pub fn digest(&self) -> Option<&str> {
        self.rest.get_str("digest")
    }

    pub fn total_size(&self) -> Option<u64> {
        self.rest.get_u64("total_size")
    }
}

// =============================================================================
// Group repositories
// =============================================================================

/// Manager for `/groups/{group_id}/registry/repositories`.
///
/// Repositories listed here belong to projects, so they are returned as
/// [`ProjectRegistryRepository`] bound to their own project.
#[derive(Debug, Clone)]
pub struct GroupRegistryRepositoryManager {
    client: Gitlab,
    path: String,
}

impl GroupRegistryRepositoryManager {
    pub(crate) fn new(client: Gitlab, group_id: &ResourceId) -> Self {
        Self {
            client,
            path: format!("/groups/{group_id}/registry/repositories"),
        }
    }
}

impl Manager for GroupRegistryRepositoryManager {
    type Object = ProjectRegistryRepository;

    fn client(&self) -> &Gitlab {
        &self.client
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn list_filters(&self) -> &'static [&'static str] {
        &["tags", "tags_count"]
    }

    fn wrap(&self, rest: RestObject) -> ProjectRegistryRepository {
        // object_from guarantees project_id is present
        let project_id = rest
            .get("project_id")
            .and_then(ResourceId::from_value)
            .unwrap_or_else(|| ResourceId::new(""));
        ProjectRegistryRepository {
            rest,
            manager: ProjectRegistryRepositoryManager::new(self.client.clone(), &project_id),
        }
    }

    fn object_from(&self, value: Value) -> Result<ProjectRegistryRepository> {
        let rest = RestObject::from_value(value, self.id_attr())?;
        if rest.get("project_id").and_then(ResourceId::from_value).is_none() {
            return Err(GitlabError::MissingAttributes(vec!["project_id".into()]));
        }
        Ok(self.wrap(rest))
    }
}

impl List for GroupRegistryRepositoryManager {}

// =============================================================================
// Instance-level repositories
// =============================================================================

/// Manager for `/registry/repositories`, looked up by global id
#[derive(Debug, Clone)]
pub struct RegistryRepositoryManager {
    client: Gitlab,
}

impl RegistryRepositoryManager {
    pub(crate) fn new(client: Gitlab) -> Self {
        Self { client }
    }
}

impl Manager for RegistryRepositoryManager {
    type Object = RegistryRepository;

    fn client(&self) -> &Gitlab {
        &self.client
    }

    fn path(&self) -> &str {
        "/registry/repositories"
    }

    fn wrap(&self, rest: RestObject) -> RegistryRepository {
        RegistryRepository {
            rest,
            manager: self.clone(),
        }
    }
}

impl Get for RegistryRepositoryManager {}

/// A registry repository fetched by its global id
#[derive(Debug, Clone)]
pub struct RegistryRepository {
    rest: RestObject,
    manager: RegistryRepositoryManager,
}

resource_object!(RegistryRepository, RegistryRepositoryManager);

impl RegistryRepository {
    pub fn path(&self) -> Option<&str> {
        self.rest.get_str("path")
    }

    pub fn project_id(&self) -> Option<u64> {
        self.rest.get_u64("project_id")
    }

    /// Tags of this repository, through its owning project
    pub fn tags(&self) -> Result<ProjectRegistryTagManager> {
        let project_id = self
            .rest
            .get("project_id")
            .and_then(ResourceId::from_value)
            .ok_or_else(|| GitlabError::MissingAttributes(vec!["project_id".into()]))?;
        let repository_id = self.rest.require_id()?;
        Ok(ProjectRegistryTagManager::new(
            self.manager.client.clone(),
            &project_id,
            &repository_id,
        ))
    }
}
