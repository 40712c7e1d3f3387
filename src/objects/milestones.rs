//! Project and group milestones

use chrono::NaiveDate;

use crate::error::{ErrorKind, Result, ResultExt};
use crate::gitlab::pagination::ListPage;
use crate::gitlab::query::{encode_query, Query};
use crate::gitlab::Gitlab;
use crate::resource::{
    into_attrs, Create, Delete, Get, List, ListOptions, Manager, RequiredOptional, ResourceId,
    ResourceObject, RestObject, Update,
};

const PROJECT_CREATE_ATTRS: RequiredOptional = RequiredOptional::new(
    &["title"],
    &["description", "due_date", "start_date", "state_event"],
);

const GROUP_CREATE_ATTRS: RequiredOptional =
    RequiredOptional::new(&["title"], &["description", "due_date", "start_date"]);

const UPDATE_ATTRS: RequiredOptional = RequiredOptional::new(
    &[],
    &["title", "description", "due_date", "start_date", "state_event"],
);

const LIST_FILTERS: &[&str] = &["iids", "state", "search"];
const ARRAY_ATTRS: &[&str] = &["iids"];

/// Dates are sent and received as `YYYY-MM-DD`
fn parse_date(rest: &RestObject, key: &str) -> Option<NaiveDate> {
    rest.get_str(key)
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

/// GET `{milestone}/{relation}` as plain objects
async fn list_related<O: ResourceObject>(
    object: &O,
    relation: &str,
    opts: &ListOptions,
) -> Result<ListPage<RestObject>> {
    let path = format!("{}/{}", object.object_path()?, relation);
    let client = object.manager().client();
    let query: Query = encode_query(&opts.page_params(client), &[]);
    let page = client
        .http()
        .list(&path, &query)
        .await
        .on_http_error(ErrorKind::List)?;
    page.try_map(|value| RestObject::from_value(value, Some("id")))
}

// =============================================================================
// Project milestones
// =============================================================================

/// Manager for `/projects/{project_id}/milestones`
#[derive(Debug, Clone)]
pub struct ProjectMilestoneManager {
    client: Gitlab,
    path: String,
}

impl ProjectMilestoneManager {
    pub(crate) fn new(client: Gitlab, project_id: &ResourceId) -> Self {
        Self {
            client,
            path: format!("/projects/{project_id}/milestones"),
        }
    }
}

impl Manager for ProjectMilestoneManager {
    type Object = ProjectMilestone;

    fn client(&self) -> &Gitlab {
        &self.client
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn array_attrs(&self) -> &'static [&'static str] {
        ARRAY_ATTRS
    }

    fn list_filters(&self) -> &'static [&'static str] {
        LIST_FILTERS
    }

    fn wrap(&self, rest: RestObject) -> ProjectMilestone {
        ProjectMilestone {
            rest,
            manager: self.clone(),
        }
    }
}

impl List for ProjectMilestoneManager {}
impl Get for ProjectMilestoneManager {}
impl Delete for ProjectMilestoneManager {}

impl Create for ProjectMilestoneManager {
    fn create_attrs(&self) -> RequiredOptional {
        PROJECT_CREATE_ATTRS
    }
}

impl Update for ProjectMilestoneManager {
    fn update_attrs(&self) -> RequiredOptional {
        UPDATE_ATTRS
    }
}

/// A project milestone
#[derive(Debug, Clone)]
pub struct ProjectMilestone {
    rest: RestObject,
    manager: ProjectMilestoneManager,
}

resource_object!(ProjectMilestone, ProjectMilestoneManager);

impl ProjectMilestone {
    pub fn title(&self) -> Option<&str> {
        self.rest.get_str("title")
    }

    pub fn state(&self) -> Option<&str> {
        self.rest.get_str("state")
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        parse_date(&self.rest, "due_date")
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        parse_date(&self.rest, "start_date")
    }

    /// Issues assigned to this milestone
    pub async fn issues(&self, opts: &ListOptions) -> Result<ListPage<RestObject>> {
        list_related(self, "issues", opts).await
    }

    /// Merge requests assigned to this milestone
    pub async fn merge_requests(&self, opts: &ListOptions) -> Result<ListPage<RestObject>> {
        list_related(self, "merge_requests", opts).await
    }

    /// Turn this project milestone into a milestone of the parent group
    pub async fn promote(&mut self) -> Result<()> {
        let path = format!("{}/promote", self.object_path()?);
        let value = self
            .manager
            .client
            .http()
            .post(&path, &Query::new(), None)
            .await
            .on_http_error(ErrorKind::Promote)?;
        self.rest.apply(into_attrs(value)?);
        Ok(())
    }
}

// =============================================================================
// Group milestones
// =============================================================================

/// Manager for `/groups/{group_id}/milestones`
#[derive(Debug, Clone)]
pub struct GroupMilestoneManager {
    client: Gitlab,
    path: String,
}

impl GroupMilestoneManager {
    pub(crate) fn new(client: Gitlab, group_id: &ResourceId) -> Self {
        Self {
            client,
            path: format!("/groups/{group_id}/milestones"),
        }
    }
}

impl Manager for GroupMilestoneManager {
    type Object = GroupMilestone;

    fn client(&self) -> &Gitlab {
        &self.client
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn array_attrs(&self) -> &'static [&'static str] {
        ARRAY_ATTRS
    }

    fn list_filters(&self) -> &'static [&'static str] {
        LIST_FILTERS
    }

    fn wrap(&self, rest: RestObject) -> GroupMilestone {
        GroupMilestone {
            rest,
            manager: self.clone(),
        }
    }
}

impl List for GroupMilestoneManager {}
impl Get for GroupMilestoneManager {}
impl Delete for GroupMilestoneManager {}

impl Create for GroupMilestoneManager {
    fn create_attrs(&self) -> RequiredOptional {
        GROUP_CREATE_ATTRS
    }
}

impl Update for GroupMilestoneManager {
    fn update_attrs(&self) -> RequiredOptional {
        UPDATE_ATTRS
    }
}

/// A group milestone
#[derive(Debug, Clone)]
pub struct GroupMilestone {
    rest: RestObject,
    manager: GroupMilestoneManager,
}

resource_object!(GroupMilestone, GroupMilestoneManager);

impl GroupMilestone {
    pub fn title(&self) -> Option<&str> {
        self.rest.get_str("title")
    }

    pub fn state(&self) -> Option<&str> {
        self.rest.get_str("state")
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        parse_date(&self.rest, "due_date")
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        parse_date(&self.rest, "start_date")
    }

    pub async fn issues(&self, opts: &ListOptions) -> Result<ListPage<RestObject>> {
        list_related(self, "issues", opts).await
    }

    pub async fn merge_requests(&self, opts: &ListOptions) -> Result<ListPage<RestObject>> {
        list_related(self, "merge_requests", opts).await
    }
}
