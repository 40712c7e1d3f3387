//! Manager capabilities
//!
//! A manager is the gateway for one resource type: it knows the URL template
//! (already resolved against its parent), which attributes a create or update
//! needs, and how to wrap server responses into typed objects. Each CRUD
//! capability is its own trait with a default implementation, so a manager
//! opts into exactly the operations its endpoint supports.
//!
//! # Example
//!
//! ```ignore
//! use gitlab_objects::prelude::*;
//!
//! async fn example(gl: &Gitlab) -> gitlab_objects::Result<()> {
//!     let jobs = gl.project("group/app").jobs();
//!     let failed = jobs.list(&ListOptions::new().filter("scope", vec!["failed"])).await?;
//!     for job in failed.items {
//!         job.retry().await?;
//!     }
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde_json::Value;

use super::attrs::{into_attrs, RequiredOptional};
use super::id::ResourceId;
use super::object::RestObject;
use super::Attrs;
use crate::error::{ErrorKind, GitlabError, Result, ResultExt};
use crate::gitlab::pagination::ListPage;
use crate::gitlab::query::{encode_query, Query};
use crate::gitlab::Gitlab;

/// Pagination and filters for list calls
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub filters: Attrs,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    /// Query parameters, with client-wide defaults for anything unset
    pub fn to_params(&self, client: &Gitlab) -> Attrs {
        let mut params = self.page_params(client);
        if let Some(order_by) = client.order_by() {
            params.entry("order_by").or_insert_with(|| order_by.into());
        }
        if let Some(pagination) = client.pagination() {
            params.entry("pagination").or_insert_with(|| pagination.into());
        }
        params
    }

    /// Filters and paging, taking only `per_page` from the client defaults
    pub fn page_params(&self, client: &Gitlab) -> Attrs {
        let mut params = self.filters.clone();
        if let Some(page) = self.page {
            params.insert("page".into(), page.into());
        }
        if let Some(per_page) = self.per_page.or(client.per_page()) {
            params.entry("per_page").or_insert_with(|| per_page.into());
        }
        params
    }
}

/// Common state every manager exposes
pub trait Manager: Send + Sync {
    type Object: Send + 'static;

    fn client(&self) -> &Gitlab;

    /// Resolved collection path, relative to the API root
    fn path(&self) -> &str;

    /// Attribute holding an object's id
    fn id_attr(&self) -> Option<&'static str> {
        Some("id")
    }

    /// List-valued filters sent as `key[]=v`
    fn array_attrs(&self) -> &'static [&'static str] {
        &[]
    }

    /// Filters the list endpoint understands
    fn list_filters(&self) -> &'static [&'static str] {
        &[]
    }

    fn wrap(&self, obj: RestObject) -> Self::Object;

    fn object_from(&self, value: Value) -> Result<Self::Object> {
        RestObject::from_value(value, self.id_attr()).map(|obj| self.wrap(obj))
    }

    fn object_path(&self, id: &ResourceId) -> String {
        format!("{}/{}", self.path(), id)
    }
}

#[async_trait]
pub trait List: Manager {
    /// Path and query for the first page
    fn list_request(&self, opts: &ListOptions) -> (String, Query) {
        let params = opts.to_params(self.client());
        (self.path().to_string(), encode_query(&params, self.array_attrs()))
    }

    /// One page of objects
    async fn list(&self, opts: &ListOptions) -> Result<ListPage<Self::Object>> {
        let (path, query) = self.list_request(opts);
        let page = self
            .client()
            .http()
            .list(&path, &query)
            .await
            .on_http_error(ErrorKind::List)?;
        page.try_map(|value| self.object_from(value))
    }

    /// Every object, following `next` links until the last page
    async fn list_all(&self, opts: &ListOptions) -> Result<Vec<Self::Object>> {
        self.iter(opts).try_collect().await
    }

    /// Lazily fetch pages as the stream is polled
    fn iter(&self, opts: &ListOptions) -> BoxStream<'_, Result<Self::Object>> {
        let first = Some(self.list_request(opts));

        stream::try_unfold(first, move |next| async move {
            let Some((path, query)) = next else {
                return Ok::<_, GitlabError>(None);
            };
            let page = self
                .client()
                .http()
                .list(&path, &query)
                .await
                .on_http_error(ErrorKind::List)?;

            // The next link already carries the full query string
            let following = page.next_url.clone().map(|url| (url, Query::new()));
            let objects = page
                .items
                .into_iter()
                .map(|value| self.object_from(value))
                .collect::<Result<Vec<_>>>()?;

            Ok(Some((
                stream::iter(objects.into_iter().map(Ok::<_, GitlabError>)),
                following,
            )))
        })
        .try_flatten()
        .boxed()
    }
}

#[async_trait]
pub trait Get: Manager {
    async fn get<I>(&self, id: I) -> Result<Self::Object>
    where
        I: Into<ResourceId> + Send,
    {
        self.get_with(id, &Attrs::new()).await
    }

    /// Get with extra query parameters
    async fn get_with<I>(&self, id: I, params: &Attrs) -> Result<Self::Object>
    where
        I: Into<ResourceId> + Send,
    {
        let path = self.object_path(&id.into());
        let query = encode_query(params, self.array_attrs());
        let value = self
            .client()
            .http()
            .get_json(&path, &query)
            .await
            .on_http_error(ErrorKind::Get)?;
        self.object_from(value)
    }

    /// An object holding only its id, without any request
    fn lazy<I>(&self, id: I) -> Self::Object
    where
        I: Into<ResourceId>,
    {
        let mut attrs = Attrs::new();
        if let Some(key) = self.id_attr() {
            attrs.insert(key.to_string(), id.into().to_value());
        }
        self.wrap(RestObject::new(attrs, self.id_attr()))
    }
}

#[async_trait]
pub trait Create: Manager {
    fn create_attrs(&self) -> RequiredOptional;

    async fn create(&self, data: Attrs) -> Result<Self::Object> {
        self.create_attrs().validate(&data, &[])?;
        let body = Value::Object(data);
        let value = self
            .client()
            .http()
            .post(self.path(), &Query::new(), Some(&body))
            .await
            .on_http_error(ErrorKind::Create)?;
        self.object_from(value)
    }
}

#[async_trait]
pub trait Update: Manager {
    fn update_attrs(&self) -> RequiredOptional;

    /// Update an object, returning the server's view of it.
    ///
    /// `id` is `None` for singleton resources addressed by the collection path.
    async fn update(&self, id: Option<ResourceId>, data: Attrs) -> Result<Attrs> {
        let path = match &id {
            Some(id) => self.object_path(id),
            None => self.path().to_string(),
        };
        let excludes: Vec<&str> = self.id_attr().into_iter().collect();
        self.update_attrs().validate(&data, &excludes)?;

        let body = Value::Object(data);
        let value = self
            .client()
            .http()
            .put(&path, &Query::new(), Some(&body))
            .await
            .on_http_error(ErrorKind::Update)?;
        into_attrs(value)
    }
}

#[async_trait]
pub trait Delete: Manager {
    async fn delete<I>(&self, id: I) -> Result<()>
    where
        I: Into<ResourceId> + Send,
    {
        let path = self.object_path(&id.into());
        self.client()
            .http()
            .delete(&path, &Query::new())
            .await
            .on_http_error(ErrorKind::Delete)?;
        Ok(())
    }
}

/// Typed object backed by a [`RestObject`] and the manager that produced it
pub trait ResourceObject: Send + Sync {
    type Manager: Manager;

    fn rest(&self) -> &RestObject;
    fn rest_mut(&mut self) -> &mut RestObject;
    fn manager(&self) -> &Self::Manager;

    fn get(&self, key: &str) -> Option<&Value> {
        self.rest().get(key)
    }

    fn set(&mut self, key: impl Into<String>, value: impl Into<Value>)
    where
        Self: Sized,
    {
        self.rest_mut().set(key, value);
    }

    /// Path of this object on the server
    fn object_path(&self) -> Result<String> {
        let id = self.rest().require_id()?;
        Ok(self.manager().object_path(&id))
    }
}

/// Push local changes back to the server
#[async_trait]
pub trait Save {
    async fn save(&mut self) -> Result<()>;
}

#[async_trait]
impl<O> Save for O
where
    O: ResourceObject,
    O::Manager: Update,
{
    async fn save(&mut self) -> Result<()> {
        let data = self.rest().updated_data(&self.manager().update_attrs());
        if data.is_empty() {
            return Ok(());
        }
        let id = self.rest().id();
        let server = self.manager().update(id, data).await?;
        self.rest_mut().apply(server);
        Ok(())
    }
}

/// Delete the object through its manager
#[async_trait]
pub trait DeleteObject {
    async fn delete(&self) -> Result<()>;
}

#[async_trait]
impl<O> DeleteObject for O
where
    O: ResourceObject,
    O::Manager: Delete,
{
    async fn delete(&self) -> Result<()> {
        let id = self.rest().require_id()?;
        self.manager().delete(id).await
    }
}

/// Reload the object's attributes from the server
#[async_trait]
pub trait Refresh {
    async fn refresh(&mut self) -> Result<()>;
}

#[async_trait]
impl<O> Refresh for O
where
    O: ResourceObject,
    O::Manager: Get,
{
    async fn refresh(&mut self) -> Result<()> {
        let path = self.object_path()?;
        let value = self
            .manager()
            .client()
            .http()
            .get_json(&path, &Query::new())
            .await
            .on_http_error(ErrorKind::Get)?;
        self.rest_mut().apply(into_attrs(value)?);
        Ok(())
    }
}
