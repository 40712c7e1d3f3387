//! CI jobs
//!
//! Jobs are read-only as resources; state changes go through dedicated
//! action endpoints (`cancel`, `retry`, `play`, `erase`).

use tokio::io::AsyncWrite;

use crate::error::{ErrorKind, Result, ResultExt};
use crate::gitlab::query::Query;
use crate::gitlab::Gitlab;
use crate::resource::{into_attrs, Attrs, Get, List, Manager, ResourceId, ResourceObject, RestObject};

/// Manager for `/projects/{project_id}/jobs`
#[derive(Debug, Clone)]
pub struct ProjectJobManager {
    client: Gitlab,
    path: String,
}

impl ProjectJobManager {
    pub(crate) fn new(client: Gitlab, project_id: &ResourceId) -> Self {
        Self {
            client,
            path: format!("/projects/{project_id}/jobs"),
        }
    }
}

impl Manager for ProjectJobManager {
    type Object = ProjectJob;

    fn client(&self) -> &Gitlab {
        &self.client
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn array_attrs(&self) -> &'static [&'static str] {
        &["scope"]
    }

    fn list_filters(&self) -> &'static [&'static str] {
        &["scope"]
    }

    fn wrap(&self, rest: RestObject) -> ProjectJob {
        ProjectJob {
            rest,
            manager: self.clone(),
        }
    }
}

impl List for ProjectJobManager {}
impl Get for ProjectJobManager {}

/// A CI job
#[derive(Debug, Clone)]
pub struct ProjectJob {
    rest: RestObject,
    manager: ProjectJobManager,
}

resource_object!(ProjectJob, ProjectJobManager);

impl ProjectJob {
    pub fn name(&self) -> Option<&str> {
        self.rest.get_str("name")
    }

    pub fn status(&self) -> Option<&str> {
        self.rest.get_str("status")
    }

    pub fn stage(&self) -> Option<&str> {
        self.rest.get_str("stage")
    }

    fn action_path(&self, action: &str) -> Result<String> {
        Ok(format!("{}/{}", self.object_path()?, action))
    }

    async fn post_action(&self, action: &str, kind: ErrorKind) -> Result<Attrs> {
        let path = self.action_path(action)?;
        let value = self
            .manager
            .client
            .http()
            .post(&path, &Query::new(), None)
            .await
            .on_http_error(kind)?;
        into_attrs(value)
    }

    /// Cancel the job, returning the server's view of it
    pub async fn cancel(&self) -> Result<Attrs> {
        self.post_action("cancel", ErrorKind::JobCancel).await
    }

    /// Retry the job. The server answers with the newly created job.
    pub async fn retry(&self) -> Result<Attrs> {
        self.post_action("retry", ErrorKind::JobRetry).await
    }

    /// Trigger a manual job and update this object with the result
    pub async fn play(&mut self) -> Result<()> {
        let server = self.post_action("play", ErrorKind::JobPlay).await?;
        self.rest.apply(server);
        Ok(())
    }

    /// Remove the job's artifacts and trace
    pub async fn erase(&self) -> Result<()> {
        self.post_action("erase", ErrorKind::JobErase).await?;
        Ok(())
    }

    /// Prevent artifacts from being removed when expiration is set
    pub async fn keep_artifacts(&self) -> Result<()> {
        self.post_action("artifacts/keep", ErrorKind::Create).await?;
        Ok(())
    }

    pub async fn delete_artifacts(&self) -> Result<()> {
        let path = self.action_path("artifacts")?;
        self.manager
            .client
            .http()
            .delete(&path, &Query::new())
            .await
            .on_http_error(ErrorKind::Create)?;
        Ok(())
    }

    /// The artifacts archive
    pub async fn artifacts(&self) -> Result<Vec<u8>> {
        self.download_bytes("artifacts").await
    }

    /// Stream the artifacts archive into `writer`
    pub async fn artifacts_to_writer<W>(&self, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + Send + ?Sized,
    {
        self.download_to("artifacts", writer).await
    }

    /// A single file from the artifacts archive. `path` is sent verbatim.
    pub async fn artifact(&self, path: &str) -> Result<Vec<u8>> {
        self.download_bytes(&format!("artifacts/{}", path.trim_start_matches('/')))
            .await
    }

    pub async fn artifact_to_writer<W>(&self, path: &str, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + Send + ?Sized,
    {
        self.download_to(&format!("artifacts/{}", path.trim_start_matches('/')), writer)
            .await
    }

    /// The job log
    pub async fn trace(&self) -> Result<Vec<u8>> {
        self.download_bytes("trace").await
    }

    pub async fn trace_to_writer<W>(&self, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + Send + ?Sized,
    {
        self.download_to("trace", writer).await
    }

    async fn download_bytes(&self, action: &str) -> Result<Vec<u8>> {
        let path = self.action_path(action)?;
        self.manager
            .client
            .http()
            .get_bytes(&path, &Query::new())
            .await
            .on_http_error(ErrorKind::Get)
    }

    async fn download_to<W>(&self, action: &str, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + Send + ?Sized,
    {
        let path = self.action_path(action)?;
        self.manager
            .client
            .http()
            .download(&path, &Query::new(), writer)
            .await
            .on_http_error(ErrorKind::Get)
    }
}
