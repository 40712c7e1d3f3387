//! Repository files
//!
//! Files are addressed by their path inside the repository, which is sent as a
//! single encoded URL segment. Every write is a commit, so create, update and
//! delete all take a branch and a commit message.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::HeaderMap;
use serde_json::Value;
use tokio::io::AsyncWrite;

use crate::error::{ErrorKind, GitlabError, Result, ResultExt};
use crate::gitlab::query::Query;
use crate::gitlab::Gitlab;
use crate::resource::{into_attrs, Attrs, Manager, RequiredOptional, ResourceId, RestObject};

const CREATE_ATTRS: RequiredOptional = RequiredOptional::new(
    &["file_path", "branch", "content", "commit_message"],
    &["encoding", "author_email", "author_name", "execute_filemode", "start_branch"],
);

const UPDATE_ATTRS: RequiredOptional = RequiredOptional::new(
    &["file_path", "branch", "content", "commit_message"],
    &[
        "encoding",
        "author_email",
        "author_name",
        "execute_filemode",
        "last_commit_id",
        "start_branch",
    ],
);

/// Manager for `/projects/{project_id}/repository/files`
#[derive(Debug, Clone)]
pub struct ProjectFileManager {
    client: Gitlab,
    path: String,
}

impl Manager for ProjectFileManager {
    type Object = ProjectFile;

    fn client(&self) -> &Gitlab {
        &self.client
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn id_attr(&self) -> Option<&'static str> {
        Some("file_path")
    }

    fn wrap(&self, rest: RestObject) -> ProjectFile {
        ProjectFile {
            rest,
            manager: self.clone(),
        }
    }
}

fn ref_query(git_ref: Option<&str>) -> Query {
    git_ref
        .map(|r| vec![("ref".to_string(), r.to_string())])
        .unwrap_or_default()
}

impl ProjectFileManager {
    pub(crate) fn new(client: Gitlab, project_id: &ResourceId) -> Self {
        Self {
            client,
            path: format!("/projects/{project_id}/repository/files"),
        }
    }

    pub fn create_attrs(&self) -> RequiredOptional {
        CREATE_ATTRS
    }

    pub fn update_attrs(&self) -> RequiredOptional {
        UPDATE_ATTRS
    }

    fn file_path(&self, file_path: &str) -> String {
        self.object_path(&ResourceId::from(file_path))
    }

    /// Retrieve a file and its base64 content at `git_ref`
    pub async fn get(&self, file_path: &str, git_ref: &str) -> Result<ProjectFile> {
        let value = self
            .client
            .http()
            .get_json(&self.file_path(file_path), &ref_query(Some(git_ref)))
            .await
            .on_http_error(ErrorKind::Get)?;
        self.object_from(value)
    }

    /// File metadata without the content, as `X-Gitlab-*` response headers
    pub async fn head(&self, file_path: &str, git_ref: &str) -> Result<HeaderMap> {
        self.client
            .http()
            .head(&self.file_path(file_path), &ref_query(Some(git_ref)))
            .await
            .on_http_error(ErrorKind::Head)
    }

    /// Commit a new file. `file_path` moves from the payload into the URL.
    pub async fn create(&self, mut data: Attrs) -> Result<ProjectFile> {
        CREATE_ATTRS.validate(&data, &[])?;

        let file_path = match data.remove("file_path") {
            Some(Value::String(path)) => path,
            Some(other) => other.to_string(),
            None => return Err(GitlabError::MissingAttributes(vec!["file_path".into()])),
        };
        let body = Value::Object(data);
        let value = self
            .client
            .http()
            .post(&self.file_path(&file_path), &Query::new(), Some(&body))
            .await
            .on_http_error(ErrorKind::Create)?;

        let mut attrs = into_attrs(value)?;
        attrs.entry("file_path").or_insert(Value::String(file_path));
        Ok(self.wrap(RestObject::new(attrs, self.id_attr())))
    }

    /// Commit changes to an existing file, returning the server response
    pub async fn update(&self, file_path: &str, mut data: Attrs) -> Result<Attrs> {
        data.insert("file_path".into(), Value::String(file_path.to_string()));
        UPDATE_ATTRS.validate(&data, &[])?;

        let body = Value::Object(data);
        let value = self
            .client
            .http()
            .put(&self.file_path(file_path), &Query::new(), Some(&body))
            .await
            .on_http_error(ErrorKind::Update)?;
        into_attrs(value)
    }

    /// Commit the removal of a file
    pub async fn delete(&self, file_path: &str, branch: &str, commit_message: &str) -> Result<()> {
        let query = vec![
            ("branch".to_string(), branch.to_string()),
            ("commit_message".to_string(), commit_message.to_string()),
        ];
        self.client
            .http()
            .delete(&self.file_path(file_path), &query)
            .await
            .on_http_error(ErrorKind::Delete)?;
        Ok(())
    }

    /// Raw file content. Without `git_ref` the default branch is used.
    pub async fn raw(&self, file_path: &str, git_ref: Option<&str>) -> Result<Vec<u8>> {
        let path = format!("{}/raw", self.file_path(file_path));
        self.client
            .http()
            .get_bytes(&path, &ref_query(git_ref))
            .await
            .on_http_error(ErrorKind::Get)
    }

    /// Stream raw file content into `writer`
    pub async fn raw_to_writer<W>(
        &self,
        file_path: &str,
        git_ref: Option<&str>,
        writer: &mut W,
    ) -> Result<u64>
    where
        W: AsyncWrite + Unpin + Send + ?Sized,
    {
        let path = format!("{}/raw", self.file_path(file_path));
        self.client
            .http()
            .download(&path, &ref_query(git_ref), writer)
            .await
            .on_http_error(ErrorKind::Get)
    }

    /// Blame records (`commit` and `lines`) for a file
    pub async fn blame(&self, file_path: &str, git_ref: &str) -> Result<Vec<Attrs>> {
        let path = format!("{}/blame", self.file_path(file_path));
        let page = self
            .client
            .http()
            .list(&path, &ref_query(Some(git_ref)))
            .await
            .on_http_error(ErrorKind::List)?;
        page.items.into_iter().map(into_attrs).collect()
    }
}

/// A repository file at a given ref
#[derive(Debug, Clone)]
pub struct ProjectFile {
    rest: RestObject,
    manager: ProjectFileManager,
}

resource_object!(ProjectFile, ProjectFileManager);

impl ProjectFile {
    pub fn file_path(&self) -> Option<&str> {
        self.rest.get_str("file_path")
    }

    pub fn file_name(&self) -> Option<&str> {
        self.rest.get_str("file_name")
    }

    pub fn last_commit_id(&self) -> Option<&str> {
        self.rest.get_str("last_commit_id")
    }

    /// Content as returned by the server, decoded from base64
    pub fn decode(&self) -> Result<Vec<u8>> {
        let content = self.rest.get_str("content").unwrap_or_default();
        // The API wraps long base64 payloads
        let compact: String = content.split_whitespace().collect();
        Ok(STANDARD.decode(compact)?)
    }

    /// Replace the content with `bytes`, base64 encoded
    pub fn set_content(&mut self, bytes: &[u8]) {
        self.rest.set("content", STANDARD.encode(bytes));
        self.rest.set("encoding", "base64");
    }

    /// Commit local changes to `branch`
    pub async fn save(&mut self, branch: &str, commit_message: &str) -> Result<()> {
        self.rest.set("branch", branch);
        self.rest.set("commit_message", commit_message);

        let file_path = self.rest.require_id()?;
        let data = self.rest.updated_data(&UPDATE_ATTRS);
        let server = self.manager.update(file_path.raw(), data).await?;
        self.rest.apply(server);
        Ok(())
    }

    /// Commit the removal of this file to `branch`
    pub async fn delete(&self, branch: &str, commit_message: &str) -> Result<()> {
        let file_path = self.rest.require_id()?;
        self.manager.delete(file_path.raw(), branch, commit_message).await
    }
}
