//! Command line actions
//!
//! Each subcommand maps onto one manager or object operation. JSON results are
//! pretty-printed to stdout; raw payloads (file content, artifacts, traces)
//! are streamed to stdout unchanged.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use gitlab_objects::prelude::*;
use serde_json::Value;

use crate::config::{env_overrides, Config};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Repository files
    #[command(subcommand)]
    File(FileCommand),
    /// CI jobs, artifacts and traces
    #[command(subcommand)]
    Job(JobCommand),
    /// Project and group milestones
    #[command(subcommand)]
    Milestone(MilestoneCommand),
    /// Container registry repositories and tags
    #[command(subcommand)]
    Registry(RegistryCommand),
    /// LDAP groups (administrators only)
    #[command(subcommand)]
    LdapGroup(LdapGroupCommand),
    /// Show or edit the configuration file
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Page to fetch
    #[arg(long)]
    page: Option<u32>,
    /// Fetch every page
    #[arg(long, conflicts_with = "page")]
    all: bool,
    /// Extra list filter, repeatable
    #[arg(long = "filter", value_name = "KEY=VALUE")]
    filters: Vec<String>,
}

impl ListArgs {
    /// Page plus `--filter` pairs, passed through as given
    fn options(&self) -> Result<ListOptions> {
        let mut opts = ListOptions::new();
        if let Some(page) = self.page {
            opts = opts.page(page);
        }
        for filter in &self.filters {
            let (key, value) = split_filter(filter)?;
            opts = opts.filter(key, value);
        }
        Ok(opts)
    }

    /// Like [`ListArgs::options`], restricted to the filters `manager` lists.
    /// Array filters take comma separated values.
    fn options_for<M: Manager>(&self, manager: &M) -> Result<ListOptions> {
        let mut opts = ListOptions::new();
        if let Some(page) = self.page {
            opts = opts.page(page);
        }
        for filter in &self.filters {
            let (key, value) = split_filter(filter)?;
            if !manager.list_filters().iter().any(|f| *f == key) {
                anyhow::bail!(
                    "Unknown filter '{key}' for {} (supported: {})",
                    manager.path(),
                    manager.list_filters().join(", ")
                );
            }
            opts = if manager.array_attrs().iter().any(|a| *a == key) {
                opts.filter(key, value.split(',').collect::<Vec<_>>())
            } else {
                opts.filter(key, value)
            };
        }
        Ok(opts)
    }
}

fn split_filter(filter: &str) -> Result<(&str, &str)> {
    filter
        .split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .with_context(|| format!("Filter '{filter}' must look like KEY=VALUE"))
}

// =============================================================================
// Files
// =============================================================================

#[derive(Args, Debug)]
pub struct FileTarget {
    /// Project id or full path
    #[arg(long)]
    project: String,
    /// Path of the file inside the repository
    #[arg(long)]
    path: String,
}

#[derive(Args, Debug)]
pub struct FileCommit {
    #[arg(long)]
    branch: String,
    #[arg(long)]
    commit_message: String,
    /// New content; read from stdin when omitted
    #[arg(long)]
    content: Option<String>,
    /// Send the content base64 encoded
    #[arg(long)]
    base64: bool,
    #[arg(long)]
    author_email: Option<String>,
    #[arg(long)]
    author_name: Option<String>,
    #[arg(long)]
    start_branch: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum FileCommand {
    /// Show a file and its metadata
    Get {
        #[command(flatten)]
        target: FileTarget,
        #[arg(long = "ref")]
        git_ref: String,
    },
    /// Show file metadata headers
    Head {
        #[command(flatten)]
        target: FileTarget,
        #[arg(long = "ref")]
        git_ref: String,
    },
    /// Write raw file content to stdout
    Raw {
        #[command(flatten)]
        target: FileTarget,
        #[arg(long = "ref")]
        git_ref: Option<String>,
    },
    /// Show blame records
    Blame {
        #[command(flatten)]
        target: FileTarget,
        #[arg(long = "ref")]
        git_ref: String,
    },
    /// Commit a new file
    Create {
        #[command(flatten)]
        target: FileTarget,
        #[command(flatten)]
        commit: FileCommit,
    },
    /// Commit changes to an existing file
    Update {
        #[command(flatten)]
        target: FileTarget,
        #[command(flatten)]
        commit: FileCommit,
        #[arg(long)]
        last_commit_id: Option<String>,
    },
    /// Commit the removal of a file
    Delete {
        #[command(flatten)]
        target: FileTarget,
        #[arg(long)]
        branch: String,
        #[arg(long)]
        commit_message: String,
    },
}

// =============================================================================
// Jobs
// =============================================================================

#[derive(Args, Debug)]
pub struct JobTarget {
    /// Project id or full path
    #[arg(long)]
    project: String,
    /// Job id
    #[arg(long)]
    id: u64,
}

#[derive(Subcommand, Debug)]
pub enum JobCommand {
    /// List jobs
    List {
        #[arg(long)]
        project: String,
        /// Job status to include; repeatable
        #[arg(long)]
        scope: Vec<String>,
        #[command(flatten)]
        list: ListArgs,
    },
    Get {
        #[command(flatten)]
        target: JobTarget,
    },
    Cancel {
        #[command(flatten)]
        target: JobTarget,
    },
    Retry {
        #[command(flatten)]
        target: JobTarget,
    },
    /// Trigger a manual job
    Play {
        #[command(flatten)]
        target: JobTarget,
    },
    /// Remove artifacts and trace
    Erase {
        #[command(flatten)]
        target: JobTarget,
    },
    KeepArtifacts {
        #[command(flatten)]
        target: JobTarget,
    },
    DeleteArtifacts {
        #[command(flatten)]
        target: JobTarget,
    },
    /// Write the artifacts archive, or one file of it, to stdout
    Artifacts {
        #[command(flatten)]
        target: JobTarget,
        /// Single file inside the archive
        #[arg(long)]
        path: Option<String>,
    },
    /// Write the job log to stdout
    Trace {
        #[command(flatten)]
        target: JobTarget,
    },
}

// =============================================================================
// Milestones
// =============================================================================

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct Parent {
    /// Project id or full path
    #[arg(long)]
    project: Option<String>,
    /// Group id or full path
    #[arg(long)]
    group: Option<String>,
}

#[derive(Args, Debug)]
pub struct MilestoneFields {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    due_date: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    start_date: Option<String>,
    /// `close` or `activate`
    #[arg(long)]
    state_event: Option<String>,
}

impl MilestoneFields {
    fn to_attrs(&self) -> Attrs {
        attrs([
            ("title", self.title.clone()),
            ("description", self.description.clone()),
            ("due_date", self.due_date.clone()),
            ("start_date", self.start_date.clone()),
            ("state_event", self.state_event.clone()),
        ])
    }
}

#[derive(Subcommand, Debug)]
pub enum MilestoneCommand {
    List {
        #[command(flatten)]
        parent: Parent,
        /// `active` or `closed`
        #[arg(long)]
        state: Option<String>,
        #[arg(long)]
        search: Option<String>,
        /// Internal ids to include; repeatable
        #[arg(long)]
        iids: Vec<u64>,
        #[command(flatten)]
        list: ListArgs,
    },
    Get {
        #[command(flatten)]
        parent: Parent,
        #[arg(long)]
        id: u64,
    },
    Create {
        #[command(flatten)]
        parent: Parent,
        #[command(flatten)]
        fields: MilestoneFields,
    },
    Update {
        #[command(flatten)]
        parent: Parent,
        #[arg(long)]
        id: u64,
        #[command(flatten)]
        fields: MilestoneFields,
    },
    Delete {
        #[command(flatten)]
        parent: Parent,
        #[arg(long)]
        id: u64,
    },
    /// Issues assigned to a milestone
    Issues {
        #[command(flatten)]
        parent: Parent,
        #[arg(long)]
        id: u64,
        #[command(flatten)]
        list: ListArgs,
    },
    /// Merge requests assigned to a milestone
    MergeRequests {
        #[command(flatten)]
        parent: Parent,
        #[arg(long)]
        id: u64,
        #[command(flatten)]
        list: ListArgs,
    },
    /// Promote a project milestone to its group
    Promote {
        #[arg(long)]
        project: String,
        #[arg(long)]
        id: u64,
    },
}

// =============================================================================
// Container registry
// =============================================================================

#[derive(Args, Debug)]
pub struct TagTarget {
    #[arg(long)]
    project: String,
    /// Registry repository id
    #[arg(long)]
    repository: u64,
}

#[derive(Subcommand, Debug)]
pub enum RegistryCommand {
    /// List registry repositories of a project or group
    List {
        #[command(flatten)]
        parent: Parent,
        /// Include tags in the response
        #[arg(long)]
        tags: bool,
        #[command(flatten)]
        list: ListArgs,
    },
    /// Show a repository by its global id
    Get {
        #[arg(long)]
        id: u64,
        #[arg(long)]
        tags_count: bool,
    },
    /// Delete a project repository
    Delete {
        #[arg(long)]
        project: String,
        #[arg(long)]
        id: u64,
    },
    /// List tags of a repository
    Tags {
        #[command(flatten)]
        target: TagTarget,
        #[command(flatten)]
        list: ListArgs,
    },
    TagGet {
        #[command(flatten)]
        target: TagTarget,
        #[arg(long)]
        name: String,
    },
    TagDelete {
        #[command(flatten)]
        target: TagTarget,
        #[arg(long)]
        name: String,
    },
    /// Delete tags in bulk
    TagsDeleteBulk {
        #[command(flatten)]
        target: TagTarget,
        #[arg(long)]
        name_regex_delete: String,
        #[arg(long)]
        keep_n: Option<u32>,
        #[arg(long)]
        name_regex_keep: Option<String>,
        /// e.g. `1h`, `7d`, `1month`
        #[arg(long)]
        older_than: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum LdapGroupCommand {
    List {
        #[arg(long)]
        search: Option<String>,
        /// Restrict to one LDAP provider
        #[arg(long)]
        provider: Option<String>,
        #[command(flatten)]
        list: ListArgs,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Print the effective configuration file, tokens masked
    Show,
    /// Set a key in the configuration file
    Set { key: String, value: String },
    /// Print the configuration file location
    Path,
}

// =============================================================================
// Dispatch
// =============================================================================

pub async fn run(command: Command, gl: &Gitlab) -> Result<()> {
    match command {
        Command::File(cmd) => run_file(cmd, gl).await,
        Command::Job(cmd) => run_job(cmd, gl).await,
        Command::Milestone(cmd) => run_milestone(cmd, gl).await,
        Command::Registry(cmd) => run_registry(cmd, gl).await,
        Command::LdapGroup(cmd) => run_ldap(cmd, gl).await,
        Command::Config(cmd) => run_config(cmd),
    }
}

async fn run_file(cmd: FileCommand, gl: &Gitlab) -> Result<()> {
    match cmd {
        FileCommand::Get { target, git_ref } => {
            let file = gl.project(target.project).files().get(&target.path, &git_ref).await?;
            print_object(&file)
        }
        FileCommand::Head { target, git_ref } => {
            let headers = gl.project(target.project).files().head(&target.path, &git_ref).await?;
            let map: Attrs = headers
                .iter()
                .filter_map(|(name, value)| {
                    value.to_str().ok().map(|v| (name.to_string(), Value::from(v)))
                })
                .collect();
            print_json(&Value::Object(map))
        }
        FileCommand::Raw { target, git_ref } => {
            let mut stdout = tokio::io::stdout();
            gl.project(target.project)
                .files()
                .raw_to_writer(&target.path, git_ref.as_deref(), &mut stdout)
                .await?;
            Ok(())
        }
        FileCommand::Blame { target, git_ref } => {
            let records = gl.project(target.project).files().blame(&target.path, &git_ref).await?;
            print_json(&Value::Array(records.into_iter().map(Value::Object).collect()))
        }
        FileCommand::Create { target, commit } => {
            let mut data = commit_attrs(&commit).await?;
            data.insert("file_path".into(), Value::from(target.path));
            let file = gl.project(target.project).files().create(data).await?;
            print_object(&file)
        }
        FileCommand::Update {
            target,
            commit,
            last_commit_id,
        } => {
            let mut data = commit_attrs(&commit).await?;
            if let Some(id) = last_commit_id {
                data.insert("last_commit_id".into(), Value::from(id));
            }
            let result = gl.project(target.project).files().update(&target.path, data).await?;
            print_json(&Value::Object(result))
        }
        FileCommand::Delete {
            target,
            branch,
            commit_message,
        } => {
            gl.project(target.project)
                .files()
                .delete(&target.path, &branch, &commit_message)
                .await?;
            eprintln!("Deleted {}", target.path);
            Ok(())
        }
    }
}

/// Commit attributes for a file create or update
async fn commit_attrs(commit: &FileCommit) -> Result<Attrs> {
    use base64::Engine as _;

    let content = match &commit.content {
        Some(content) => content.clone().into_bytes(),
        None => {
            use tokio::io::AsyncReadExt;
            let mut buf = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut buf)
                .await
                .context("Failed to read content from stdin")?;
            buf
        }
    };

    let (content, encoding) = if commit.base64 {
        (base64::engine::general_purpose::STANDARD.encode(content), Some("base64".to_string()))
    } else {
        (String::from_utf8(content).context("Content is not UTF-8; use --base64")?, None)
    };

    Ok(attrs([
        ("branch", Some(commit.branch.clone())),
        ("commit_message", Some(commit.commit_message.clone())),
        ("content", Some(content)),
        ("encoding", encoding),
        ("author_email", commit.author_email.clone()),
        ("author_name", commit.author_name.clone()),
        ("start_branch", commit.start_branch.clone()),
    ]))
}

async fn run_job(cmd: JobCommand, gl: &Gitlab) -> Result<()> {
    match cmd {
        JobCommand::List {
            project,
            scope,
            list,
        } => {
            let jobs = gl.project(project).jobs();
            let mut opts = list.options_for(&jobs)?;
            if !scope.is_empty() {
                opts = opts.filter("scope", scope);
            }
            print_list(&jobs, &opts, list.all).await
        }
        JobCommand::Get { target } => {
            let job = gl.project(target.project).jobs().get(target.id).await?;
            print_object(&job)
        }
        JobCommand::Cancel { target } => {
            let result = lazy_job(gl, &target).cancel().await?;
            print_json(&Value::Object(result))
        }
        JobCommand::Retry { target } => {
            let result = lazy_job(gl, &target).retry().await?;
            print_json(&Value::Object(result))
        }
        JobCommand::Play { target } => {
            let mut job = lazy_job(gl, &target);
            job.play().await?;
            print_object(&job)
        }
        JobCommand::Erase { target } => {
            lazy_job(gl, &target).erase().await?;
            eprintln!("Erased job {}", target.id);
            Ok(())
        }
        JobCommand::KeepArtifacts { target } => {
            lazy_job(gl, &target).keep_artifacts().await?;
            eprintln!("Kept artifacts of job {}", target.id);
            Ok(())
        }
        JobCommand::DeleteArtifacts { target } => {
            lazy_job(gl, &target).delete_artifacts().await?;
            eprintln!("Deleted artifacts of job {}", target.id);
            Ok(())
        }
        JobCommand::Artifacts { target, path } => {
            let job = lazy_job(gl, &target);
            let mut stdout = tokio::io::stdout();
            match path {
                Some(path) => job.artifact_to_writer(&path, &mut stdout).await?,
                None => job.artifacts_to_writer(&mut stdout).await?,
            };
            Ok(())
        }
        JobCommand::Trace { target } => {
            let mut stdout = tokio::io::stdout();
            lazy_job(gl, &target).trace_to_writer(&mut stdout).await?;
            Ok(())
        }
    }
}

fn lazy_job(gl: &Gitlab, target: &JobTarget) -> ProjectJob {
    gl.project(target.project.as_str()).jobs().lazy(target.id)
}

async fn run_milestone(cmd: MilestoneCommand, gl: &Gitlab) -> Result<()> {
    match cmd {
        MilestoneCommand::List {
            parent,
            state,
            search,
            iids,
            list,
        } => {
            let with_flags = |mut opts: ListOptions| {
                if let Some(state) = &state {
                    opts = opts.filter("state", state.as_str());
                }
                if let Some(search) = &search {
                    opts = opts.filter("search", search.as_str());
                }
                if !iids.is_empty() {
                    opts = opts.filter("iids", iids.clone());
                }
                opts
            };
            match scope(gl, parent) {
                Scope::Project(p) => {
                    let milestones = p.milestones();
                    let opts = with_flags(list.options_for(&milestones)?);
                    print_list(&milestones, &opts, list.all).await
                }
                Scope::Group(g) => {
                    let milestones = g.milestones();
                    let opts = with_flags(list.options_for(&milestones)?);
                    print_list(&milestones, &opts, list.all).await
                }
            }
        }
        MilestoneCommand::Get { parent, id } => match scope(gl, parent) {
            Scope::Project(p) => print_object(&p.milestones().get(id).await?),
            Scope::Group(g) => print_object(&g.milestones().get(id).await?),
        },
        MilestoneCommand::Create { parent, fields } => {
            let data = fields.to_attrs();
            match scope(gl, parent) {
                Scope::Project(p) => print_object(&p.milestones().create(data).await?),
                Scope::Group(g) => print_object(&g.milestones().create(data).await?),
            }
        }
        MilestoneCommand::Update { parent, id, fields } => {
            let data = fields.to_attrs();
            let result = match scope(gl, parent) {
                Scope::Project(p) => p.milestones().update(Some(id.into()), data).await?,
                Scope::Group(g) => g.milestones().update(Some(id.into()), data).await?,
            };
            print_json(&Value::Object(result))
        }
        MilestoneCommand::Delete { parent, id } => {
            match scope(gl, parent) {
                Scope::Project(p) => p.milestones().delete(id).await?,
                Scope::Group(g) => g.milestones().delete(id).await?,
            }
            eprintln!("Deleted milestone {id}");
            Ok(())
        }
        MilestoneCommand::Issues { parent, id, list } => {
            let page = match scope(gl, parent) {
                Scope::Project(p) => p.milestones().lazy(id).issues(&list.options()?).await?,
                Scope::Group(g) => g.milestones().lazy(id).issues(&list.options()?).await?,
            };
            print_json(&Value::Array(page.items.iter().map(RestObject::to_value).collect()))
        }
        MilestoneCommand::MergeRequests { parent, id, list } => {
            let page = match scope(gl, parent) {
                Scope::Project(p) => {
                    p.milestones().lazy(id).merge_requests(&list.options()?).await?
                }
                Scope::Group(g) => g.milestones().lazy(id).merge_requests(&list.options()?).await?,
            };
            print_json(&Value::Array(page.items.iter().map(RestObject::to_value).collect()))
        }
        MilestoneCommand::Promote { project, id } => {
            let mut milestone = gl.project(project).milestones().lazy(id);
            milestone.promote().await?;
            print_object(&milestone)
        }
    }
}

enum Scope {
    Project(Project),
    Group(Group),
}

fn scope(gl: &Gitlab, parent: Parent) -> Scope {
    match (parent.project, parent.group) {
        (Some(project), _) => Scope::Project(gl.project(project)),
        // clap guarantees exactly one of the two
        (None, group) => Scope::Group(gl.group(group.unwrap_or_default())),
    }
}

async fn run_registry(cmd: RegistryCommand, gl: &Gitlab) -> Result<()> {
    match cmd {
        RegistryCommand::List { parent, tags, list } => {
            let with_flags = |opts: ListOptions| if tags { opts.filter("tags", true) } else { opts };
            match scope(gl, parent) {
                Scope::Project(p) => {
                    let repos = p.registry_repositories();
                    let opts = with_flags(list.options_for(&repos)?);
                    print_list(&repos, &opts, list.all).await
                }
                Scope::Group(g) => {
                    let repos = g.registry_repositories();
                    let opts = with_flags(list.options_for(&repos)?);
                    print_list(&repos, &opts, list.all).await
                }
            }
        }
        RegistryCommand::Get { id, tags_count } => {
            let mut params = Attrs::new();
            if tags_count {
                params.insert("tags_count".into(), Value::Bool(true));
            }
            let repo = gl.registry_repositories().get_with(id, &params).await?;
            print_object(&repo)
        }
        RegistryCommand::Delete { project, id } => {
            gl.project(project).registry_repositories().delete(id).await?;
            eprintln!("Deleted registry repository {id}");
            Ok(())
        }
        RegistryCommand::Tags { target, list } => {
            let manager = tags(gl, &target);
            print_list(&manager, &list.options_for(&manager)?, list.all).await
        }
        RegistryCommand::TagGet { target, name } => {
            let tag = tags(gl, &target).get(name.as_str()).await?;
            print_object(&tag)
        }
        RegistryCommand::TagDelete { target, name } => {
            tags(gl, &target).delete(name.as_str()).await?;
            eprintln!("Deleted tag {name}");
            Ok(())
        }
        RegistryCommand::TagsDeleteBulk {
            target,
            name_regex_delete,
            keep_n,
            name_regex_keep,
            older_than,
        } => {
            tags(gl, &target)
                .delete_in_bulk(
                    &name_regex_delete,
                    keep_n,
                    name_regex_keep.as_deref(),
                    older_than.as_deref(),
                )
                .await?;
            eprintln!("Bulk deletion scheduled");
            Ok(())
        }
    }
}

/// Tag manager for a repository, without fetching the repository first
fn tags(gl: &Gitlab, target: &TagTarget) -> ProjectRegistryTagManager {
    gl.project(target.project.as_str())
        .registry_repositories()
        .tags(target.repository)
}

/// Configuration commands need no client
pub fn run_config(cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            let config = Config::load();
            print_json(&config.redacted())?;
            let overrides = env_overrides();
            if !overrides.is_empty() {
                eprintln!("Overridden by environment: {}", overrides.join(", "));
            }
            Ok(())
        }
        ConfigCommand::Set { key, value } => {
            let mut config = Config::load();
            config.set(&key, &value)?;
            config.save()?;
            eprintln!("Saved {key}");
            Ok(())
        }
        ConfigCommand::Path => {
            let path = Config::config_path().context("No configuration directory on this system")?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

async fn run_ldap(cmd: LdapGroupCommand, gl: &Gitlab) -> Result<()> {
    match cmd {
        LdapGroupCommand::List {
            search,
            provider,
            list,
        } => {
            let groups = gl.ldap_groups();
            let mut opts = list.options_for(&groups)?;
            if let Some(search) = search {
                opts = opts.filter("search", search);
            }
            if let Some(provider) = provider {
                opts = opts.filter("provider", provider);
            }
            print_list(&groups, &opts, list.all).await
        }
    }
}

// =============================================================================
// Output
// =============================================================================

fn attrs<const N: usize>(pairs: [(&str, Option<String>); N]) -> Attrs {
    pairs
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key.to_string(), Value::from(v))))
        .collect()
}

async fn print_list<M>(manager: &M, opts: &ListOptions, all: bool) -> Result<()>
where
    M: List,
    M::Object: ResourceObject,
{
    let objects = if all {
        manager.list_all(opts).await?
    } else {
        manager.list(opts).await?.items
    };
    print_json(&Value::Array(objects.iter().map(|o| o.rest().to_value()).collect()))
}

fn print_object<O: ResourceObject>(object: &O) -> Result<()> {
    print_json(&object.rest().to_value())
}

fn print_json(value: &Value) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    println!("{text}");
    Ok(())
}
