mod commands;
mod config;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use commands::Command;
use config::Config;
use gitlab_objects::{Credentials, Gitlab};
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Command line access to GitLab files, jobs, milestones, registries and LDAP groups
#[derive(Parser, Debug)]
#[command(name = "gitlab-objects", version, about, long_about = None)]
struct Args {
    /// GitLab instance URL
    #[arg(long, global = true)]
    url: Option<String>,

    /// Personal, project or group access token
    #[arg(long, global = true, conflicts_with_all = ["oauth_token", "job_token"])]
    private_token: Option<String>,

    /// OAuth2 access token
    #[arg(long, global = true, conflicts_with = "job_token")]
    oauth_token: Option<String>,

    /// CI job token
    #[arg(long, global = true)]
    job_token: Option<String>,

    /// Default page size for list commands
    #[arg(long, global = true)]
    per_page: Option<u32>,

    /// Log level for debugging
    #[arg(long, global = true, value_enum, default_value = "off")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    fn credentials(&self) -> Credentials {
        if let Some(token) = &self.private_token {
            Credentials::PrivateToken(token.clone())
        } else if let Some(token) = &self.oauth_token {
            Credentials::OAuthToken(token.clone())
        } else if let Some(token) = &self.job_token {
            Credentials::JobToken(token.clone())
        } else {
            Credentials::None
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("gitlab-objects started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("gitlab-objects").join("gitlab-objects.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".gitlab-objects").join("gitlab-objects.log");
    }
    PathBuf::from("gitlab-objects.log")
}

fn build_client(args: &Args, config: &Config) -> Result<Gitlab> {
    let url = config.effective_url(args.url.as_deref());
    let credentials = config.effective_credentials(args.credentials());

    let mut builder = Gitlab::builder(&url)
        .credentials(credentials)
        .retry(config.retry());
    if let Some(per_page) = config.effective_per_page(args.per_page) {
        builder = builder.per_page(per_page);
    }
    if let Some(timeout) = config.timeout() {
        builder = builder.timeout(timeout);
    } else {
        builder = builder.timeout(Duration::from_secs(60));
    }

    let client = builder
        .build()
        .with_context(|| format!("Failed to create GitLab client for {url}"))?;
    tracing::info!("Using GitLab instance {}", client.url());
    Ok(client)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;

    if let Command::Config(cmd) = &args.command {
        return commands::run_config(cmd.clone());
    }

    let config = Config::load();
    let client = build_client(&args, &config)?;

    commands::run(args.command, &client).await
}
