//! Running the CLI

// Allow exits because in this file we ideally handle all errors with known exit codes
#![allow(clippy::exit)]

use crate::collector::config::Config;
use crate::collector::registry::{register_component, register_repository};
use crate::collector::schedule::run_scheduled;
use crate::collector::CollectorTask;
use crate::db::models::{commit, subversion_repo};
use crate::db::{self, DatabaseConnection};
use crate::scm::SvnClient;
use crate::utils::workspace::{self, find_workspace_path, log_dir};
use clap::Parser;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Collects Subversion commits into the dashboard datastore.
/// Run from the workspace directory or pass the path to the workspace.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the collector workspace. Defaults to cwd.
    #[arg(short, long, default_value_t = String::from("."))]
    workspace_path: String,
    /// Collector cli subcommands
    #[command(subcommand)]
    subcommands: Subcommands,
}

///
#[derive(Clone, clap::Subcommand)]
enum Subcommands {
    /// Create a workspace with a default config.toml
    Init,
    /// Commands run inside an existing workspace
    #[command(flatten)]
    Workspace(WorkspaceCommands),
}

///
#[derive(Clone, clap::Subcommand)]
enum WorkspaceCommands {
    /// Track a Subversion repository
    AddRepo {
        /// Url of the repository, e.g. https://svn.example.com/repos/app/trunk
        url: String,
    },
    /// Register a dashboard component using the given repositories
    Component {
        /// Name of the component
        name: String,
        /// Urls of the repositories the component uses
        #[arg(short, long = "repo")]
        repos: Vec<String>,
    },
    /// Run a single collection cycle
    Collect,
    /// Run collection cycles on the configured cron schedule
    Run,
    /// List tracked repositories with their latest collected revision
    Repos,
}

/// Set up stdout logging, plus a daily rolling log file when `log_dir` is given.
/// `RUST_LOG` overrides the default `info` level.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "svn-collector.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();
    guard
}

/// Main entrypoint to application
pub fn run() {
    let cli = Cli::parse();
    let workspace_path_wd = Path::new(&cli.workspace_path);

    let command = match cli.subcommands {
        Subcommands::Init => {
            init_tracing(None);
            if let Err(err) = workspace::init(workspace_path_wd) {
                tracing::error!("error: could not create workspace: {err}");
                std::process::exit(1);
            }
            return;
        }
        Subcommands::Workspace(command) => command,
    };

    let Ok(workspace_path) = find_workspace_path(workspace_path_wd) else {
        init_tracing(None);
        tracing::error!(
            "error: could not find `{}` folder in `{}` or any parent directory",
            workspace::WORKSPACE_DIR,
            &cli.workspace_path
        );
        std::process::exit(1);
    };
    let guard = init_tracing(Some(&log_dir(&workspace_path)));
    tracing::debug!("Starting application");

    if let Err(err) = async_std::task::block_on(execute(command, &workspace_path)) {
        tracing::error!("{:?}", err);
        drop(guard);
        std::process::exit(1);
    }
}

/// Run `command` against the workspace at `workspace_path`.
async fn execute(command: WorkspaceCommands, workspace_path: &Path) -> anyhow::Result<()> {
    let config = Config::load(workspace_path)?;
    let conn = match db::init::connect(workspace_path).await {
        Ok(conn) => conn,
        Err(err) => {
            tracing::error!(
                "error: could not connect to database. Confirm that DATABASE_URL env var is set correctly."
            );
            return Err(err);
        }
    };
    let task = CollectorTask::new(
        conn.clone(),
        SvnClient::new(&config.svn),
        config.commit_threshold_days,
    );

    match command {
        WorkspaceCommands::AddRepo { url } => {
            let collector = task.register().await?;
            let repo = register_repository(&conn, &collector, &url, true).await?;
            tracing::info!("Tracking {} as {}", repo.url, repo.id);
        }
        WorkspaceCommands::Component { name, repos } => {
            let collector = task.register().await?;
            let comp = register_component(&conn, &collector, &name, &repos).await?;
            tracing::info!("Component {} uses {} repositories", comp.name, repos.len());
        }
        WorkspaceCommands::Collect => {
            task.run().await?;
        }
        WorkspaceCommands::Run => run_scheduled(&task, &config.cron).await?,
        WorkspaceCommands::Repos => {
            let collector = task.register().await?;
            print_repositories(&conn, &collector.id).await?;
        }
    }
    Ok(())
}

/// Print one line per tracked repository: enabled flag, watermark, commit count and url.
async fn print_repositories(conn: &DatabaseConnection, collector_id: &str) -> anyhow::Result<()> {
    let repos =
        subversion_repo::Manager::find_by_collector_ids(conn, &[collector_id.to_owned()]).await?;
    println!("{:<8} {:>10} {:>8}  URL", "ENABLED", "REVISION", "COMMITS");
    for repo in repos {
        let commits = commit::Manager::count_by_collector_item(conn, &repo.id).await?;
        println!(
            "{:<8} {:>10} {:>8}  {}",
            if repo.enabled { "yes" } else { "no" },
            repo.latest_revision,
            commits,
            repo.url
        );
    }
    Ok(())
}
