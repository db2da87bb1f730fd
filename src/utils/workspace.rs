//! The workspace is the directory holding the collector's configuration, database and logs.

use crate::collector::config::Config;
use std::fs::{create_dir_all, write};
use std::path::{Path, PathBuf};

/// Name of the directory marking a workspace.
pub const WORKSPACE_DIR: &str = ".svn-collector";

/// given a &Path `path`, return the path to the containing workspace.
///
/// # Errors
/// Error if the path doesn't exist or isn't inside a workspace.
pub fn find_workspace_path(path: &Path) -> anyhow::Result<PathBuf> {
    let abs_path = path.canonicalize()?;
    for working_path in abs_path.ancestors() {
        if working_path.join(WORKSPACE_DIR).exists() {
            return Ok(working_path.to_owned());
        }
    }
    anyhow::bail!(format!(
        "{} is not inside a collector workspace. Run `svn-collector init` to create a workspace at this location.",
        abs_path.to_string_lossy()
    ))
}

/// Directory receiving the rolling log files of a workspace.
#[must_use]
pub fn log_dir(workspace_path: &Path) -> PathBuf {
    workspace_path.join(WORKSPACE_DIR).join("logs")
}

/// Create a new workspace at `path` with a default `config.toml`.
///
/// # Errors
/// Will error if the workspace would be created inside an existing one, or if the files
/// cannot be written.
pub fn init(path: &Path) -> anyhow::Result<PathBuf> {
    if find_workspace_path(path).is_ok() {
        anyhow::bail!("You cannot create a new workspace inside of an existing workspace.");
    }
    let workspace_dir = path.join(WORKSPACE_DIR);
    create_dir_all(&workspace_dir)?;
    let config_path = workspace_dir.join(Config::FILE_NAME);
    write(&config_path, Config::default().to_toml()?)?;
    tracing::info!("Created workspace at {}", path.display());
    Ok(path.to_path_buf())
}
